//! `emitSwitch` (§4.5): lowers an `n`-way `Case` into a linear chain of
//! `ICond`s. The Imp IR only ever emits binary conditionals; a genuine
//! jump-table `switch` is a codegen-time optimization over this chain, not
//! something this crate produces.

use loomc_ir::Atom;

use crate::imp::{ImpBlock, ImpDecl, ImpInstr};

/// One arm: a guard atom (true when this arm's tag matches) plus its
/// already-translated body.
pub struct SwitchArm {
    pub guard: Atom,
    pub body: ImpBlock,
}

/// Folds `arms` right-to-left into nested `ICond`s, with `default` (the
/// last, unguarded arm — every other tag has already been excluded) as the
/// innermost else branch. Linear in the number of arms, as specified.
pub fn emit_switch(arms: Vec<SwitchArm>, default: ImpBlock) -> ImpBlock {
    let mut current = default;
    for arm in arms.into_iter().rev() {
        let instr = ImpInstr::ICond { cond: arm.guard, then_branch: Box::new(arm.body), else_branch: Box::new(current) };
        current = ImpBlock { decls: vec![ImpDecl { binders: vec![], instr }], results: vec![] };
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomc_ir::Lit;

    #[test]
    fn zero_arms_returns_the_default_unchanged() {
        let default = ImpBlock { decls: vec![], results: vec![Atom::Con(Lit::Int(0))] };
        let out = emit_switch(vec![], default.clone());
        assert_eq!(out, default);
    }

    #[test]
    fn folds_into_one_nested_icond_per_arm() {
        let arm = SwitchArm { guard: Atom::Con(Lit::Bool(true)), body: ImpBlock::empty() };
        let default = ImpBlock::empty();
        let out = emit_switch(vec![arm], default);
        assert_eq!(out.decls.len(), 1);
        assert!(matches!(out.decls[0].instr, ImpInstr::ICond { .. }));
    }
}
