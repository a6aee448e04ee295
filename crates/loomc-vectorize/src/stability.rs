//! The stability lattice (§4.4.1): `Uniform ⊑ Contiguous ⊑ Varying`, tracking
//! lane-uniformity of each SSA-like binding while a loop body is considered
//! for vectorization.

use loomc_ir::Atom;
use loomc_util::{FxHashMap, Name};

#[derive(Clone, Debug, PartialEq)]
pub enum Stability {
    Uniform,
    Contiguous,
    Varying,
    /// A product whose components have independent stabilities — a
    /// table-dest reference is `Prod([Uniform, Contiguous])` (pointer ×
    /// index), per §4.4.1.
    Prod(Vec<Stability>),
}

impl Stability {
    fn rank(&self) -> u8 {
        match self {
            Stability::Uniform => 0,
            Stability::Contiguous => 1,
            _ => 2,
        }
    }

    /// Lattice join (least upper bound). Two products of equal arity join
    /// componentwise; any other combination involving a product widens to
    /// `Varying` rather than guessing a shape.
    pub fn join(&self, other: &Stability) -> Stability {
        match (self, other) {
            (Stability::Prod(a), Stability::Prod(b)) if a.len() == b.len() => {
                Stability::Prod(a.iter().zip(b).map(|(x, y)| x.join(y)).collect())
            }
            (Stability::Prod(_), _) | (_, Stability::Prod(_)) => Stability::Varying,
            (a, b) => match a.rank().max(b.rank()) {
                0 => Stability::Uniform,
                1 => Stability::Contiguous,
                _ => Stability::Varying,
            },
        }
    }

    pub fn is_uniform(&self) -> bool {
        matches!(self, Stability::Uniform)
    }

    pub fn is_contiguous(&self) -> bool {
        matches!(self, Stability::Contiguous)
    }
}

/// Maps each decl binder (and the loop's own index/carry binders) to its
/// inferred stability. A name this pass has not classified is, by
/// construction, bound *outside* the loop body — the same value every
/// iteration — so [`lookup`] defaults it to `Uniform` rather than `Varying`.
pub type StabilityEnv = FxHashMap<Name, Stability>;

pub fn lookup(env: &StabilityEnv, atom: &Atom) -> Stability {
    match atom {
        Atom::Var(n) => env.get(n).cloned().unwrap_or(Stability::Uniform),
        Atom::Con(_) => Stability::Uniform,
        _ => Stability::Varying,
    }
}

/// §4.4.2's `UnOp`/`BinOp` rule: if any operand is non-uniform, every
/// uniform operand broadcasts and the result is `Varying`. Unlike
/// `Stability::join`, a `Contiguous` operand does *not* stay `Contiguous`
/// through generic arithmetic — only `IndexRef`/pointer-offset patterns
/// preserve contiguity (§4.1's `computeOffset` already resolves those before
/// vectorization ever sees them).
pub fn arith_result(operands: &[Stability]) -> Stability {
    if operands.iter().all(Stability::is_uniform) {
        Stability::Uniform
    } else {
        Stability::Varying
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_the_max_along_the_three_point_chain() {
        assert_eq!(Stability::Uniform.join(&Stability::Uniform), Stability::Uniform);
        assert_eq!(Stability::Uniform.join(&Stability::Contiguous), Stability::Contiguous);
        assert_eq!(Stability::Contiguous.join(&Stability::Varying), Stability::Varying);
    }

    #[test]
    fn arith_result_broadcasts_to_varying_unless_every_operand_is_uniform() {
        assert_eq!(arith_result(&[Stability::Uniform, Stability::Uniform]), Stability::Uniform);
        assert_eq!(arith_result(&[Stability::Uniform, Stability::Contiguous]), Stability::Varying);
    }

    #[test]
    fn unknown_names_default_to_uniform() {
        let env = StabilityEnv::default();
        let mut stack = loomc_util::ScopeStack::new();
        let n = stack.push(loomc_util::NameColor::Atom, loomc_util::Symbol::intern("x"));
        assert_eq!(lookup(&env, &Atom::Var(n)), Stability::Uniform);
    }
}
