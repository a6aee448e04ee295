//! Destination decomposition (§4.3.4) and the RWS dest-splitting policy
//! (§4.3.5).

use loomc_ir::{ConDest, Dest, ProjDest, Projection};
use loomc_util::{FxHashMap, Name};

/// Maps a decl's binder to the `ProjDest` it should be lowered against,
/// populated whenever a block's trailing result routes the outer
/// destination down onto one of its own decls (a variable, or a
/// projection of one).
pub type DestAssignment = FxHashMap<Name, ProjDest>;

/// `unpackRWSDest`: decide how a `RunWriter`/`RunState`'s accumulator dest
/// decomposes against the pair-shaped outer destination. `None` means "fall
/// back to the non-decomposed path" (the final catch-all policy arm);
/// `Some((answer, state))` gives each component's destination, with `None`
/// inside the pair meaning "allocate fresh" rather than "unreachable".
pub fn unpack_rws_dest(proj_dest: &ProjDest) -> Option<(Option<Dest>, Option<Dest>)> {
    match proj_dest {
        ProjDest::FullDest(Dest::Con(ConDest::ProdCon(fields))) if fields.len() == 2 => {
            Some((Some(fields[0].clone()), Some(fields[1].clone())))
        }
        ProjDest::ProjDest(projs, d) if projs.as_slice() == [Projection::TupleField(0)] => {
            Some((Some(project_tuple_field(d, 0)), None))
        }
        ProjDest::ProjDest(projs, d) if projs.as_slice() == [Projection::TupleField(1)] => {
            Some((None, Some(project_tuple_field(d, 1))))
        }
        _ => None,
    }
}

fn project_tuple_field(dest: &Dest, index: usize) -> Dest {
    match dest {
        Dest::Con(ConDest::ProdCon(fields)) => fields[index].clone(),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomc_ir::Atom;
    use loomc_util::{NameColor, ScopeStack, Symbol};

    fn fresh(stack: &mut ScopeStack) -> Name {
        stack.push(NameColor::Dest, Symbol::intern("p"))
    }

    /// S5: a `[proj 0]` routing yields an answer-only split.
    #[test]
    fn proj_zero_yields_answer_only_split() {
        let mut stack = ScopeStack::new();
        let p = fresh(&mut stack);
        let outer = Dest::Con(ConDest::ProdCon(vec![
            Dest::BaseTypeRef { ptr: p, offset: Atom::unit() },
            Dest::BaseTypeRef { ptr: fresh(&mut stack), offset: Atom::unit() },
        ]));
        let proj = ProjDest::ProjDest(vec![Projection::TupleField(0)], outer);
        let (answer, state) = unpack_rws_dest(&proj).expect("should decompose");
        assert!(answer.is_some());
        assert!(state.is_none());
    }

    #[test]
    fn full_dest_of_a_pair_splits_into_two_full_dests() {
        let mut stack = ScopeStack::new();
        let outer = Dest::Con(ConDest::ProdCon(vec![
            Dest::BaseTypeRef { ptr: fresh(&mut stack), offset: Atom::unit() },
            Dest::BaseTypeRef { ptr: fresh(&mut stack), offset: Atom::unit() },
        ]));
        let (answer, state) = unpack_rws_dest(&ProjDest::FullDest(outer)).expect("should decompose");
        assert!(answer.is_some() && state.is_some());
    }

    #[test]
    fn an_unrelated_projection_falls_back_to_non_decomposed() {
        let mut stack = ScopeStack::new();
        let outer = Dest::BaseTypeRef { ptr: fresh(&mut stack), offset: Atom::unit() };
        let proj = ProjDest::ProjDest(vec![Projection::SumTag], outer);
        assert!(unpack_rws_dest(&proj).is_none());
    }
}
