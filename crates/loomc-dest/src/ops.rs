//! The three destination operations named alongside `makeDest` in §4.2:
//! `indexDest` (instantiate a `TabRef`'s body at a concrete index),
//! `loadDest` (read a destination back as a value), `copyAtom` (write a
//! value into a destination).

use loomc_ir::{Atom, ConDest, Dest, Op, Projection};
use loomc_util::Name;

use crate::error::{DestError, DestSynthResult};

fn substitute_atom(atom: &Atom, name: Name, replacement: &Atom) -> Atom {
    match atom {
        Atom::Var(n) if *n == name => replacement.clone(),
        Atom::DepPair { left, right, pair_ty } => Atom::DepPair {
            left: Box::new(substitute_atom(left, name, replacement)),
            right: Box::new(substitute_atom(right, name, replacement)),
            pair_ty: pair_ty.clone(),
        },
        Atom::DataTypeApp(id, args) => {
            Atom::DataTypeApp(*id, args.iter().map(|a| substitute_atom(a, name, replacement)).collect())
        }
        Atom::DictCon(sym, args) => {
            Atom::DictCon(*sym, args.iter().map(|a| substitute_atom(a, name, replacement)).collect())
        }
        Atom::Project(projs, n) if *n == name => {
            match replacement {
                Atom::Var(rn) => Atom::Project(projs.clone(), *rn),
                other => other.clone(),
            }
        }
        Atom::ACase { scrutinee, alts, result_ty } => Atom::ACase {
            scrutinee: Box::new(substitute_atom(scrutinee, name, replacement)),
            alts: alts.clone(),
            result_ty: result_ty.clone(),
        },
        Atom::DepPairRef(inner) => Atom::DepPairRef(Box::new(substitute_atom(inner, name, replacement))),
        other => other.clone(),
    }
}

/// Substitutes `name` for `replacement` throughout a destination tree —
/// used by `index_dest` to instantiate a `TabRef`'s body at one concrete
/// index, and by `loomc-lower` wherever a destination crosses a binder it
/// must be specialized against.
pub fn substitute_dest(dest: &Dest, name: Name, replacement: &Atom) -> Dest {
    match dest {
        Dest::BaseTypeRef { ptr, offset } => {
            Dest::BaseTypeRef { ptr: *ptr, offset: substitute_atom(offset, name, replacement) }
        }
        Dest::TabRef { binder, ix_ty, body } => Dest::TabRef {
            binder: *binder,
            ix_ty: ix_ty.clone(),
            body: Box::new(substitute_dest(body, name, replacement)),
        },
        Dest::Con(ConDest::ProdCon(ds)) => {
            Dest::Con(ConDest::ProdCon(ds.iter().map(|d| substitute_dest(d, name, replacement)).collect()))
        }
        Dest::Con(ConDest::SumAsProd(sum)) => Dest::Con(ConDest::SumAsProd(Box::new(loomc_ir::SumDest {
            tag_ptr: sum.tag_ptr,
            cases: sum.cases.iter().map(|d| substitute_dest(d, name, replacement)).collect(),
        }))),
        Dest::Con(ConDest::Newtype(id, inner)) => {
            Dest::Con(ConDest::Newtype(*id, Box::new(substitute_dest(inner, name, replacement))))
        }
        Dest::DepPair { left, right_binder, right, pair_ty } => Dest::DepPair {
            left: Box::new(substitute_dest(left, name, replacement)),
            right_binder: *right_binder,
            right: Box::new(substitute_dest(right, name, replacement)),
            pair_ty: pair_ty.clone(),
        },
        Dest::Boxed(abs) => Dest::Boxed(Box::new(loomc_ir::AbsPtrs {
            pointers: abs.pointers.clone(),
            inner: Box::new(substitute_dest(&abs.inner, name, replacement)),
        })),
    }
}

/// `indexDest`: specialize a `TabRef` destination's body at one concrete
/// index atom. `Err(DestError::NotATable)` on a non-`TabRef` dest — callers
/// only index a destination whose type is a table.
pub fn index_dest(dest: &Dest, index: &Atom) -> DestSynthResult<Dest> {
    match dest {
        Dest::TabRef { binder, body, .. } => Ok(substitute_dest(body, *binder, index)),
        other => Err(DestError::NotATable { found: format!("{other:?}") }),
    }
}

/// `loadDest`: read a destination's current contents back as a value.
pub fn load_dest(dest: Dest) -> Op {
    Op::Load(Box::new(dest))
}

/// `copyAtom`: write `value` into `dest`.
pub fn copy_atom(dest: Dest, value: Atom) -> Op {
    Op::Place(Box::new(dest), Box::new(value))
}

/// Resolves one step of a projection path against a product destination —
/// used when a `Place`d variable is routed to a specific field of an
/// ancestor destination (§4.3.4's `ProjDest`).
pub fn project_dest(dest: &Dest, projection: Projection) -> DestSynthResult<Dest> {
    match (dest, projection) {
        (Dest::Con(ConDest::ProdCon(fields)), Projection::TupleField(i)) => Ok(fields[i as usize].clone()),
        (Dest::Con(ConDest::SumAsProd(sum)), Projection::SumTag) => {
            Ok(Dest::BaseTypeRef { ptr: sum.tag_ptr, offset: Atom::unit() })
        }
        (Dest::Con(ConDest::SumAsProd(sum)), Projection::SumPayload(i)) => Ok(sum.cases[i as usize].clone()),
        (Dest::DepPair { left, .. }, Projection::DepPairLeft) => Ok((**left).clone()),
        (Dest::DepPair { right, .. }, Projection::DepPairRight) => Ok((**right).clone()),
        (other, proj) => Err(DestError::InvalidProjection { projection: format!("{proj:?}"), found: format!("{other:?}") }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomc_ir::{BaseType, IxType, Lit};
    use loomc_util::{NameColor, ScopeStack, Symbol};

    #[test]
    fn index_dest_substitutes_the_table_binder_in_the_offset() {
        let mut stack = ScopeStack::new();
        let binder = stack.push(NameColor::Dest, Symbol::intern("i"));
        let ptr = stack.push(NameColor::Dest, Symbol::intern("p"));
        let dest = Dest::TabRef {
            binder,
            ix_ty: IxType::Fin(Box::new(Atom::Con(Lit::Int(4)))),
            body: Box::new(Dest::BaseTypeRef { ptr, offset: Atom::Var(binder) }),
        };
        let indexed = index_dest(&dest, &Atom::Con(Lit::Int(2))).unwrap();
        assert_eq!(indexed, Dest::BaseTypeRef { ptr, offset: Atom::Con(Lit::Int(2)) });
    }

    #[test]
    fn project_tuple_field_picks_the_right_slot() {
        let mut stack = ScopeStack::new();
        let p0 = stack.push(NameColor::Dest, Symbol::intern("p0"));
        let p1 = stack.push(NameColor::Dest, Symbol::intern("p1"));
        let dest = Dest::Con(ConDest::ProdCon(vec![
            Dest::BaseTypeRef { ptr: p0, offset: Atom::unit() },
            Dest::BaseTypeRef { ptr: p1, offset: Atom::unit() },
        ]));
        let projected = project_dest(&dest, Projection::TupleField(1)).unwrap();
        assert_eq!(projected, Dest::BaseTypeRef { ptr: p1, offset: Atom::unit() });
    }

    #[test]
    fn index_dest_on_a_non_table_destination_errs_instead_of_panicking() {
        let mut stack = ScopeStack::new();
        let ptr = stack.push(NameColor::Dest, Symbol::intern("p"));
        let dest = Dest::BaseTypeRef { ptr, offset: Atom::unit() };
        let err = index_dest(&dest, &Atom::Con(Lit::Int(0))).unwrap_err();
        assert!(matches!(err, DestError::NotATable { .. }));
    }

    #[test]
    fn project_dest_with_a_mismatched_projection_errs_instead_of_panicking() {
        let mut stack = ScopeStack::new();
        let ptr = stack.push(NameColor::Dest, Symbol::intern("p"));
        let dest = Dest::BaseTypeRef { ptr, offset: Atom::unit() };
        let err = project_dest(&dest, Projection::TupleField(0)).unwrap_err();
        assert!(matches!(err, DestError::InvalidProjection { .. }));
    }

    #[test]
    fn load_and_copy_build_the_expected_ops() {
        let mut stack = ScopeStack::new();
        let ptr = stack.push(NameColor::Dest, Symbol::intern("p"));
        let dest = Dest::BaseTypeRef { ptr, offset: Atom::unit() };
        match load_dest(dest.clone()) {
            Op::Load(d) => assert_eq!(*d, dest.clone()),
            _ => panic!("expected Load"),
        }
        match copy_atom(dest.clone(), Atom::Con(Lit::Int(1))) {
            Op::Place(d, v) => {
                assert_eq!(*d, dest);
                assert_eq!(*v, Atom::Con(Lit::Int(1)));
            }
            _ => panic!("expected Place"),
        }
        let _ = BaseType::Int32;
    }
}
