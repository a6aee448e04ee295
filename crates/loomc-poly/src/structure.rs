//! Index structures (§4.1): a telescope of index-type binders `Π(i : IxType)`,
//! plus the free-variable analysis that lets [`split`] decide which prefix
//! is non-dependent.

use loomc_ir::{Atom, IxType, Type};
use loomc_util::Name;
use std::collections::HashSet;

/// One binder of an index structure: a fresh name of the given index type.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexBinder {
    pub name: Name,
    pub ix_ty: IxType,
}

/// A telescope of index-type binders, outermost first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexStructure {
    pub binders: Vec<IndexBinder>,
}

impl IndexStructure {
    pub fn empty() -> Self {
        IndexStructure { binders: Vec::new() }
    }

    pub fn push(&mut self, name: Name, ix_ty: IxType) {
        self.binders.push(IndexBinder { name, ix_ty });
    }

    pub fn len(&self) -> usize {
        self.binders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }
}

fn free_vars_of_atom(atom: &Atom, out: &mut HashSet<Name>) {
    match atom {
        Atom::Var(n) => {
            out.insert(*n);
        }
        Atom::TC(ty) => free_vars_of_type(ty, out),
        Atom::DepPair { left, right, pair_ty } => {
            free_vars_of_atom(left, out);
            free_vars_of_atom(right, out);
            free_vars_of_type(pair_ty, out);
        }
        Atom::DataTypeApp(_, args) | Atom::DictCon(_, args) => {
            args.iter().for_each(|a| free_vars_of_atom(a, out))
        }
        Atom::Project(_, n) => {
            out.insert(*n);
        }
        Atom::ACase { scrutinee, .. } => free_vars_of_atom(scrutinee, out),
        Atom::DepPairRef(inner) => free_vars_of_atom(inner, out),
        Atom::Con(_)
        | Atom::Lam(_)
        | Atom::TabLam(_)
        | Atom::Pi(_)
        | Atom::TabPi(_)
        | Atom::DictTy(_, _)
        | Atom::LabeledRowTy(_)
        | Atom::RecordTy(_)
        | Atom::VariantTy(_)
        | Atom::EffectRow(_)
        | Atom::BoxedRef(_)
        | Atom::ImpAtomVar(_) => {}
    }
}

fn free_vars_of_type(ty: &Type, out: &mut HashSet<Name>) {
    match ty {
        Type::Fin(n) => free_vars_of_atom(n, out),
        Type::TabTy(ix_ty, body) => {
            free_vars_of_ix_ty(ix_ty, out);
            free_vars_of_type(body, out);
        }
        Type::ProdType(tys) | Type::SumType(tys) => tys.iter().for_each(|t| free_vars_of_type(t, out)),
        Type::DepPairTy { left_binder, left_ty, right_ty } => {
            free_vars_of_type(left_ty, out);
            let mut right_free = HashSet::new();
            free_vars_of_type(right_ty, &mut right_free);
            right_free.remove(left_binder);
            out.extend(right_free);
        }
        Type::TypeCon(_, args) => args.iter().for_each(|t| free_vars_of_type(t, out)),
        Type::RefTy(inner) | Type::Newtype(_, inner) => free_vars_of_type(inner, out),
        Type::Unit | Type::Nat | Type::Base(_) => {}
    }
}

fn free_vars_of_ix_ty(ix_ty: &IxType, out: &mut HashSet<Name>) {
    match ix_ty {
        IxType::Fin(n) => free_vars_of_atom(n, out),
        IxType::Dict { carrier, .. } => free_vars_of_type(carrier, out),
    }
}

/// Does `ix_ty`'s annotation reference any name in `bound`? This is what
/// distinguishes a non-dependent binder (safe to multiply into a plain
/// product) from a dependent one.
pub fn depends_on(ix_ty: &IxType, bound: &HashSet<Name>) -> bool {
    let mut free = HashSet::new();
    free_vars_of_ix_ty(ix_ty, &mut free);
    free.iter().any(|n| bound.contains(n))
}

/// §4.1 "split rule": partitions the telescope into a maximal non-dependent
/// prefix and the dependent suffix starting at the first binder whose
/// annotation references an earlier one. Everything from that point on,
/// even binders that don't themselves depend on anything, stays in the
/// suffix — `elemCountPoly` only has a closed form for that shape once it
/// commits to summing over the first dependent binder.
pub fn split(structure: &IndexStructure) -> (&[IndexBinder], &[IndexBinder]) {
    let mut bound = HashSet::new();
    for (i, b) in structure.binders.iter().enumerate() {
        if depends_on(&b.ix_ty, &bound) {
            return structure.binders.split_at(i);
        }
        bound.insert(b.name);
    }
    (&structure.binders[..], &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomc_ir::Atom;
    use loomc_util::{NameColor, ScopeStack, Symbol};

    fn fin_lit(stack: &mut ScopeStack) -> (Name, IxType) {
        let n = stack.push(NameColor::Atom, Symbol::intern("n"));
        (n, IxType::Fin(Box::new(Atom::Var(n))))
    }

    #[test]
    fn fully_non_dependent_structure_splits_to_empty_suffix() {
        let mut stack = ScopeStack::new();
        let mut structure = IndexStructure::empty();
        let i = stack.push(NameColor::Atom, Symbol::intern("i"));
        let j = stack.push(NameColor::Atom, Symbol::intern("j"));
        structure.push(i, IxType::Fin(Box::new(Atom::Con(loomc_ir::Lit::Int(3)))));
        structure.push(j, IxType::Fin(Box::new(Atom::Con(loomc_ir::Lit::Int(5)))));
        let (prefix, suffix) = split(&structure);
        assert_eq!(prefix.len(), 2);
        assert!(suffix.is_empty());
    }

    #[test]
    fn dependent_binder_starts_the_suffix() {
        let mut stack = ScopeStack::new();
        let mut structure = IndexStructure::empty();
        let (n, n_ty) = fin_lit(&mut stack);
        let i = stack.push(NameColor::Atom, Symbol::intern("i"));
        structure.push(n, n_ty);
        structure.push(i, IxType::Fin(Box::new(Atom::Var(n))));
        let (prefix, suffix) = split(&structure);
        assert_eq!(prefix.len(), 1);
        assert_eq!(suffix.len(), 1);
        assert_eq!(suffix[0].name, i);
    }
}
