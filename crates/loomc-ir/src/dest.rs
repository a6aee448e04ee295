//! Destinations (§3.6) — a typed write-handle tree mapping a logical type to
//! flat memory. Built by destination synthesis (`loomc-dest`), threaded
//! through loop lowering (`loomc-lower`), and consumed by Imp translation
//! (`loomc-imp`), which is why the type lives here rather than in any one
//! of those crates.

use crate::atom::Atom;
use crate::types::{IxType, Type, TypeDefId};
use loomc_util::{Name, Nest};

/// Whether a pointer allocation is owned by the caller (`Unmanaged`, e.g.
/// the top-level result) or by the current scope (`Managed`, freed in
/// reverse allocation order at scope exit). Lives alongside `Dest` rather
/// than in `loomc-imp` because destination synthesis must already decide
/// this per pointer, before any Imp node exists — `chooseAddrSpace`
/// (`loomc-imp`) only turns the decision into a concrete address space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllocMode {
    Managed,
    Unmanaged,
}

/// One pointer binder together with the size-block (a small block computing
/// its element count) that must run before the pointer can be allocated.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerBinder {
    pub name: Name,
    pub base_ty: crate::types::BaseType,
    pub alloc_mode: AllocMode,
    /// The atom computing the number of elements to allocate; `None` when
    /// the size is a single scalar (count 1).
    pub size: Option<Atom>,
}

/// GLOSSARY: a pair of (inner structure abstracted over pointers, list of
/// pointer-info records), used to defer allocation of a `BoxedRef` until
/// its dependent sizes are known at runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct AbsPtrs {
    pub pointers: Nest<PointerBinder>,
    pub inner: Box<Dest>,
}

/// A sum destination: one tag slot plus *every* case's payload destination,
/// all pre-allocated (§4.2: "why all sum payloads are pre-allocated").
#[derive(Clone, Debug, PartialEq)]
pub struct SumDest {
    pub tag_ptr: Name,
    pub cases: Vec<Dest>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConDest {
    ProdCon(Vec<Dest>),
    SumAsProd(Box<SumDest>),
    Newtype(TypeDefId, Box<Dest>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Dest {
    /// A pointer into a flat buffer, at a statically- or symbolically-
    /// computed offset from the start of the allocation.
    BaseTypeRef { ptr: Name, offset: Atom },
    /// An indexed collection of destinations: a table-lambda whose body
    /// computes the per-index `Dest`.
    TabRef { binder: Name, ix_ty: IxType, body: Box<Dest> },
    Con(ConDest),
    /// The right component's destination is a function of the left's
    /// eventual value; `right` is a closure-like block parameterized over
    /// the left binder rather than a plain `Dest`, matching §3.6's
    /// "abstracted rightRef".
    DepPair { left: Box<Dest>, right_binder: Name, right: Box<Dest>, pair_ty: Box<Type> },
    /// The enclosed destination is parameterized over pointers allocated
    /// lazily once dependent sizes are known at runtime.
    Boxed(Box<AbsPtrs>),
}

impl Dest {
    /// D1: every leaf `BaseTypeRef` pointer must be bound by some enclosing
    /// `AbsPtrs` nest. Walks the tree collecting leaves and checks each
    /// against the bound set; used by property tests (P3) and by
    /// `loomc-dest`'s own construction-time assertions.
    pub fn leaf_pointers(&self) -> Vec<Name> {
        let mut out = Vec::new();
        self.collect_leaf_pointers(&mut out);
        out
    }

    fn collect_leaf_pointers(&self, out: &mut Vec<Name>) {
        match self {
            Dest::BaseTypeRef { ptr, .. } => out.push(*ptr),
            Dest::TabRef { body, .. } => body.collect_leaf_pointers(out),
            Dest::Con(ConDest::ProdCon(ds)) => ds.iter().for_each(|d| d.collect_leaf_pointers(out)),
            Dest::Con(ConDest::SumAsProd(sum)) => {
                out.push(sum.tag_ptr);
                sum.cases.iter().for_each(|d| d.collect_leaf_pointers(out));
            }
            Dest::Con(ConDest::Newtype(_, inner)) => inner.collect_leaf_pointers(out),
            Dest::DepPair { left, right, .. } => {
                left.collect_leaf_pointers(out);
                right.collect_leaf_pointers(out);
            }
            Dest::Boxed(abs) => abs.inner.collect_leaf_pointers(out),
        }
    }

    pub fn is_base_type_ref(&self) -> bool {
        matches!(self, Dest::BaseTypeRef { .. })
    }
}

/// §4.3.4: how a variable's writes route into an ancestor destination —
/// either the whole thing, or a specific projection path into it.
#[derive(Clone, Debug, PartialEq)]
pub enum ProjDest {
    FullDest(Dest),
    ProjDest(Vec<crate::atom::Projection>, Dest),
}

impl ProjDest {
    pub fn dest(&self) -> &Dest {
        match self {
            ProjDest::FullDest(d) => d,
            ProjDest::ProjDest(_, d) => d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomc_util::{NameColor, ScopeStack};

    fn fresh(stack: &mut ScopeStack, s: &str) -> Name {
        stack.push(NameColor::Dest, loomc_util::Symbol::intern(s))
    }

    #[test]
    fn leaf_pointers_collects_through_prod() {
        let mut stack = ScopeStack::new();
        let p0 = fresh(&mut stack, "p0");
        let p1 = fresh(&mut stack, "p1");
        let dest = Dest::Con(ConDest::ProdCon(vec![
            Dest::BaseTypeRef { ptr: p0, offset: Atom::unit() },
            Dest::BaseTypeRef { ptr: p1, offset: Atom::unit() },
        ]));
        let leaves = dest.leaf_pointers();
        assert_eq!(leaves, vec![p0, p1]);
    }

    #[test]
    fn sum_dest_includes_tag_pointer() {
        let mut stack = ScopeStack::new();
        let tag = fresh(&mut stack, "tag");
        let p0 = fresh(&mut stack, "p0");
        let dest = Dest::Con(ConDest::SumAsProd(Box::new(SumDest {
            tag_ptr: tag,
            cases: vec![Dest::BaseTypeRef { ptr: p0, offset: Atom::unit() }],
        })));
        let leaves = dest.leaf_pointers();
        assert!(leaves.contains(&tag));
        assert!(leaves.contains(&p0));
    }
}
