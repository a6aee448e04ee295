//! Atoms (§3.3) — the value-level tagged union. An atom is always in
//! weak-head normal form; anything requiring further reduction is an
//! [`crate::expr::Expr`] bound by a `Let` in some enclosing [`crate::block::Block`].
//!
//! Two variants ([`Atom::BoxedRef`], [`Atom::ImpVar`]) are legal only once a
//! block has reached [`Phase::SimpToImp`]; [`Atom::is_legal_in`] is the
//! runtime check a pass boundary asserts instead of encoding the
//! restriction in the type itself (see `phase.rs`).

use crate::block::Block;
use crate::phase::{Phase, PhaseChecked};
use crate::types::{BaseType, Type, TypeDefId};
use loomc_util::{Name, Symbol};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lit {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// One step of a projection path: tuple index or named field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    TupleField(u32),
    SumTag,
    SumPayload(u32),
    DepPairLeft,
    DepPairRight,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LamExpr {
    pub binder: Name,
    pub arg_ty: Type,
    pub body: Box<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TabLamExpr {
    pub binder: Name,
    pub ix_ty: crate::types::IxType,
    pub body: Box<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PiType {
    pub binder: Name,
    pub arg_ty: Type,
    pub result_ty: Box<Type>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TabPiType {
    pub binder: Name,
    pub ix_ty: crate::types::IxType,
    pub result_ty: Box<Type>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AltCase {
    pub binder: Name,
    pub payload_ty: Type,
    pub body: Block,
}

/// A bound variable embedded directly in an atom at the Imp layer: no
/// longer a name resolved through the high-IR scope, but a raw
/// pointer-or-scalar slot that Imp translation has already committed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImpVar {
    pub name: Name,
    pub base_ty: BaseType,
    pub is_pointer: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    Var(Name),
    Con(Lit),
    /// A type used in value position (passing a `TabTy`/`ProdType`/... as
    /// an ordinary atom, e.g. as a dictionary method argument).
    TC(Box<Type>),
    Lam(Box<LamExpr>),
    TabLam(Box<TabLamExpr>),
    Pi(Box<PiType>),
    TabPi(Box<TabPiType>),
    DepPair { left: Box<Atom>, right: Box<Atom>, pair_ty: Box<Type> },
    DataTypeApp(TypeDefId, Vec<Atom>),
    DictCon(Symbol, Vec<Atom>),
    DictTy(Symbol, Vec<Type>),
    LabeledRowTy(Vec<(Symbol, Type)>),
    RecordTy(Vec<(Symbol, Type)>),
    VariantTy(Vec<(Symbol, Type)>),
    EffectRow(Vec<Symbol>),
    Project(Vec<Projection>, Name),
    /// A `case` pushed into atom position by the simplifier: legal wherever
    /// an atom is legal because every arm's result is itself already an atom.
    ACase { scrutinee: Box<Atom>, alts: Vec<AltCase>, result_ty: Box<Type> },
    /// A reference into the left component of a dependent pair, used while
    /// the right component's destination is being instantiated against it.
    DepPairRef(Box<Atom>),
    /// SimpToImp only: the destination-abstracted inner structure plus its
    /// pointer-info records (GLOSSARY: `AbsPtrs`), exposed at atom position
    /// wherever a boxed/deferred-allocation destination is read back.
    BoxedRef(Box<crate::dest::AbsPtrs>),
    /// SimpToImp only: a raw Imp-level pointer or scalar embedded directly
    /// in an atom, produced once a value has been committed to a concrete
    /// machine location.
    ImpAtomVar(ImpVar),
}

impl Atom {
    pub fn var(name: Name) -> Self {
        Atom::Var(name)
    }

    pub fn unit() -> Self {
        Atom::Con(Lit::Unit)
    }
}

impl PhaseChecked for Atom {
    fn is_legal_in(&self, phase: Phase) -> bool {
        match self {
            Atom::BoxedRef(_) | Atom::ImpAtomVar(_) => phase.allows_dest_ops(),
            _ => true,
        }
    }
}
