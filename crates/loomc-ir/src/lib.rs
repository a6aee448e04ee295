//! loomc-ir — the IR data model shared by every lowering and vectorization
//! pass: atoms, expressions, blocks/decls, types, and destinations (§3 of
//! the design spec). Phase-sensitive nodes (boxed refs, Imp atom vars) are
//! tagged at runtime rather than through the type system; see `phase.rs`.

pub mod atom;
pub mod block;
pub mod dest;
pub mod expr;
pub mod phase;
pub mod types;
pub mod visitor;

pub use atom::{Atom, Lit, Projection};
pub use block::{Block, BlockAnnotation, Decl, DestBlock};
pub use dest::{AbsPtrs, AllocMode, ConDest, Dest, PointerBinder, ProjDest, SumDest};
pub use expr::{Alt, BinOp, Expr, Handle, HandleClause, Hof, IxMethod, Op, SeqDir, UnOp};
pub use phase::{Phase, PhaseChecked};
pub use types::{BaseType, IxType, Type, TypeDefId};
pub use visitor::Visitor;
