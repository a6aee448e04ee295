//! loomc-util — core utilities shared by every pass of the loomc pipeline.
//!
//! This crate is the leaf of the dependency graph (§2 of the design spec):
//! string interning, typed indices, source spans, diagnostics, and the
//! name/scope kernel that every IR in `loomc-ir` is built on top of.

pub mod cache;
pub mod diagnostic;
pub mod index_vec;
pub mod scope;
pub mod span;
pub mod symbol;

pub use cache::LazyMap;
pub use index_vec::{Idx, IndexVec};
pub use scope::{Binder, Name, NameColor, Nest, NonDepNest, ScopeId, ScopeStack};
pub use span::{SourceMap, Span};
pub use symbol::Symbol;

pub use rustc_hash::{FxHashMap, FxHashSet};
