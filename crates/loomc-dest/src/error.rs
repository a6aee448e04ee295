use loomc_ir::TypeDefId;
use thiserror::Error;

/// Destination-synthesis-specific compiler-internal invariants (§7 kind 2):
/// these never surface to a source-level diagnostic, since they mean a
/// prior pass handed `make_dest` a shape it cannot satisfy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DestError {
    #[error("type constructor {0:?} did not resolve to a representable type")]
    UnresolvedTypeCon(TypeDefId),
    #[error("destination synthesis reached a dependent tabulation with no boxed fallback: {detail}")]
    UnhandledDependentShape { detail: String },
    #[error("index_dest called on a non-table destination: {found}")]
    NotATable { found: String },
    #[error("projection {projection} does not apply to destination {found}")]
    InvalidProjection { projection: String, found: String },
    #[error("offset computation failed during destination synthesis: {0}")]
    Offset(#[from] loomc_poly::PolyError),
}

pub type DestSynthResult<T> = Result<T, DestError>;
