use thiserror::Error;

/// §7 kind 2: compiler-internal invariant violations surfaced during
/// lowering. None of these are user-recoverable; they mean an earlier pass
/// produced a shape lowering does not expect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LowerError {
    #[error("hoisting failure (B2): decl for {binder:?} is not reachable from its block's result")]
    HoistFailure { binder: String },
    #[error("unexpected shape during lowering: expected {expected}, found {found}")]
    UnexpectedShape { expected: String, found: String },
    #[error("destination shape mismatch: {detail}")]
    DestShapeMismatch { detail: String },
    #[error("destination synthesis failed during lowering: {0}")]
    DestSynth(#[from] loomc_dest::DestError),
}

pub type LowerResult<T> = Result<T, LowerError>;
