use thiserror::Error;

/// §7 kind 2 for Imp translation, plus §4.5's "failure mode": ops that
/// should already have been eliminated upstream (`RecordCons`,
/// `VariantSplit`, explicit-apply, a surviving generic `Handle`) are not a
/// distinct error family — they fail loudly through the same
/// `NotImplemented` tag the spec names, carrying what was actually found.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImpError {
    #[error("not implemented in Imp: {what}")]
    NotImplemented { what: String },
    #[error("destination shape mismatch during Imp translation: {detail}")]
    DestShapeMismatch { detail: String },
    #[error("hoisting failure (B2): decl for {binder:?} is not reachable from its block's result")]
    HoistFailure { binder: String },
    #[error("destination synthesis failed during Imp translation: {0}")]
    DestSynth(#[from] loomc_dest::DestError),
}

pub type ImpResult<T> = Result<T, ImpError>;
