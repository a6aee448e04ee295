use thiserror::Error;

/// §7 kind 2: a hard failure distinct from ordinary vectorization refusal
/// (§7 kind 3, which is not an error — see [`crate::vectorize::Outcome`]).
/// The only case the stability lattice treats as fatal rather than
/// "give up and keep the scalar loop" is a genuine write conflict: a
/// `Place` through a pointer shared by every lane (`Uniform`) receiving a
/// value that differs per lane.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorizeError {
    #[error("vectorization write conflict at {binder}: a uniform pointer cannot receive a non-uniform value")]
    WriteConflict { binder: String },
}

pub type VectorizeResult<T> = Result<T, VectorizeError>;
