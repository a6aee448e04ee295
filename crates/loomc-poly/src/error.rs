use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolyError {
    #[error("index structure has {binders} binders but {indices} indices were supplied")]
    ArityMismatch { binders: usize, indices: usize },
}

pub type PolyResult<T> = Result<T, PolyError>;
