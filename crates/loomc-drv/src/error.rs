//! Driver-level error type, mirroring the one-enum-per-concern convention
//! used throughout the rest of the workspace (`loomc_util::error`,
//! `loomc_ir::error`, …) rather than `faxc-drv`'s own hand-rolled
//! `CompileError`/`Display` pair.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrvError {
    #[error("loop lowering failed: {0}")]
    Lower(#[from] loomc_lower::LowerError),

    #[error("vectorization failed: {0}")]
    Vectorize(#[from] loomc_vectorize::VectorizeError),

    #[error("imp translation failed: {0}")]
    Imp(#[from] loomc_imp::ImpError),
}

pub type Result<T> = std::result::Result<T, DrvError>;
