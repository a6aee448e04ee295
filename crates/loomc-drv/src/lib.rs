//! loomc-drv — the driver: wires loop lowering, vectorization, and Imp
//! translation into one pipeline, exposes it through a `clap` CLI over a
//! handful of built-in compilation units (§1 Non-goals: no parser, so
//! there is no source text to read), and owns the end-to-end scenario
//! tests for S1–S6. Grounded on `faxc-drv`'s `Config`/`Session` split and
//! `faxt`'s `clap` + `tracing_subscriber` CLI shape (`faxc-drv` itself pulls
//! in neither crate).

pub mod config;
pub mod error;
pub mod scenarios;
pub mod session;

pub use config::{BackendArg, Config, EmitStage};
pub use error::{DrvError, Result};
pub use session::{PipelineOutput, Session};
