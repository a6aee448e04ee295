//! Driver configuration (§6.1's `Backend × Device × AllocMode` input, plus
//! the vectorization width and emit stage), mirroring the small-struct
//! pattern of `faxc-drv::Config`/`faxt::config::Config` rather than either
//! literally — this core has no source files or optimization levels, only
//! the knobs the three lowering passes actually close over.

use clap::ValueEnum;
use loomc_imp::{Backend, Device};

/// Which stage's output the CLI prints (§6 "outputs"): the dest-passed
/// block, the (optionally) vector-rewritten block, or the final
/// `ImpFunction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EmitStage {
    Dest,
    Vector,
    Imp,
}

impl Default for EmitStage {
    fn default() -> Self {
        EmitStage::Imp
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Llvm,
    Cuda,
}

impl From<BackendArg> for Backend {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Llvm => Backend::Llvm,
            BackendArg::Cuda => Backend::Cuda,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub backend: Backend,
    pub main_device: Device,
    pub vector_width: u32,
    pub emit: EmitStage,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config { backend: Backend::Llvm, main_device: Device::Cpu, vector_width: 4, emit: EmitStage::Imp, verbose: false }
    }
}
