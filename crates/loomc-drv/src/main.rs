use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use loomc_drv::{config::BackendArg, Config, EmitStage, Session};
use loomc_util::ScopeStack;

/// loomc - the array-language lowering and vectorization core.
///
/// Runs one of the built-in compilation units (§1: this core takes an
/// already-typed, already-simplified block as input, so there is no source
/// file to point it at) through loop lowering, vectorization, and Imp
/// translation, and prints the requested stage's output.
#[derive(Parser, Debug)]
#[command(name = "loomc")]
#[command(author = "loomc contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Array-language lowering and vectorization core", long_about = None)]
struct Cli {
    /// Which built-in scenario to run.
    #[arg(value_enum, default_value_t = ScenarioArg::S1)]
    scenario: ScenarioArg,

    /// Which stage's output to print.
    #[arg(short, long, value_enum, default_value_t = EmitStage::Imp)]
    emit: EmitStage,

    /// Target backend.
    #[arg(long, value_enum, default_value_t = BackendArg::Llvm)]
    backend: BackendArg,

    /// Vector width in lanes for the vectorization pass.
    #[arg(long, default_value_t = 4)]
    vector_width: u32,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true, env = "LOOMC_VERBOSE")]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ScenarioArg {
    S1,
    S2,
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false).with_thread_names(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = Config { backend: cli.backend.into(), vector_width: cli.vector_width, emit: cli.emit, ..Config::default() };
    let session = Session::new(config);

    let mut scope = ScopeStack::new();
    let (ans_ty, block) = match cli.scenario {
        ScenarioArg::S1 => loomc_drv::scenarios::s1(&mut scope),
        ScenarioArg::S2 => loomc_drv::scenarios::s2(&mut scope),
    };

    let output = session.run(&ans_ty, &block)?;
    tracing::info!(vectorized = output.vectorized_seqs, "pipeline finished");

    match session.config.emit {
        EmitStage::Dest | EmitStage::Vector => println!("{:#?}", output.dest_block),
        EmitStage::Imp => println!("{:#?}", output.imp),
    }

    Ok(())
}
