//! Pipeline orchestration (§2 "control flow of a single compilation unit"),
//! mirroring `faxc-drv::Session::compile`'s phase-by-phase shape but over
//! the three passes this core actually owns: loop lowering, vectorization,
//! and Imp translation.

use loomc_imp::{translate_function, CallingConvention, Device, ImpCtx, ImpFunction};
use loomc_ir::{Block, DestBlock, Expr, Hof, Type};
use loomc_lower::Builder;
use loomc_vectorize::{vectorize_seq, Outcome};

use crate::config::Config;
use crate::error::Result;

/// One compilation unit's result at every stage the CLI might want to
/// print (`--emit dest|vector|imp`).
pub struct PipelineOutput {
    pub dest_block: DestBlock,
    pub vectorized_seqs: usize,
    pub imp: ImpFunction,
}

pub struct Session {
    pub config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session { config }
    }

    /// Runs `block` (already typed, already simplified — see §1 Non-goals)
    /// through loop lowering, then a best-effort top-level vectorization
    /// pass over any `Seq` left directly in the dest-passed body, then Imp
    /// translation.
    pub fn run(&self, ans_ty: &Type, block: &Block) -> Result<PipelineOutput> {
        let mut builder = Builder::new();
        tracing::info!(?ans_ty, "lowering compilation unit");
        let (mut dest_block, _pointers) = loomc_lower::lower_fully_sequential(&mut builder, ans_ty, block)?;

        let vectorized_seqs = self.vectorize_top_level(builder.scope_mut(), &mut dest_block);

        let ctx = ImpCtx { backend: self.config.backend, main_device: self.config.main_device, current_device: self.config.main_device };
        tracing::info!("translating to Imp IR");
        let (imp, _recon) = translate_function(&ctx, CallingConvention::CEntryFun, loomc_util::Nest::empty(), &dest_block)?;

        Ok(PipelineOutput { dest_block, vectorized_seqs, imp })
    }

    /// Attempts §4.4 vectorization on every `Hof::Seq` bound directly in
    /// `dest_block`'s top-level decls. A loop with dependent structure or
    /// nested control flow (anything not a bare top-level `Seq`) is left
    /// alone — strip-mining a loop that itself contains other loops is a
    /// deeper rewrite this pass doesn't attempt.
    ///
    /// `scope` must be the same `ScopeStack` that minted `dest_block`'s own
    /// names (`Builder::scope_mut`) — a fresh, disconnected `ScopeStack`
    /// would mint `Name`s whose `ScopeId`s can collide with `dest_block`'s
    /// once the rewritten `Seq` is spliced back in, since a `Name`'s
    /// uniqueness only holds within one `ScopeStack` instance.
    fn vectorize_top_level(&self, scope: &mut loomc_util::ScopeStack, dest_block: &mut DestBlock) -> usize {
        let mut count = 0;
        for decl in &mut dest_block.body.decls {
            if let Expr::Hof(hof @ Hof::Seq { .. }) = &decl.expr {
                match vectorize_seq(scope, hof, self.config.vector_width) {
                    Ok(Outcome::Vectorized(rewritten)) => {
                        decl.expr = Expr::Hof(rewritten);
                        count += 1;
                    }
                    Ok(Outcome::Refused { reason }) => {
                        tracing::debug!(%reason, "vectorization refused");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "vectorization write conflict");
                    }
                }
            }
        }
        count
    }
}

pub fn device_from_gpu_index(index: Option<u32>) -> Device {
    match index {
        Some(n) => Device::Gpu(n),
        None => Device::Cpu,
    }
}
