use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::error::EvalError;
use crate::pipeline::Stage;

pub struct Stage0Scaffold;

impl Stage0Scaffold {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage0Scaffold {
    fn name(&self) -> &'static str {
        "stage0_scaffold"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if !ctx.run_dir.is_dir() {
            warn!(run_dir = %ctx.run_dir.display(), "run dir does not exist");
        }

        if let Some(rel) = ctx.ensemble_dir.take() {
            let ensemble_dir = ctx.run_dir.join(rel);
            if !ensemble_dir.is_dir() {
                return Err(EvalError::MissingEnsembleDir(ensemble_dir).into());
            }
            info!(ensemble_dir = %ensemble_dir.display(), "ensemble_dir_ready");
            ctx.ensemble_dir = Some(ensemble_dir);
        }

        info!(
            batch_root = %ctx.batch_root().display(),
            anonymize = ctx.anonymize,
            empty_score = ctx.empty_score,
            "scaffold_ready"
        );
        Ok(())
    }
}
