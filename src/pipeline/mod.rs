use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::ctx::Ctx;

pub mod stage0_scaffold;
pub mod stage1_discover;
pub mod stage2_evaluate;
pub mod stage3_output;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Ctx) -> Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Scaffold, discovery, scoring and output, in that order.
    pub fn dice() -> Self {
        Self::new(vec![
            Box::new(stage0_scaffold::Stage0Scaffold::new()),
            Box::new(stage1_discover::Stage1Discover::new()),
            Box::new(stage2_evaluate::Stage2Evaluate::new()),
            Box::new(stage3_output::Stage3Output::new()),
        ])
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<()> {
        info!(
            run_id = %ctx.run_id,
            run_dir = %ctx.run_dir.display(),
            "evaluation started"
        );
        for stage in &self.stages {
            let start = Instant::now();
            info!(stage = stage.name(), "stage started");
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    elapsed_ms = elapsed_ms as u64,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            info!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                "stage finished"
            );
        }
        Ok(())
    }
}
