use anyhow::Result;
use tracing::info;

use crate::ctx::{Ctx, ModelRun};
use crate::input;
use crate::io::metadata;
use crate::pipeline::Stage;

pub struct Stage1Discover;

impl Stage1Discover {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Discover {
    fn name(&self) -> &'static str {
        "stage1_discover"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let batch_root = ctx.batch_root();
        let elements = input::list_batch_elements(&batch_root)?;
        info!(batch_root = %batch_root.display(), batches = elements.len(), "batches_found");

        let mut models = Vec::with_capacity(elements.len());
        for (idx, dir) in elements.into_iter().enumerate() {
            let counter = idx + 1;
            let pred_dir = dir.join(&ctx.operator_in_dir);
            let info = metadata::resolve_model_info(&dir, &pred_dir)?;
            let model_id = metadata::qualified_model_id(info.model_id.as_deref(), counter);
            if info.labels.is_none() {
                ctx.warnings.push(format!(
                    "{}: no label dictionary; raw label values used as names",
                    model_id
                ));
            }
            info!(
                batch_element = %dir.display(),
                model_id = %model_id,
                labels = info.labels.as_ref().map(|l| l.len()).unwrap_or(0),
                "model_discovered"
            );
            models.push(ModelRun {
                counter,
                dir,
                pred_dir,
                model_id,
                labels: info.labels,
            });
        }

        ctx.models = models;
        Ok(())
    }
}
