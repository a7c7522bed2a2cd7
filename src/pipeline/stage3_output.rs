use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::error::EvalError;
use crate::io::{json_writer, plot};
use crate::pipeline::Stage;

pub struct Stage3Output;

impl Stage3Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Output {
    fn name(&self) -> &'static str {
        "stage3_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.evaluation.processed_files == 0 {
            warn!(batch_root = %ctx.batch_root().display(), "no files have been processed");
            return Err(EvalError::NoFilesProcessed.into());
        }

        let out_dir = &ctx.output.out_dir;
        fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;

        let tables = json_writer::build_tables(ctx);
        json_writer::write_tables(ctx, &tables)?;
        info!(
            case_json = %ctx.output.case_json_path.display(),
            model_json = %ctx.output.model_json_path.display(),
            records = ctx.evaluation.len(),
            "results_written"
        );

        if ctx.write_plot && ctx.evaluation.is_empty() {
            warn!("no scores to plot");
        } else if ctx.write_plot {
            plot::render_boxplot(
                &ctx.output.plot_png_path,
                &ctx.output.plot_pdf_path,
                ctx.evaluation.records(),
            )?;
            info!(
                png = %ctx.output.plot_png_path.display(),
                pdf = %ctx.output.plot_pdf_path.display(),
                "plot_written"
            );
        }

        ctx.tables = Some(tables);
        Ok(())
    }
}
