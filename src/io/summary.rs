use std::collections::BTreeMap;

use anyhow::{Result, bail};

use crate::ctx::Ctx;
use crate::io::plot::model_order;
use crate::math::stats;

pub fn format_summary(ctx: &Ctx) -> Result<String> {
    let version = env!("CARGO_PKG_VERSION");
    let records = ctx.evaluation.records();

    let mut per_model: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records {
        if r.score.0.is_nan() {
            bail!("NaN dice score for {}/{}/{}", r.file_id, r.model_id, r.label);
        }
        per_model.entry(r.model_id.as_str()).or_default().push(r.score.0);
    }

    let mut out = String::new();
    out.push_str(&format!("seg-eval v{}\n", version));
    out.push_str(&format!(
        "Run: {}, models={}, processed files={}, scores={}\n",
        ctx.run_id,
        ctx.models.len(),
        ctx.evaluation.processed_files,
        records.len()
    ));
    for model in model_order(records) {
        let Some(values) = per_model.get_mut(model.as_str()) else {
            continue;
        };
        let mean = stats::mean(values);
        let median = stats::median(values);
        out.push_str(&format!(
            "{}: n={} mean={:.4} median={:.4}\n",
            model,
            values.len(),
            mean,
            median
        ));
    }
    Ok(out)
}
