use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::{Ctx, ModelRun};
use crate::error::EvalError;
use crate::input;
use crate::io::volume::{self, LabelVolume};
use crate::math::dice;
use crate::pipeline::Stage;
use crate::schema::v1::LabelMap;
use crate::scores::{ENSEMBLE_MODEL_ID, Score, ScoreRecord, resolve_label_name};

pub struct Stage2Evaluate;

impl Stage2Evaluate {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Evaluate {
    fn name(&self) -> &'static str {
        "stage2_evaluate"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let models = ctx.models.clone();
        for model in &models {
            let files = input::list_prediction_files(&model.pred_dir)?;
            info!(
                model_id = %model.model_id,
                pred_dir = %model.pred_dir.display(),
                files = files.len(),
                "model_predictions"
            );
            for pred_file in &files {
                evaluate_case(ctx, model, pred_file)?;
            }
        }
        info!(
            processed = ctx.evaluation.processed_files,
            records = ctx.evaluation.len(),
            "evaluation_done"
        );
        Ok(())
    }
}

fn evaluate_case(ctx: &mut Ctx, model: &ModelRun, pred_file: &Path) -> Result<()> {
    let file_name = input::file_name_of(pred_file)?;
    let case_id = input::parse_case_id(&file_name)?;

    let gt_file = input::ground_truth_path(
        &ctx.run_dir,
        &ctx.cohort_dir,
        &case_id,
        &ctx.gt_dir,
        &file_name,
    );
    if !gt_file.is_file() {
        return Err(EvalError::MissingGroundTruth(gt_file).into());
    }

    let file_id = if ctx.anonymize {
        ctx.anonymizer.anonymize(&case_id)
    } else {
        case_id.clone()
    };

    info!(gt = %gt_file.display(), "loading gt");
    let gt = volume::load_label_volume(&gt_file)?;
    info!(pred = %pred_file.display(), "loading prediction");
    let pred = volume::load_label_volume(pred_file)?;
    info!(
        file_id = %file_id,
        gt_labels = ?gt.labels,
        pred_labels = ?pred.labels,
        "case_loaded"
    );

    score_labels(
        ctx,
        &file_id,
        &model.model_id,
        model.labels.as_ref(),
        &pred,
        &gt,
    )?;

    if let Some(ensemble_dir) = ctx.ensemble_dir.clone() {
        if ensemble_pending(ctx, &file_id, model.labels.as_ref()) {
            let ensemble_file = ensemble_dir.join(&file_name);
            if !ensemble_file.is_file() {
                return Err(EvalError::MissingEnsemblePrediction(ensemble_file).into());
            }
            info!(ensemble = %ensemble_file.display(), "loading ensemble prediction");
            let ensemble = volume::load_label_volume(&ensemble_file)?;
            ctx.ensemble_labels.insert(file_id.clone(), ensemble.labels.clone());
            score_labels(
                ctx,
                &file_id,
                ENSEMBLE_MODEL_ID,
                model.labels.as_ref(),
                &ensemble,
                &gt,
            )?;
        }
    }

    ctx.evaluation.processed_files += 1;
    Ok(())
}

/// Whether the ensemble prediction of `file_id` has a label that resolves
/// under `labels` but has no ensemble score yet. Unseen cases are pending.
fn ensemble_pending(ctx: &Ctx, file_id: &str, labels: Option<&LabelMap>) -> bool {
    let Some(ensemble_labels) = ctx.ensemble_labels.get(file_id) else {
        return true;
    };
    ensemble_labels.iter().any(|&label| {
        resolve_label_name(labels, label)
            .is_some_and(|name| !ctx.evaluation.has_score(file_id, &name, ENSEMBLE_MODEL_ID))
    })
}

/// Scores every label present in `pred` against `gt` under `model_id`.
///
/// Ensemble scores are added only for cells that do not hold one yet.
fn score_labels(
    ctx: &mut Ctx,
    file_id: &str,
    model_id: &str,
    labels: Option<&LabelMap>,
    pred: &LabelVolume,
    gt: &LabelVolume,
) -> Result<()> {
    for &label in &pred.labels {
        let Some(label_name) = resolve_label_name(labels, label) else {
            warn!(
                file_id,
                model_id,
                label,
                known = ?labels.map(|l| l.keys().collect::<Vec<_>>()),
                "predicted label not in label dictionary; skipped"
            );
            ctx.warnings.push(format!(
                "{}/{}: predicted label {} not in label dictionary",
                file_id, model_id, label
            ));
            continue;
        };

        if model_id == ENSEMBLE_MODEL_ID && ctx.evaluation.has_score(file_id, &label_name, model_id)
        {
            continue;
        }

        let score = dice::label_dice(pred, gt, label, ctx.empty_score)?;
        info!(file_id, model_id, label = %label_name, dice = score, "score added");
        ctx.evaluation.push(ScoreRecord {
            file_id: file_id.to_string(),
            model_id: model_id.to_string(),
            label: label_name,
            score: Score(score),
        });
    }
    Ok(())
}
