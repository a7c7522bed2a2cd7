use ndarray::ArrayD;

use crate::error::EvalError;
use crate::io::volume::LabelVolume;

pub const DEFAULT_EMPTY_SCORE: f64 = 1.0;

/// Dice coefficient of two boolean masks.
///
/// Both masks empty scores `empty_score`. Differing shapes are an error,
/// never broadcast.
pub fn dice(pred: &ArrayD<bool>, gt: &ArrayD<bool>, empty_score: f64) -> Result<f64, EvalError> {
    if pred.shape() != gt.shape() {
        return Err(EvalError::ShapeMismatch {
            pred: pred.shape().to_vec(),
            gt: gt.shape().to_vec(),
        });
    }

    let mut pred_sum = 0u64;
    let mut gt_sum = 0u64;
    let mut intersection = 0u64;
    for (&p, &g) in pred.iter().zip(gt.iter()) {
        pred_sum += p as u64;
        gt_sum += g as u64;
        intersection += (p && g) as u64;
    }

    let im_sum = pred_sum + gt_sum;
    if im_sum == 0 {
        return Ok(empty_score);
    }
    Ok(2.0 * intersection as f64 / im_sum as f64)
}

pub fn label_mask(volume: &LabelVolume, label: i64) -> ArrayD<bool> {
    volume.data.mapv(|v| v == label)
}

/// Dice of one label between a prediction and its ground truth.
pub fn label_dice(
    pred: &LabelVolume,
    gt: &LabelVolume,
    label: i64,
    empty_score: f64,
) -> Result<f64, EvalError> {
    dice(&label_mask(pred, label), &label_mask(gt, label), empty_score)
}
