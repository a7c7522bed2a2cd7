use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::EvalError;

mod anonymize;

pub use anonymize::CaseAnonymizer;

const NIFTI_GZ_SUFFIX: &str = ".nii.gz";
const NIFTI_SUFFIX: &str = ".nii";

/// Case id of a prediction or ground-truth file.
///
/// `<case_id>.nii.gz` and `<case_id>.nii` are accepted; anything else,
/// including an empty stem, is `EvalError::InvalidCaseFileName`.
pub fn parse_case_id(file_name: &str) -> Result<String, EvalError> {
    let stem = file_name
        .strip_suffix(NIFTI_GZ_SUFFIX)
        .or_else(|| file_name.strip_suffix(NIFTI_SUFFIX));
    match stem {
        Some(stem) if !stem.is_empty() => Ok(stem.to_string()),
        _ => Err(EvalError::InvalidCaseFileName(file_name.to_string())),
    }
}

/// Batch elements below `batch_root`, sorted by directory name.
pub fn list_batch_elements(batch_root: &Path) -> Result<Vec<PathBuf>> {
    if !batch_root.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(batch_root)
        .with_context(|| format!("failed to list {}", batch_root.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// `*.nii*` files directly inside `pred_dir`, sorted by file name.
/// Hidden files (such as `._case.nii.gz` resource forks) are skipped.
pub fn list_prediction_files(pred_dir: &Path) -> Result<Vec<PathBuf>> {
    if !pred_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in
        fs::read_dir(pred_dir).with_context(|| format!("failed to list {}", pred_dir.display()))?
    {
        let path = entry?.path();
        let is_nifti = path
            .file_name()
            .and_then(|s| s.to_str())
            .map(|name| !name.starts_with('.') && name.contains(NIFTI_SUFFIX))
            .unwrap_or(false);
        if is_nifti && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn ground_truth_path(
    run_dir: &Path,
    cohort_dir: &str,
    case_id: &str,
    gt_dir: &str,
    file_name: &str,
) -> PathBuf {
    run_dir
        .join(cohort_dir)
        .join(case_id)
        .join(gt_dir)
        .join(file_name)
}

pub fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .with_context(|| format!("invalid file name: {}", path.display()))
}
