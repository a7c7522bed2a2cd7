//! Fatal evaluation conditions.
//!
//! Stages return `anyhow::Result`; these variants stay reachable through
//! `anyhow::Error::downcast_ref::<EvalError>()` so callers and tests can tell
//! them apart from plain I/O failures.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("ground truth not found: {0}")]
    MissingGroundTruth(PathBuf),

    #[error("no background label 0 in volume: {0}")]
    MissingBackground(PathBuf),

    #[error("shape mismatch: pred {pred:?} vs gt {gt:?}")]
    ShapeMismatch { pred: Vec<usize>, gt: Vec<usize> },

    #[error("'{0}' is not a case file name (expected <case_id>.nii or <case_id>.nii.gz)")]
    InvalidCaseFileName(String),

    #[error("ensemble prediction dir not found: {0}")]
    MissingEnsembleDir(PathBuf),

    #[error("ensemble prediction not found: {0}")]
    MissingEnsemblePrediction(PathBuf),

    #[error("no files have been processed")]
    NoFilesProcessed,

    #[error("dimension check failed for {0}")]
    DimensionMismatch(PathBuf),
}
