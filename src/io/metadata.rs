use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::schema::v1::{DatasetJson, LabelMap, SegInfo};

pub const SEG_INFO_FILE: &str = "seg_info.json";
pub const DATASET_FILE: &str = "dataset.json";
pub const MODEL_EXPORTS_DIR: &str = "model-exports";
pub const UNKNOWN_MODEL_ID: &str = "unknown";

/// Identity of one model run as far as it could be discovered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelInfo {
    pub labels: Option<LabelMap>,
    pub model_id: Option<String>,
}

/// Files named `file_name` anywhere below `root`, sorted.
pub fn find_files(root: &Path, file_name: &str) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name().to_str() == Some(file_name))
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    found
}

fn single_match(root: &Path, file_name: &str) -> Option<PathBuf> {
    let mut found = find_files(root, file_name);
    match found.len() {
        1 => found.pop(),
        0 => {
            warn!(root = %root.display(), file = file_name, "metadata not found");
            None
        }
        n => {
            warn!(root = %root.display(), file = file_name, found = n, "metadata ambiguous");
            None
        }
    }
}

/// Labels and task id from the unique `seg_info.json` below `pred_dir`.
pub fn pred_infos(pred_dir: &Path) -> Result<Option<ModelInfo>> {
    let Some(path) = single_match(pred_dir, SEG_INFO_FILE) else {
        return Ok(None);
    };
    let seg_info: SegInfo = read_json(&path)?;

    let mut labels = LabelMap::new();
    for entry in &seg_info.seg_info {
        match entry.label_int.as_int() {
            Some(value) => {
                labels.insert(value, entry.label_name.clone());
            }
            None => warn!(
                path = %path.display(),
                label = %entry.label_name,
                "skipping seg_info entry with non-integer label_int"
            ),
        }
    }

    info!(path = %path.display(), task_id = %seg_info.task_id, labels = labels.len(), "seg_info_loaded");
    Ok(Some(ModelInfo {
        labels: Some(labels),
        model_id: Some(seg_info.task_id),
    }))
}

/// Labels and model name from the unique `model-exports/**/dataset.json`.
pub fn model_infos(batch_element_dir: &Path) -> Result<Option<ModelInfo>> {
    let exports = batch_element_dir.join(MODEL_EXPORTS_DIR);
    let Some(path) = single_match(&exports, DATASET_FILE) else {
        return Ok(None);
    };
    let dataset: DatasetJson = read_json(&path)?;

    let mut labels = LabelMap::new();
    for (key, name) in &dataset.labels {
        match key.trim().parse::<i64>() {
            Ok(value) => {
                labels.insert(value, name.clone());
            }
            Err(_) => warn!(path = %path.display(), key = %key, "skipping non-integer label key"),
        }
    }

    info!(path = %path.display(), name = %dataset.name, labels = labels.len(), "dataset_json_loaded");
    Ok(Some(ModelInfo {
        labels: Some(labels),
        model_id: Some(dataset.name),
    }))
}

/// Sidecar metadata first, model export second, unknown otherwise.
pub fn resolve_model_info(batch_element_dir: &Path, pred_dir: &Path) -> Result<ModelInfo> {
    if let Some(info) = pred_infos(pred_dir)? {
        return Ok(info);
    }
    if let Some(info) = model_infos(batch_element_dir)? {
        return Ok(info);
    }
    warn!(
        batch_element = %batch_element_dir.display(),
        "no model metadata; labels and model id unknown"
    );
    Ok(ModelInfo::default())
}

/// `<discovered id>_<counter>`; `unknown_<counter>` when nothing was discovered.
pub fn qualified_model_id(model_id: Option<&str>, counter: usize) -> String {
    format!("{}_{}", model_id.unwrap_or(UNKNOWN_MODEL_ID), counter)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}
