use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scores::Score;

/// Label value -> display name.
pub type LabelMap = BTreeMap<i64, String>;

/// `file_id -> label -> model_id -> score`
pub type CaseTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, Score>>>;

/// `model_id -> label -> file_id -> score`
pub type ModelTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, Score>>>;

/// Prediction sidecar written next to the segmentations (`seg_info.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegInfo {
    pub task_id: String,
    pub seg_info: Vec<SegInfoLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegInfoLabel {
    pub label_int: LabelValue,
    pub label_name: String,
}

/// Some exporters write `label_int` as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    Int(i64),
    Text(String),
}

impl LabelValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            LabelValue::Int(v) => Some(*v),
            LabelValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Model export description (`model-exports/**/dataset.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetJson {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}
