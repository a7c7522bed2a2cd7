use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

pub mod labels;
pub mod tables;

pub use labels::resolve_label_name;
pub use tables::ScoreTables;

pub const ENSEMBLE_MODEL_ID: &str = "ensemble";

/// Dice score as written to the result tables.
///
/// Non-finite values are emitted as strings since JSON has no encoding for them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score(pub f64);

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_str(&self.0.to_string())
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub file_id: String,
    pub model_id: String,
    pub label: String,
    pub score: Score,
}

type CellKey = (String, String, String);

/// Flat list of score records for one run.
///
/// A `(file_id, label, model_id)` cell holds at most one record; pushing the
/// same cell again replaces the earlier score.
#[derive(Debug, Default)]
pub struct Evaluation {
    records: Vec<ScoreRecord>,
    cells: HashMap<CellKey, usize>,
    pub processed_files: usize,
}

impl Evaluation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ScoreRecord) {
        let key = (
            record.file_id.clone(),
            record.label.clone(),
            record.model_id.clone(),
        );
        match self.cells.get(&key) {
            Some(&idx) => self.records[idx] = record,
            None => {
                self.cells.insert(key, self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn has_score(&self, file_id: &str, label: &str, model_id: &str) -> bool {
        self.cells.contains_key(&(
            file_id.to_string(),
            label.to_string(),
            model_id.to_string(),
        ))
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tables(&self) -> ScoreTables {
        ScoreTables::from_records(&self.records)
    }
}
