use serde::Serialize;

use crate::schema::v1::{CaseTable, ModelTable};
use crate::scores::ScoreRecord;

/// Case-based and model-based views over the same score records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoreTables {
    pub case_based: CaseTable,
    pub model_based: ModelTable,
}

impl ScoreTables {
    pub fn from_records(records: &[ScoreRecord]) -> Self {
        records.iter().fold(Self::default(), |mut tables, r| {
            tables
                .case_based
                .entry(r.file_id.clone())
                .or_default()
                .entry(r.label.clone())
                .or_default()
                .insert(r.model_id.clone(), r.score);
            tables
                .model_based
                .entry(r.model_id.clone())
                .or_default()
                .entry(r.label.clone())
                .or_default()
                .insert(r.file_id.clone(), r.score);
            tables
        })
    }

    pub fn case_cells(&self) -> usize {
        self.case_based
            .values()
            .flat_map(|labels| labels.values())
            .map(|models| models.len())
            .sum()
    }

    pub fn model_cells(&self) -> usize {
        self.model_based
            .values()
            .flat_map(|labels| labels.values())
            .map(|cases| cases.len())
            .sum()
    }
}
