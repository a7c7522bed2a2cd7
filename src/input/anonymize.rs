use std::collections::HashMap;

/// Replaces raw case ids with `case_<n>`, numbered from 1 in first-seen order.
#[derive(Debug, Default)]
pub struct CaseAnonymizer {
    lookup: HashMap<String, String>,
}

impl CaseAnonymizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anonymize(&mut self, case_id: &str) -> String {
        if let Some(existing) = self.lookup.get(case_id) {
            return existing.clone();
        }
        let alias = format!("case_{}", self.lookup.len() + 1);
        self.lookup.insert(case_id.to_string(), alias.clone());
        alias
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}
