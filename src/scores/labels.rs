use crate::schema::v1::LabelMap;

/// Display name for a predicted label.
///
/// Without a dictionary the raw value is its own name. With a dictionary
/// that lacks the value the label is skipped (`None`).
pub fn resolve_label_name(labels: Option<&LabelMap>, label: i64) -> Option<String> {
    match labels {
        Some(map) => map.get(&label).cloned(),
        None => Some(label.to_string()),
    }
}
