//! Conversion between the stored comma-delimited label column and label lists.

use std::collections::HashSet;

pub const DELIMITER: char = ',';

/// Case folding shared by label comparison and the stored filter columns.
pub fn fold(value: &str) -> String {
    value.to_lowercase()
}

/// Trims every label, drops blanks and removes case-insensitive duplicates,
/// keeping the first spelling seen.
pub fn normalize<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for label in labels {
        let trimmed = label.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(fold(trimmed)) {
            result.push(trimmed.to_string());
        }
    }
    result
}

/// Returns `None` when no label survives normalization.
pub fn encode<I, S>(labels: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let normalized = normalize(labels);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.join(&DELIMITER.to_string()))
    }
}

pub fn decode(stored: Option<&str>) -> Vec<String> {
    match stored {
        Some(value) if !value.trim().is_empty() => normalize(value.split(DELIMITER)),
        _ => Vec::new(),
    }
}
