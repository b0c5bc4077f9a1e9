//! Field-level validation of todo item drafts.
//!
//! Every rule is checked independently and all failures are reported
//! together, keyed by the wire name of the field.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::db::models::TodoDraft;
use crate::services::label_codec;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
pub const MAX_LABELS: usize = 50;
pub const MAX_LABEL_CHARS: usize = 50;

/// Clock-skew tolerance for due dates slightly in the past.
pub fn due_at_tolerance() -> Duration {
    Duration::minutes(1)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

pub fn validate(draft: &TodoDraft, now: DateTime<Utc>) -> ValidationErrors {
    check(draft, now, true)
}

/// Validation for a patched item: a due date the patch left untouched is not
/// re-checked against the clock.
pub fn validate_patched(
    draft: &TodoDraft,
    now: DateTime<Utc>,
    original_due_at: Option<DateTime<Utc>>,
) -> ValidationErrors {
    check(draft, now, draft.due_at != original_due_at)
}

fn check(draft: &TodoDraft, now: DateTime<Utc>, check_due_at: bool) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let title = draft.title.trim();
    if title.is_empty() {
        errors.add("title", "Title is required.");
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        errors.add(
            "title",
            format!("Title must be at most {MAX_TITLE_CHARS} characters."),
        );
    }

    if let Some(description) = &draft.description {
        if description.trim().chars().count() > MAX_DESCRIPTION_CHARS {
            errors.add(
                "description",
                format!("Description must be at most {MAX_DESCRIPTION_CHARS} characters."),
            );
        }
    }

    if check_due_at {
        if let Some(due_at) = draft.due_at {
            if due_at < now - due_at_tolerance() {
                errors.add("dueAt", "Due date cannot be in the past.");
            }
        }
    }

    if draft
        .labels
        .iter()
        .any(|label| label.contains(label_codec::DELIMITER))
    {
        errors.add(
            "labels",
            format!("Labels must not contain '{}'.", label_codec::DELIMITER),
        );
    }
    let labels = label_codec::normalize(&draft.labels);
    if labels.len() > MAX_LABELS {
        errors.add(
            "labels",
            format!("A maximum of {MAX_LABELS} labels is allowed."),
        );
    }
    if labels
        .iter()
        .any(|label| label.chars().count() > MAX_LABEL_CHARS)
    {
        errors.add(
            "labels",
            format!("Each label must be at most {MAX_LABEL_CHARS} characters."),
        );
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid_draft() -> TodoDraft {
        TodoDraft {
            title: "Buy milk".to_string(),
            description: Some("Two litres".to_string()),
            labels: vec!["home".to_string(), "errands".to_string()],
            ..TodoDraft::default()
        }
    }

    #[test]
    fn valid_draft_has_no_errors() {
        assert!(validate(&valid_draft(), Utc::now()).is_empty());
    }

    #[rstest]
    #[case::blank_title(TodoDraft { title: "   ".into(), ..valid_draft() }, "title")]
    #[case::long_title(TodoDraft { title: "x".repeat(201), ..valid_draft() }, "title")]
    #[case::long_description(
        TodoDraft { description: Some("d".repeat(2001)), ..valid_draft() },
        "description"
    )]
    #[case::too_many_labels(
        TodoDraft { labels: (0..51).map(|i| format!("l{i}")).collect(), ..valid_draft() },
        "labels"
    )]
    #[case::long_label(TodoDraft { labels: vec!["y".repeat(51)], ..valid_draft() }, "labels")]
    #[case::delimiter_in_label(TodoDraft { labels: vec!["a,b".into()], ..valid_draft() }, "labels")]
    fn each_rule_reports_its_field(#[case] draft: TodoDraft, #[case] field: &str) {
        let errors = validate(&draft, Utc::now());
        assert!(errors.contains(field), "expected error on {field}: {errors:?}");
        assert_eq!(errors.0.len(), 1, "only {field} should fail: {errors:?}");
    }

    #[test]
    fn boundary_lengths_are_accepted() {
        let draft = TodoDraft {
            title: "t".repeat(200),
            description: Some("d".repeat(2000)),
            labels: (0..50).map(|i| format!("{i:0>50}")).collect(),
            ..valid_draft()
        };
        assert!(validate(&draft, Utc::now()).is_empty());
    }

    #[test]
    fn duplicate_labels_count_once() {
        let mut labels: Vec<String> = (0..50).map(|i| format!("l{i}")).collect();
        labels.extend((0..50).map(|i| format!("L{i}")));
        let draft = TodoDraft { labels, ..valid_draft() };
        assert!(validate(&draft, Utc::now()).is_empty());
    }

    #[test]
    fn due_at_respects_clock_skew_tolerance() {
        let now = Utc::now();
        let two_minutes_ago = TodoDraft {
            due_at: Some(now - Duration::minutes(2)),
            ..valid_draft()
        };
        let thirty_seconds_ago = TodoDraft {
            due_at: Some(now - Duration::seconds(30)),
            ..valid_draft()
        };
        assert!(validate(&two_minutes_ago, now).contains("dueAt"));
        assert!(validate(&thirty_seconds_ago, now).is_empty());
    }

    #[test]
    fn errors_accumulate_across_fields() {
        let draft = TodoDraft {
            title: String::new(),
            description: Some("d".repeat(2001)),
            due_at: Some(Utc::now() - Duration::days(1)),
            labels: vec!["z".repeat(60)],
            ..TodoDraft::default()
        };
        let errors = validate(&draft, Utc::now());
        for field in ["title", "description", "dueAt", "labels"] {
            assert!(errors.contains(field), "missing {field}");
        }
    }

    #[test]
    fn title_length_is_measured_after_trimming() {
        let draft = TodoDraft {
            title: format!("  {}  ", "a".repeat(200)),
            ..valid_draft()
        };
        assert!(validate(&draft, Utc::now()).is_empty());
    }

    #[test]
    fn patched_item_keeps_untouched_past_due_date() {
        let now = Utc::now();
        let past = Some(now - Duration::days(3));
        let draft = TodoDraft { due_at: past, ..valid_draft() };
        assert!(validate_patched(&draft, now, past).is_empty());
        assert!(validate_patched(&draft, now, None).contains("dueAt"));
    }
}
