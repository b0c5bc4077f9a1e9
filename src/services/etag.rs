//! Weak entity tags derived from an item's last modification time.

use chrono::{DateTime, Duration, SubsecRound, Utc};

use crate::db::entities::todo_item;

pub fn for_item(item: &todo_item::Model) -> String {
    for_timestamp(item.last_modified())
}

pub fn for_timestamp(timestamp: DateTime<Utc>) -> String {
    format!("W/\"{}\"", timestamp.timestamp_millis())
}

/// Compares a presented `If-Match` / `If-None-Match` value against the current
/// tag using weak comparison. A header may list several tags; `*` matches any
/// existing item.
pub fn matches(presented: &str, current: &str) -> bool {
    let current = opaque(current);
    presented
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .any(|candidate| candidate == "*" || opaque(candidate) == current)
}

fn opaque(tag: &str) -> &str {
    tag.trim().strip_prefix("W/").unwrap_or(tag.trim())
}

/// Storage resolution for every timestamp the service writes.
pub fn truncate(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(3)
}

/// The `updated_at` value for a mutation of an item last modified at
/// `previous`. Always at least one millisecond later so the tag changes.
pub fn next_modified_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = truncate(now);
    let floor = truncate(previous) + Duration::milliseconds(1);
    if now < floor { floor } else { now }
}
