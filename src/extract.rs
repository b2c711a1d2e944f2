//! Optional-chaining accessors for GraphQL response trees
//!
//! Every upstream field is nullable: GitHub returns partial data alongside
//! embedded errors, and nested objects (README blob, linked user account)
//! are frequently absent. All field reads go through these helpers so that
//! a missing or null node resolves to `None` instead of a panic.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Walk `path` key by key, returning `None` as soon as a key is missing or
/// the node at the end of the path is JSON `null`.
pub fn get<'a>(node: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = node;
    for key in path {
        current = current.get(key)?;
    }
    if current.is_null() { None } else { Some(current) }
}

/// String at `path`, or `None` if absent, null, or not a string.
pub fn get_str<'a>(node: &'a Value, path: &[&str]) -> Option<&'a str> {
    get(node, path)?.as_str()
}

/// Unsigned integer at `path`. GitHub counts (forks, stars, additions) all
/// fit comfortably in `u32`.
pub fn get_u32(node: &Value, path: &[&str]) -> Option<u32> {
    get(node, path)?.as_u64().and_then(|v| u32::try_from(v).ok())
}

/// Boolean at `path`.
pub fn get_bool(node: &Value, path: &[&str]) -> Option<bool> {
    get(node, path)?.as_bool()
}

/// RFC 3339 timestamp at `path`, parsed to UTC. Unparseable values resolve
/// to `None` like any other absent field.
pub fn get_datetime(node: &Value, path: &[&str]) -> Option<DateTime<Utc>> {
    let raw = get_str(node, path)?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
