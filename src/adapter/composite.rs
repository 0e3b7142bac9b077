//! Composite lookup keys and resource path helpers
//!
//! Most GCP resources are addressed by more than one path segment
//! (`location|keyRing|cryptoKey`). A [`CompositeKey`] carries those segments
//! in order and owns the join/split contract with the `|` delimiter.

use crate::sdp::AdapterError;
use std::fmt;

/// Delimiter between segments of a composite query
pub const QUERY_SEPARATOR: char = '|';

/// Ordered, non-empty segments of a lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey(Vec<String>);

impl CompositeKey {
    /// Build a key from segments
    ///
    /// Segments must be non-empty and must not contain the delimiter,
    /// otherwise the joined form could not be split back.
    pub fn new<I, S>(segments: I) -> Result<Self, AdapterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(AdapterError::invalid_query("", "composite key has no segments"));
        }
        for segment in &segments {
            if segment.is_empty() {
                return Err(AdapterError::invalid_query(
                    &segments.join("|"),
                    "composite key has an empty segment",
                ));
            }
            if segment.contains(QUERY_SEPARATOR) {
                return Err(AdapterError::invalid_query(
                    segment,
                    format!("segment contains the {:?} delimiter", QUERY_SEPARATOR),
                ));
            }
        }
        Ok(Self(segments))
    }

    /// Split a query into exactly `expected` segments
    pub fn parse_exact(query: &str, expected: usize) -> Result<Self, AdapterError> {
        let segments: Vec<&str> = query.split(QUERY_SEPARATOR).collect();
        if segments.len() != expected {
            return Err(AdapterError::invalid_query(
                query,
                format!(
                    "expected {} segment(s) separated by {:?}, got {}",
                    expected,
                    QUERY_SEPARATOR,
                    segments.len()
                ),
            ));
        }
        Self::new(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Joined query form
    pub fn join(&self) -> String {
        self.0.join("|")
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

/// Non-empty path segments of a resource name or URL
///
/// Scheme, query string and fragment are dropped; the host, if any, stays as
/// a leading segment which never matches a collection name.
pub fn path_segments(value: &str) -> Vec<&str> {
    let value = value
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(value);
    let value = value.split(['?', '#']).next().unwrap_or_default();
    value.split('/').filter(|s| !s.is_empty()).collect()
}

/// Value following `key` in a resource path
///
/// `extract_path_param("projects/p/zones/z/disks/d", "zones") == Some("z")`
pub fn extract_path_param<'a>(value: &'a str, key: &str) -> Option<&'a str> {
    let segments = path_segments(value);
    segments
        .windows(2)
        .find(|pair| pair[0] == key)
        .map(|pair| pair[1])
}

/// Values following each of `keys`, in order
///
/// Matching stops at the first key that is missing, so the result is the
/// longest resolvable prefix of `keys`.
pub fn extract_path_params(value: &str, keys: &[&str]) -> Vec<String> {
    let segments = path_segments(value);
    let mut values = Vec::with_capacity(keys.len());
    let mut from = 0;

    for key in keys {
        let found = segments[from..]
            .windows(2)
            .position(|pair| pair[0] == *key);
        match found {
            Some(offset) => {
                let index = from + offset;
                values.push(segments[index + 1].to_string());
                from = index + 2;
            },
            None => break,
        }
    }

    values
}

/// Last `count` values of a `collection/value/...` path
///
/// Used when a full resource name is in a layout the collection names do not
/// describe, e.g. Terraform IDs.
pub fn extract_trailing_values(value: &str, count: usize) -> Option<Vec<String>> {
    let segments = path_segments(value);
    if count == 0 || segments.len() < count * 2 {
        return None;
    }
    let values: Vec<String> = segments
        .iter()
        .rev()
        .step_by(2)
        .take(count)
        .map(|s| s.to_string())
        .collect();
    Some(values.into_iter().rev().collect())
}

/// Final component of a resource name or URL
pub fn last_path_component(value: &str) -> &str {
    path_segments(value).last().copied().unwrap_or(value)
}
