//! Field path walker
//!
//! Follows dotted field paths (`networkInterfaces.accessConfigs.natIP`)
//! through an attribute tree. Arrays are fanned out at any segment, so one
//! path reaches every element without per-index configuration.

use super::meta::{BlastPropagationMap, Impact};
use serde_json::Value;

/// One value reached by a configured path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch<'a> {
    pub field_path: &'static str,
    pub impact: &'a Impact,
    pub value: String,
}

/// Scalar values at the end of `field_path`, in document order
///
/// Strings and numbers are leaf values. A missing key, a null or an object at
/// the end of the path produces nothing.
pub fn leaf_values(attributes: &Value, field_path: &str) -> Vec<String> {
    let segments: Vec<&str> = field_path.split('.').filter(|s| !s.is_empty()).collect();
    let mut out = Vec::new();
    if !segments.is_empty() {
        collect(attributes, &segments, &mut out);
    }
    out
}

fn collect(node: &Value, segments: &[&str], out: &mut Vec<String>) {
    match node {
        Value::Array(elements) => {
            for element in elements {
                collect(element, segments, out);
            }
        },
        Value::Object(map) => {
            if let Some((head, rest)) = segments.split_first() {
                if let Some(child) = map.get(*head) {
                    collect(child, rest, out);
                }
            }
        },
        Value::String(s) if segments.is_empty() => {
            if !s.is_empty() {
                out.push(s.clone());
            }
        },
        Value::Number(n) if segments.is_empty() => out.push(n.to_string()),
        _ => {},
    }
}

/// Every (path, value) pair a blast-propagation map reaches
///
/// Paths are visited in map order, values in document order.
pub fn walk<'a>(attributes: &Value, impacts: &'a BlastPropagationMap) -> Vec<PathMatch<'a>> {
    impacts
        .iter()
        .flat_map(|(field_path, impact)| {
            leaf_values(attributes, field_path)
                .into_iter()
                .map(move |value| PathMatch {
                    field_path: *field_path,
                    impact,
                    value,
                })
        })
        .collect()
}
