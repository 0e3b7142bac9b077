//! SDP Items
//!
//! The uniform item model every adapter produces, and the linked-item queries
//! that describe graph edges between items.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Attribute key under which the unique attribute value is stored
pub const UNIQUE_ATTRIBUTE_KEY: &str = "uniqueAttr";

/// SDP item type identifier, e.g. `gcp-compute-network`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemType(&'static str);

impl ItemType {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Human readable name, `gcp-compute-network` -> `GCP Compute Network`
    pub fn descriptive_name(&self) -> String {
        self.0
            .split('-')
            .map(|word| match word {
                "gcp" | "iam" | "kms" | "sql" | "ip" | "dns" => word.to_uppercase(),
                _ => {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                },
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Query method of an SDP query
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryMethod {
    Get,
    List,
    Search,
}

impl fmt::Display for QueryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryMethod::Get => f.write_str("GET"),
            QueryMethod::List => f.write_str("LIST"),
            QueryMethod::Search => f.write_str("SEARCH"),
        }
    }
}

/// Direction of change propagation along a link
///
/// `in_` means changes to the linked item affect this item, `out` means
/// changes to this item affect the linked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct BlastPropagation {
    #[serde(rename = "in")]
    pub in_: bool,
    pub out: bool,
}

impl BlastPropagation {
    pub const fn new(in_: bool, out: bool) -> Self {
        Self { in_, out }
    }

    /// Both directions
    pub const fn both() -> Self {
        Self::new(true, true)
    }

    /// Only changes to the target affect the source
    pub const fn inbound() -> Self {
        Self::new(true, false)
    }

    /// Only changes to the source affect the target
    pub const fn outbound() -> Self {
        Self::new(false, true)
    }

    /// Documented non-link
    pub const fn none() -> Self {
        Self::new(false, false)
    }

    pub fn is_none(&self) -> bool {
        !self.in_ && !self.out
    }
}

/// A request for another item, emitted while walking an item's attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedItemQuery {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub method: QueryMethod,
    pub query: String,
    pub scope: String,
    pub blast_propagation: BlastPropagation,
}

/// A discovered resource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub unique_attribute: &'static str,
    pub scope: String,
    pub attributes: Value,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    pub linked_item_queries: Vec<LinkedItemQuery>,
}

impl Item {
    pub fn new(item_type: ItemType, scope: String, attributes: Value) -> Self {
        Self {
            item_type,
            unique_attribute: UNIQUE_ATTRIBUTE_KEY,
            scope,
            attributes,
            tags: BTreeMap::new(),
            linked_item_queries: Vec::new(),
        }
    }

    /// Value of the unique attribute
    pub fn unique_attribute_value(&self) -> &str {
        self.attributes
            .get(self.unique_attribute)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Globally unique name: `type.uniqueValue.scope`
    pub fn globally_unique_name(&self) -> String {
        format!(
            "{}.{}.{}",
            self.item_type,
            self.unique_attribute_value(),
            self.scope
        )
    }

    /// Look up an attribute by dotted path
    pub fn attribute(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.attributes, |node, part| node.get(part))
    }

    /// Append a linked query unless an identical one is already present
    pub fn add_linked_item_query(&mut self, query: LinkedItemQuery) {
        if !self.linked_item_queries.contains(&query) {
            self.linked_item_queries.push(query);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptive_name() {
        assert_eq!(
            ItemType::new("gcp-compute-network").descriptive_name(),
            "GCP Compute Network"
        );
        assert_eq!(
            ItemType::new("gcp-cloud-kms-crypto-key").descriptive_name(),
            "GCP Cloud KMS Crypto Key"
        );
    }

    #[test]
    fn test_unique_attribute_and_lookup() {
        let item = Item::new(
            ItemType::new("gcp-compute-network"),
            "my-project".to_string(),
            json!({"uniqueAttr": "default", "routingConfig": {"routingMode": "REGIONAL"}}),
        );
        assert_eq!(item.unique_attribute_value(), "default");
        assert_eq!(
            item.attribute("routingConfig.routingMode"),
            Some(&json!("REGIONAL"))
        );
        assert_eq!(
            item.globally_unique_name(),
            "gcp-compute-network.default.my-project"
        );
    }

    #[test]
    fn test_duplicate_links_are_collapsed() {
        let mut item = Item::new(ItemType::new("t"), "p".to_string(), json!({}));
        let link = LinkedItemQuery {
            item_type: ItemType::new("ip"),
            method: QueryMethod::Get,
            query: "10.0.0.1".to_string(),
            scope: "global".to_string(),
            blast_propagation: BlastPropagation::both(),
        };
        item.add_linked_item_query(link.clone());
        item.add_linked_item_query(link);
        assert_eq!(item.linked_item_queries.len(), 1);
    }

    #[test]
    fn test_blast_propagation_serializes_in_key() {
        let value = serde_json::to_value(BlastPropagation::inbound()).unwrap();
        assert_eq!(value, json!({"in": true, "out": false}));
    }
}
