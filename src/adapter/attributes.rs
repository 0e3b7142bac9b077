//! Attribute tree builder
//!
//! Turns one decoded resource into an [`Item`]: applies the per-type
//! extractor, normalizes object keys to camelCase, moves `labels` into tags
//! and resolves the unique attribute value.

use super::composite::{extract_path_params, CompositeKey};
use super::meta::AdapterMeta;
use crate::gcp::location::LocationInfo;
use crate::sdp::item::UNIQUE_ATTRIBUTE_KEY;
use crate::sdp::{AdapterError, Item, ItemType};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Maps whose keys are chosen by users and must be kept verbatim
const USER_KEYED_MAPS: &[&str] = &["labels", "resourceLabels", "userLabels", "annotations"];

const LABELS_FIELD: &str = "labels";

/// Build an item from one raw resource
pub fn build_item(
    item_type: ItemType,
    meta: &AdapterMeta,
    location: &LocationInfo,
    raw: Value,
) -> Result<Item, AdapterError> {
    let raw = match meta.extractor {
        Some(extract) => extract(location, raw)?,
        None => raw,
    };

    let Value::Object(mut attributes) = normalize_keys(raw) else {
        return Err(AdapterError::UniqueAttribute {
            item_type: item_type.to_string(),
            reason: "resource is not a JSON object".to_string(),
        });
    };

    let tags = take_labels(&mut attributes);
    let mut attributes = Value::Object(attributes);
    let unique = unique_attribute_value(item_type, meta, &attributes)?;
    if let Some(map) = attributes.as_object_mut() {
        map.insert(UNIQUE_ATTRIBUTE_KEY.to_string(), Value::String(unique));
    }

    let mut item = Item::new(item_type, location.scope(), attributes);
    item.tags = tags;
    Ok(item)
}

/// `ip_cidr_range` -> `ipCidrRange`; other keys are returned unchanged
pub fn snake_to_camel(key: &str) -> String {
    let convertible = key.contains('_')
        && !key.starts_with('_')
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !convertible {
        return key.to_string();
    }

    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Normalize every object key of a tree to camelCase
///
/// Keys inside user-keyed maps (labels, annotations) are left alone.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let normalized: Map<String, Value> = map
                .into_iter()
                .map(|(key, child)| {
                    let key = snake_to_camel(&key);
                    let child = if USER_KEYED_MAPS.contains(&key.as_str()) {
                        child
                    } else {
                        normalize_keys(child)
                    };
                    (key, child)
                })
                .collect();
            Value::Object(normalized)
        },
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

fn take_labels(attributes: &mut Map<String, Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(labels)) = attributes.remove(LABELS_FIELD) else {
        return BTreeMap::new();
    };

    labels
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

fn string_at<'a>(attributes: &'a Value, path: &str) -> Option<&'a str> {
    path.split('.')
        .try_fold(attributes, |node, part| node.get(part))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Resolve the unique attribute from the first identity field that carries it
///
/// A full resource name yields one value per unique-attribute key, joined as
/// a composite key. A bare value is accepted for single-key types.
pub fn unique_attribute_value(
    item_type: ItemType,
    meta: &AdapterMeta,
    attributes: &Value,
) -> Result<String, AdapterError> {
    let keys = &meta.unique_attribute_keys;

    for field in &meta.identity_fields {
        let Some(value) = string_at(attributes, field) else {
            continue;
        };

        if !value.contains('/') {
            if keys.len() == 1 {
                return Ok(value.to_string());
            }
            continue;
        }

        let params = extract_path_params(value, keys);
        if params.len() == keys.len() {
            if let Ok(key) = CompositeKey::new(params) {
                return Ok(key.join());
            }
        }
    }

    Err(AdapterError::UniqueAttribute {
        item_type: item_type.to_string(),
        reason: format!(
            "none of {:?} holds a value for {:?}",
            meta.identity_fields, keys
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::endpoint::{
        project_level_endpoint_func_with_three_queries, project_level_endpoint_func_with_single_query,
    };
    use crate::adapter::meta::AdapterCategory;
    use crate::gcp::location::LocationLevel;
    use serde_json::json;

    fn network_meta() -> AdapterMeta {
        AdapterMeta::new(
            AdapterCategory::Network,
            LocationLevel::Project,
            project_level_endpoint_func_with_single_query(
                "https://compute.googleapis.com/compute/v1/projects/%s/global/networks/%s",
            ),
            &["networks"],
        )
    }

    fn crypto_key_meta() -> AdapterMeta {
        AdapterMeta::new(
            AdapterCategory::Security,
            LocationLevel::Project,
            project_level_endpoint_func_with_three_queries(
                "https://cloudkms.googleapis.com/v1/projects/%s/locations/%s/keyRings/%s/cryptoKeys/%s",
            ),
            &["locations", "keyRings", "cryptoKeys"],
        )
    }

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("ip_cidr_range"), "ipCidrRange");
        assert_eq!(snake_to_camel("ipCidrRange"), "ipCidrRange");
        assert_eq!(snake_to_camel("_private"), "_private");
        assert_eq!(snake_to_camel("kms_key_name_2"), "kmsKeyName2");
        assert_eq!(snake_to_camel("Team_Name"), "Team_Name");
    }

    #[test]
    fn test_normalize_keeps_label_keys() {
        let value = normalize_keys(json!({
            "self_link": "x",
            "network_interfaces": [{"access_configs": [{"nat_ip": "1.2.3.4"}]}],
            "labels": {"cost_center": "eng"}
        }));
        assert_eq!(value["selfLink"], json!("x"));
        assert_eq!(value["networkInterfaces"][0]["accessConfigs"][0]["natIp"], json!("1.2.3.4"));
        assert_eq!(value["labels"]["cost_center"], json!("eng"));
    }

    #[test]
    fn test_build_item_moves_labels_to_tags() {
        let item = build_item(
            ItemType::new("gcp-compute-network"),
            &network_meta(),
            &LocationInfo::project("p"),
            json!({"name": "default", "labels": {"env": "prod"}}),
        )
        .unwrap();

        assert_eq!(item.unique_attribute_value(), "default");
        assert_eq!(item.scope, "p");
        assert_eq!(item.tags.get("env").map(String::as_str), Some("prod"));
        assert!(item.attribute("labels").is_none());
    }

    #[test]
    fn test_unique_attribute_from_full_name() {
        let attributes = json!({"name": "projects/p/locations/global/keyRings/ring/cryptoKeys/key"});
        assert_eq!(
            unique_attribute_value(ItemType::new("k"), &crypto_key_meta(), &attributes).unwrap(),
            "global|ring|key"
        );
    }

    #[test]
    fn test_unique_attribute_falls_back_to_next_identity_field() {
        let attributes = json!({
            "id": "123",
            "selfLink": "https://compute.googleapis.com/compute/v1/projects/p/global/networks/vpc"
        });
        assert_eq!(
            unique_attribute_value(ItemType::new("n"), &network_meta(), &attributes).unwrap(),
            "vpc"
        );
    }

    #[test]
    fn test_unique_attribute_missing_is_error() {
        let err = unique_attribute_value(ItemType::new("k"), &crypto_key_meta(), &json!({"name": "key"}))
            .unwrap_err();
        assert!(matches!(err, AdapterError::UniqueAttribute { .. }));
    }

    #[test]
    fn test_extractor_runs_first() {
        fn wrap(_location: &LocationInfo, raw: Value) -> Result<Value, AdapterError> {
            Ok(json!({"name": raw["resource"]["id"].clone()}))
        }

        let meta = network_meta().extractor(wrap);
        let item = build_item(
            ItemType::new("gcp-compute-network"),
            &meta,
            &LocationInfo::project("p"),
            json!({"resource": {"id": "wrapped"}}),
        )
        .unwrap();
        assert_eq!(item.unique_attribute_value(), "wrapped");
    }
}
