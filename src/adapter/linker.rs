//! Blast-propagation linker
//!
//! Turns the values reached by the path walker into linked item queries.
//! Network addresses, service accounts, storage buckets and compute images
//! have their own value transforms; every other target is resolved from its registered
//! declaration by extracting the target's unique-attribute keys from the
//! value and inferring the target scope from the value or the source.
//!
//! A value that cannot be resolved produces a [`LinkWarning`] and never fails
//! the query that fetched the item.

use super::composite::{extract_path_param, extract_path_params, CompositeKey};
use super::meta::{BlastPropagationMap, Impact};
use super::registry::Registry;
use super::walker::walk;
use crate::gcp::location::{LocationInfo, LocationLevel};
use crate::sdp::types;
use crate::sdp::{AdapterError, Item, ItemType, LinkWarning, LinkedItemQuery, QueryMethod};
use std::net::IpAddr;
use std::sync::Arc;

/// Scope of the generic `ip` and `dns` types
pub const GLOBAL_SCOPE: &str = "global";

const SERVICE_ACCOUNT_PREFIX: &str = "serviceAccount:";
const SERVICE_ACCOUNT_DOMAIN: &str = ".iam.gserviceaccount.com";

/// Resolved link target, before blast propagation is attached
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    item_type: ItemType,
    method: QueryMethod,
    query: String,
    scope: String,
}

type ValueTransform = fn(&str, &LocationInfo) -> Result<Target, String>;

fn manual_transform(item_type: ItemType) -> Option<ValueTransform> {
    match item_type {
        types::NETWORK_IP | types::NETWORK_DNS => Some(network_target),
        types::IAM_SERVICE_ACCOUNT => Some(service_account_target),
        types::STORAGE_BUCKET => Some(bucket_target),
        types::COMPUTE_IMAGE => Some(image_target),
        _ => None,
    }
}

/// A blast-propagation target nobody can resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingLink {
    pub source: ItemType,
    pub field_path: &'static str,
    pub target: ItemType,
}

/// Resolves link values against the registry
#[derive(Debug, Clone)]
pub struct Linker {
    registry: Arc<Registry>,
}

impl Linker {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Walk an item and attach its linked item queries
    ///
    /// Identical queries are attached once. Returns the values that could
    /// not be resolved.
    pub fn link(
        &self,
        item: &mut Item,
        impacts: &BlastPropagationMap,
        source: &LocationInfo,
    ) -> Vec<LinkWarning> {
        let mut queries = Vec::new();
        let mut warnings = Vec::new();

        for found in walk(&item.attributes, impacts) {
            match self.resolve(found.impact, &found.value, source) {
                Ok(query) => queries.push(query),
                Err(reason) => {
                    let warning = LinkWarning::new(found.field_path, &found.value, reason);
                    tracing::warn!("{}: {}", item.item_type, warning);
                    warnings.push(warning);
                },
            }
        }

        for query in queries {
            item.add_linked_item_query(query);
        }
        warnings
    }

    /// Resolve one value reached through a configured field
    pub fn resolve(
        &self,
        impact: &Impact,
        value: &str,
        source: &LocationInfo,
    ) -> Result<LinkedItemQuery, String> {
        let target = match manual_transform(impact.to_item_type) {
            Some(transform) => transform(value, source)?,
            None => self.generic_target(impact.to_item_type, value, source)?,
        };

        Ok(LinkedItemQuery {
            item_type: target.item_type,
            method: target.method,
            query: target.query,
            scope: target.scope,
            blast_propagation: impact.blast_propagation,
        })
    }

    fn generic_target(
        &self,
        item_type: ItemType,
        value: &str,
        source: &LocationInfo,
    ) -> Result<Target, String> {
        let declaration = self
            .registry
            .get(item_type)
            .ok_or_else(|| format!("{} is not a registered type", item_type))?;
        let meta = &declaration.meta;
        let keys = &meta.unique_attribute_keys;

        let is_path = value.contains('/');
        let params = if is_path {
            extract_path_params(value, keys)
        } else {
            Vec::new()
        };

        let searchable = meta
            .search_endpoint
            .as_ref()
            .is_some_and(|search| !params.is_empty() && search.query_arity() == params.len());

        let (method, segments) = if !params.is_empty() && params.len() == keys.len() {
            (QueryMethod::Get, params)
        } else if !is_path && keys.len() == 1 {
            (QueryMethod::Get, vec![value.to_string()])
        } else if searchable {
            (QueryMethod::Search, params)
        } else {
            return Err(format!("cannot extract {:?} for {}", keys, item_type));
        };

        let query = CompositeKey::new(segments)
            .map_err(|err| err.to_string())?
            .join();

        Ok(Target {
            item_type,
            method,
            query,
            scope: infer_scope(meta.location_level, value, source)?,
        })
    }

    /// Blast-propagation targets that are neither registered nor transformed
    pub fn dangling_links(&self) -> Vec<DanglingLink> {
        let registry = self.registry.as_ref();
        registry
            .declarations()
            .flat_map(move |declaration| {
                declaration
                    .blast_propagation
                    .iter()
                    .filter(move |(_, impact)| {
                        !registry.contains(impact.to_item_type)
                            && manual_transform(impact.to_item_type).is_none()
                    })
                    .map(move |(field_path, impact)| DanglingLink {
                        source: declaration.item_type,
                        field_path: *field_path,
                        target: impact.to_item_type,
                    })
            })
            .collect()
    }

    /// Check every declared link target once, at startup
    pub fn validate(&self) -> Result<(), AdapterError> {
        let dangling = self.dangling_links();
        if dangling.is_empty() {
            return Ok(());
        }

        let listed: Vec<String> = dangling
            .iter()
            .map(|link| format!("{}.{} -> {}", link.source, link.field_path, link.target))
            .collect();
        Err(AdapterError::configuration(format!(
            "unresolvable link target(s): {}",
            listed.join(", ")
        )))
    }
}

/// Target scope: the value's own project and location, else the source's
fn infer_scope(level: LocationLevel, value: &str, source: &LocationInfo) -> Result<String, String> {
    let project = extract_path_param(value, "projects")
        .filter(|project| *project != "_" && *project != "-")
        .unwrap_or(source.project_id());

    match level {
        LocationLevel::Project => Ok(project.to_string()),
        LocationLevel::Regional => {
            let region = extract_path_param(value, "regions")
                .or_else(|| extract_path_param(value, "locations"))
                .map(str::to_string)
                .or_else(|| source.enclosing_region())
                .ok_or("cannot infer the region of a regional target")?;
            Ok(format!("{}.{}", project, region))
        },
        LocationLevel::Zonal => {
            let zone = extract_path_param(value, "zones")
                .or(source.zone())
                .ok_or("cannot infer the zone of a zonal target")?;
            Ok(format!("{}.{}", project, zone))
        },
    }
}

fn host_of(value: &str) -> Option<String> {
    if value.contains("://") {
        let parsed = url::Url::parse(value).ok()?;
        return parsed.host_str().map(str::to_string);
    }
    Some(value.to_string())
}

fn is_dns_name(name: &str) -> bool {
    let name = name.strip_suffix('.').unwrap_or(name);
    let labels: Vec<&str> = name.split('.').collect();
    labels.len() > 1
        && labels.iter().all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
        && labels
            .last()
            .is_some_and(|tld| !tld.chars().all(|c| c.is_ascii_digit()))
}

/// Literal IPs (optionally with a prefix length) and DNS names, URLs included
fn network_target(value: &str, _source: &LocationInfo) -> Result<Target, String> {
    let host = host_of(value).ok_or("not a valid URL")?;
    let address = host.split('/').next().unwrap_or_default();
    let address = address.trim_start_matches('[').trim_end_matches(']');

    if let Ok(ip) = address.parse::<IpAddr>() {
        return Ok(Target {
            item_type: types::NETWORK_IP,
            method: QueryMethod::Get,
            query: ip.to_string(),
            scope: GLOBAL_SCOPE.to_string(),
        });
    }

    if is_dns_name(&host) {
        return Ok(Target {
            item_type: types::NETWORK_DNS,
            method: QueryMethod::Search,
            query: host.trim_end_matches('.').to_string(),
            scope: GLOBAL_SCOPE.to_string(),
        });
    }

    Err("neither an IP address nor a DNS name".to_string())
}

/// `sa@p.iam.gserviceaccount.com`, IAM member strings and resource names
fn service_account_target(value: &str, source: &LocationInfo) -> Result<Target, String> {
    let value = value.strip_prefix(SERVICE_ACCOUNT_PREFIX).unwrap_or(value);
    let email = if value.contains('/') {
        extract_path_param(value, "serviceAccounts").ok_or("no serviceAccounts segment")?
    } else {
        value
    };

    let Some((_, domain)) = email.split_once('@') else {
        return Err("not a service account email".to_string());
    };

    let project = domain
        .strip_suffix(SERVICE_ACCOUNT_DOMAIN)
        .filter(|project| !project.is_empty())
        .or_else(|| extract_path_param(value, "projects").filter(|project| *project != "-"))
        .unwrap_or(source.project_id());

    Ok(Target {
        item_type: types::IAM_SERVICE_ACCOUNT,
        method: QueryMethod::Get,
        query: email.to_string(),
        scope: project.to_string(),
    })
}

/// `gs://bucket/object`, `projects/_/buckets/bucket`, JSON API URLs or a name
fn bucket_target(value: &str, source: &LocationInfo) -> Result<Target, String> {
    let bucket = if let Some(rest) = value.strip_prefix("gs://") {
        rest.split('/').next()
    } else if value.contains('/') {
        extract_path_param(value, "buckets").or_else(|| extract_path_param(value, "b"))
    } else {
        Some(value)
    };

    let bucket = bucket
        .filter(|bucket| !bucket.is_empty())
        .ok_or("no bucket name in value")?;

    Ok(Target {
        item_type: types::STORAGE_BUCKET,
        method: QueryMethod::Get,
        query: bucket.to_string(),
        scope: source.project_id().to_string(),
    })
}

/// Image URLs, including `.../global/images/family/<family>` aliases
fn image_target(value: &str, source: &LocationInfo) -> Result<Target, String> {
    let scope = infer_scope(LocationLevel::Project, value, source)?;

    if !value.contains('/') {
        return Ok(Target {
            item_type: types::COMPUTE_IMAGE,
            method: QueryMethod::Get,
            query: value.to_string(),
            scope,
        });
    }

    let image = extract_path_param(value, "images").ok_or("no images segment")?;
    if image == "family" {
        // Aliases the newest image of the family, which only a search can find
        let family = extract_path_param(value, "family").ok_or("no image family")?;
        return Ok(Target {
            item_type: types::COMPUTE_IMAGE,
            method: QueryMethod::Search,
            query: family.to_string(),
            scope,
        });
    }

    Ok(Target {
        item_type: types::COMPUTE_IMAGE,
        method: QueryMethod::Get,
        query: image.to_string(),
        scope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::registry::build_registry;
    use crate::sdp::BlastPropagation;
    use serde_json::json;

    fn linker() -> Linker {
        Linker::new(Arc::new(build_registry(false).unwrap()))
    }

    fn resolve(target: ItemType, value: &str, source: &LocationInfo) -> Result<LinkedItemQuery, String> {
        linker().resolve(
            &Impact::new(target, "test link", BlastPropagation::inbound()),
            value,
            source,
        )
    }

    #[test]
    fn test_zonal_scope_from_value() {
        let query = resolve(
            types::COMPUTE_DISK_TYPE,
            "https://www.googleapis.com/compute/v1/projects/other/zones/europe-west1-b/diskTypes/pd-ssd",
            &LocationInfo::zonal("p", "us-central1-a"),
        )
        .unwrap();
        assert_eq!(query.method, QueryMethod::Get);
        assert_eq!(query.query, "pd-ssd");
        assert_eq!(query.scope, "other.europe-west1-b");
    }

    #[test]
    fn test_kms_decomposition() {
        let value = "projects/p/locations/global/keyRings/ring/cryptoKeys/key/cryptoKeyVersions/7";
        let source = LocationInfo::project("p");

        let version = resolve(types::CLOUD_KMS_CRYPTO_KEY_VERSION, value, &source).unwrap();
        assert_eq!(version.query, "global|ring|key|7");
        assert_eq!(version.scope, "p");

        let key = resolve(types::CLOUD_KMS_CRYPTO_KEY, value, &source).unwrap();
        assert_eq!(key.query, "global|ring|key");
        assert_eq!(key.method, QueryMethod::Get);
    }

    #[test]
    fn test_prefix_only_value_becomes_search() {
        let query = resolve(
            types::CLOUD_KMS_CRYPTO_KEY,
            "projects/p/locations/us/keyRings/ring",
            &LocationInfo::project("p"),
        )
        .unwrap();
        assert_eq!(query.method, QueryMethod::Search);
        assert_eq!(query.query, "us|ring");
    }

    #[test]
    fn test_regional_scope_falls_back_to_source() {
        let query = resolve(
            types::COMPUTE_SUBNETWORK,
            "sub-a",
            &LocationInfo::zonal("p", "us-east1-b"),
        )
        .unwrap();
        assert_eq!(query.scope, "p.us-east1");

        assert!(resolve(types::COMPUTE_SUBNETWORK, "sub-a", &LocationInfo::project("p")).is_err());
    }

    #[test]
    fn test_network_addresses() {
        let source = LocationInfo::project("p");

        let ip = resolve(types::NETWORK_IP, "10.0.0.1", &source).unwrap();
        assert_eq!((ip.item_type, ip.method, ip.query.as_str(), ip.scope.as_str()),
            (types::NETWORK_IP, QueryMethod::Get, "10.0.0.1", "global"));

        let cidr = resolve(types::NETWORK_IP, "10.1.0.0/16", &source).unwrap();
        assert_eq!(cidr.query, "10.1.0.0");

        let dns = resolve(types::NETWORK_DNS, "https://hooks.example.com/push?x=1", &source).unwrap();
        assert_eq!((dns.item_type, dns.method, dns.query.as_str()),
            (types::NETWORK_DNS, QueryMethod::Search, "hooks.example.com"));

        let v6 = resolve(types::NETWORK_DNS, "https://[2001:db8::1]:8443/", &source).unwrap();
        assert_eq!((v6.item_type, v6.query.as_str()), (types::NETWORK_IP, "2001:db8::1"));

        assert!(resolve(types::NETWORK_IP, "not an address", &source).is_err());
    }

    #[test]
    fn test_service_accounts() {
        let source = LocationInfo::project("p");

        let query = resolve(
            types::IAM_SERVICE_ACCOUNT,
            "serviceAccount:runner@build-proj.iam.gserviceaccount.com",
            &source,
        )
        .unwrap();
        assert_eq!(query.query, "runner@build-proj.iam.gserviceaccount.com");
        assert_eq!(query.scope, "build-proj");

        let default_sa = resolve(
            types::IAM_SERVICE_ACCOUNT,
            "123-compute@developer.gserviceaccount.com",
            &source,
        )
        .unwrap();
        assert_eq!(default_sa.scope, "p");

        assert!(resolve(types::IAM_SERVICE_ACCOUNT, "nobody", &source).is_err());
    }

    #[test]
    fn test_buckets() {
        let source = LocationInfo::project("p");
        for value in ["gs://logs/2024/01", "projects/_/buckets/logs", "logs"] {
            assert_eq!(resolve(types::STORAGE_BUCKET, value, &source).unwrap().query, "logs");
        }
    }

    #[test]
    fn test_image_family_becomes_search() {
        let source = LocationInfo::zonal("p", "us-central1-a");

        let family = resolve(
            types::COMPUTE_IMAGE,
            "https://www.googleapis.com/compute/v1/projects/debian-cloud/global/images/family/debian-12",
            &source,
        )
        .unwrap();
        assert_eq!(family.method, QueryMethod::Search);
        assert_eq!(family.query, "debian-12");
        assert_eq!(family.scope, "debian-cloud");

        let image = resolve(
            types::COMPUTE_IMAGE,
            "https://www.googleapis.com/compute/v1/projects/debian-cloud/global/images/debian-12-bookworm-v20240110",
            &source,
        )
        .unwrap();
        assert_eq!(image.method, QueryMethod::Get);
        assert_eq!(image.query, "debian-12-bookworm-v20240110");
        assert_eq!(image.scope, "debian-cloud");

        let bare = resolve(types::COMPUTE_IMAGE, "my-image", &source).unwrap();
        assert_eq!((bare.method, bare.scope.as_str()), (QueryMethod::Get, "p"));

        assert!(resolve(types::COMPUTE_IMAGE, "global/images/family", &source).is_err());
    }

    #[test]
    fn test_link_collapses_duplicates_and_reports_warnings() {
        let linker = linker();
        let declaration = linker.registry().get(types::COMPUTE_INSTANCE).unwrap().clone();
        let mut item = Item::new(
            types::COMPUTE_INSTANCE,
            "p.us-central1-a".to_string(),
            json!({
                "networkInterfaces": [
                    {"network": "projects/p/global/networks/default", "networkIP": "10.0.0.2"},
                    {"network": "projects/p/global/networks/default", "networkIP": "bad value!"}
                ]
            }),
        );

        let warnings = linker.link(
            &mut item,
            &declaration.blast_propagation,
            &LocationInfo::zonal("p", "us-central1-a"),
        );

        let networks: Vec<_> = item
            .linked_item_queries
            .iter()
            .filter(|q| q.item_type == types::COMPUTE_NETWORK)
            .collect();
        assert_eq!(networks.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field_path, "networkInterfaces.networkIP");
    }

    #[test]
    fn test_missing_optional_field_produces_nothing() {
        let linker = linker();
        let declaration = linker.registry().get(types::COMPUTE_SUBNETWORK).unwrap().clone();
        let mut item = Item::new(types::COMPUTE_SUBNETWORK, "p.us-central1".to_string(), json!({}));

        let warnings = linker.link(
            &mut item,
            &declaration.blast_propagation,
            &LocationInfo::regional("p", "us-central1"),
        );
        assert!(warnings.is_empty());
        assert!(item.linked_item_queries.is_empty());
    }

    #[test]
    fn test_catalog_links_validate() {
        linker().validate().unwrap();
    }

    #[test]
    fn test_dangling_link_is_reported() {
        let mut registry = build_registry(false).unwrap();
        let mut declaration = registry.get(types::COMPUTE_NETWORK).unwrap().clone();
        declaration.item_type = ItemType::new("gcp-test-orphan");
        declaration = declaration.link(
            "peerings.unknown",
            ItemType::new("gcp-not-registered"),
            "nothing",
            BlastPropagation::both(),
        );
        registry.register(declaration).unwrap();

        let dangling = Linker::new(Arc::new(registry)).dangling_links();
        assert_eq!(
            dangling,
            vec![DanglingLink {
                source: ItemType::new("gcp-test-orphan"),
                field_path: "peerings.unknown",
                target: ItemType::new("gcp-not-registered"),
            }]
        );
    }
}
