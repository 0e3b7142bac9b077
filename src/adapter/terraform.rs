//! Terraform search compatibility
//!
//! Terraform state refers to resources by their full name
//! (`projects/p/locations/l/keyRings/r/cryptoKeys/k`, sometimes prefixed with
//! an API host). A Search carrying such a name is answered by a direct Get.
//! The name of a parent (`projects/p/locations/l/keyRings/r` on crypto keys)
//! becomes the adapter's own search query.

use super::composite::{
    extract_path_param, extract_path_params, extract_trailing_values, path_segments, CompositeKey,
};
use super::meta::AdapterMeta;
use crate::gcp::location::LocationInfo;

const PROJECTS_PREFIX: &str = "projects/";

/// How a Search query is served
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchRewrite {
    /// Full resource name: serve with a Get of this query
    Get(String),
    /// Full name of a parent: serve with a Search of this query
    Search(String),
    /// Full resource name of another project or location; nothing to find here
    OutOfScope { found: String },
    /// Regular search query
    NotApplicable,
}

/// Resource path of a full resource name, host and scheme stripped
///
/// `//cloudkms.googleapis.com/projects/p/...` and
/// `https://compute.googleapis.com/compute/v1/projects/p/...` both yield
/// `projects/p/...`.
pub fn resource_path(query: &str) -> Option<&str> {
    if query.starts_with(PROJECTS_PREFIX) {
        return Some(query);
    }
    if query.starts_with("//") || query.contains("://") {
        let start = query.find("/projects/")?;
        return Some(&query[start + 1..]);
    }
    None
}

fn location_mismatch(path: &str, location: &LocationInfo) -> Option<String> {
    if let Some(zone) = location.zone() {
        if let Some(found) = extract_path_param(path, "zones").filter(|found| *found != zone) {
            return Some(found.to_string());
        }
    }
    if let Some(region) = location.region() {
        let found = extract_path_param(path, "regions");
        if let Some(found) = found.filter(|found| *found != region) {
            return Some(found.to_string());
        }
    }
    None
}

/// Collections of the collection/value pairs following `projects/<p>`
///
/// Compute's bare `global` segment is not a pair. `None` when a collection
/// has no value.
fn pairs_after_project(path: &str) -> Option<Vec<&str>> {
    let segments = path_segments(path);
    let mut rest = segments.get(2..)?.iter();
    let mut collections = Vec::new();

    while let Some(collection) = rest.next() {
        if *collection == "global" {
            continue;
        }
        rest.next()?;
        collections.push(*collection);
    }

    if collections.is_empty() {
        return None;
    }
    Some(collections)
}

/// Decide whether a Search query is a full resource name for this adapter
pub fn rewrite_search_query(query: &str, meta: &AdapterMeta, location: &LocationInfo) -> SearchRewrite {
    let Some(path) = resource_path(query) else {
        return SearchRewrite::NotApplicable;
    };

    if let Some(project) = extract_path_param(path, "projects") {
        if project != location.project_id() {
            return SearchRewrite::OutOfScope {
                found: project.to_string(),
            };
        }
    }
    if let Some(found) = location_mismatch(path, location) {
        return SearchRewrite::OutOfScope { found };
    }

    let Some(collections) = pairs_after_project(path) else {
        return SearchRewrite::NotApplicable;
    };
    let keys = &meta.unique_attribute_keys;
    let params = extract_path_params(path, keys);
    // The matched keys must name the innermost collection of the path
    let ends_with_key = |matched: usize| {
        matched > 0 && collections.last() == keys.get(matched - 1)
    };

    if params.len() == keys.len() && ends_with_key(params.len()) {
        return rewrite_get(params);
    }

    if params.is_empty() && collections.len() == keys.len() {
        return match extract_trailing_values(path, keys.len()) {
            Some(values) => rewrite_get(values),
            None => SearchRewrite::NotApplicable,
        };
    }

    let search_arity = meta.search_endpoint.as_ref().map(|builder| builder.query_arity());
    if search_arity == Some(params.len()) && params.len() < keys.len() && ends_with_key(params.len()) {
        if let Ok(key) = CompositeKey::new(params) {
            return SearchRewrite::Search(key.join());
        }
    }

    SearchRewrite::NotApplicable
}

fn rewrite_get(values: Vec<String>) -> SearchRewrite {
    match CompositeKey::new(values) {
        Ok(key) => SearchRewrite::Get(key.join()),
        Err(_) => SearchRewrite::NotApplicable,
    }
}
