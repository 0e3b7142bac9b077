//! Cloud Storage
//!
//! Bucket names are global; the project only scopes the list call.

use crate::adapter::endpoint::{project_level_endpoint_func_with_single_query, project_level_list_func};
use crate::adapter::meta::{AdapterCategory, AdapterDeclaration, AdapterMeta, TerraformMapping};
use crate::gcp::location::LocationLevel;
use crate::sdp::types::*;
use crate::sdp::BlastPropagation;

fn bucket() -> AdapterDeclaration {
    AdapterDeclaration::new(
        STORAGE_BUCKET,
        AdapterMeta::new(
            AdapterCategory::Storage,
            LocationLevel::Project,
            project_level_endpoint_func_with_single_query("https://storage.googleapis.com/storage/v1/b/%[2]s"),
            &["b"],
        )
        .list(project_level_list_func("https://storage.googleapis.com/storage/v1/b?project=%s"))
        .list_key("items")
        .iam_permissions(&["storage.buckets.get", "storage.buckets.list"])
        .predefined_role("roles/storage.bucketViewer"),
    )
    .link(
        "encryption.defaultKmsKeyName",
        CLOUD_KMS_CRYPTO_KEY,
        "Default key for new objects",
        BlastPropagation::inbound(),
    )
    .link(
        "logging.logBucket",
        STORAGE_BUCKET,
        "Bucket receiving access logs",
        BlastPropagation::outbound(),
    )
    .terraform(TerraformMapping::get("google_storage_bucket.name"))
}

pub fn declarations() -> Vec<AdapterDeclaration> {
    vec![bucket()]
}
