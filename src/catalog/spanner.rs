//! Cloud Spanner

use crate::adapter::endpoint::{
    project_level_endpoint_func_with_single_query, project_level_endpoint_func_with_two_queries,
    project_level_list_func,
};
use crate::adapter::meta::{AdapterCategory, AdapterDeclaration, AdapterMeta, TerraformMapping};
use crate::gcp::location::LocationLevel;
use crate::sdp::types::*;
use crate::sdp::BlastPropagation;

const SPANNER: &str = "https://spanner.googleapis.com/v1/projects/%s/instances";
const SPANNER_VIEWER: &str = "roles/spanner.viewer";

fn instance() -> AdapterDeclaration {
    AdapterDeclaration::new(
        SPANNER_INSTANCE,
        AdapterMeta::new(
            AdapterCategory::Database,
            LocationLevel::Project,
            project_level_endpoint_func_with_single_query(format!("{}/%s", SPANNER)),
            &["instances"],
        )
        .list(project_level_list_func(SPANNER))
        .list_key("instances")
        .iam_permissions(&["spanner.instances.get", "spanner.instances.list"])
        .predefined_role(SPANNER_VIEWER),
    )
    .terraform(TerraformMapping::get("google_spanner_instance.name"))
}

fn database() -> AdapterDeclaration {
    AdapterDeclaration::new(
        SPANNER_DATABASE,
        AdapterMeta::new(
            AdapterCategory::Database,
            LocationLevel::Project,
            project_level_endpoint_func_with_two_queries(format!("{}/%s/databases/%s", SPANNER)),
            &["instances", "databases"],
        )
        .search(
            project_level_endpoint_func_with_single_query(format!("{}/%s/databases", SPANNER)),
            "Search databases of an instance: \"instance\"",
        )
        .list_key("databases")
        .iam_permissions(&["spanner.databases.get", "spanner.databases.list"])
        .predefined_role(SPANNER_VIEWER),
    )
    .link(
        "name",
        SPANNER_INSTANCE,
        "Instance hosting the database",
        BlastPropagation::both(),
    )
    .link(
        "encryptionConfig.kmsKeyName",
        CLOUD_KMS_CRYPTO_KEY,
        "Customer-managed key of the database",
        BlastPropagation::inbound(),
    )
    .link(
        "encryptionInfo.kmsKeyVersion",
        CLOUD_KMS_CRYPTO_KEY_VERSION,
        "Key versions protecting the database",
        BlastPropagation::inbound(),
    )
    .terraform(TerraformMapping::search("google_spanner_database.id"))
}

pub fn declarations() -> Vec<AdapterDeclaration> {
    vec![instance(), database()]
}
