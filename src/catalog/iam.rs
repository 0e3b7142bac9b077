//! IAM

use crate::adapter::endpoint::{
    project_level_endpoint_func_with_single_query, project_level_endpoint_func_with_two_queries,
    project_level_list_func,
};
use crate::adapter::meta::{AdapterCategory, AdapterDeclaration, AdapterMeta, TerraformMapping};
use crate::gcp::location::LocationLevel;
use crate::sdp::types::*;
use crate::sdp::BlastPropagation;

const IAM: &str = "https://iam.googleapis.com/v1/projects/%s/serviceAccounts";

fn service_account() -> AdapterDeclaration {
    AdapterDeclaration::new(
        IAM_SERVICE_ACCOUNT,
        AdapterMeta::new(
            AdapterCategory::Security,
            LocationLevel::Project,
            project_level_endpoint_func_with_single_query(format!("{}/%s", IAM)),
            &["serviceAccounts"],
        )
        .identity_fields(&["name", "email"])
        .list(project_level_list_func(IAM))
        .list_key("accounts")
        .iam_permissions(&["iam.serviceAccounts.get", "iam.serviceAccounts.list"])
        .predefined_role("roles/iam.serviceAccountViewer"),
    )
    .terraform(TerraformMapping::get("google_service_account.email"))
}

fn service_account_key() -> AdapterDeclaration {
    AdapterDeclaration::new(
        IAM_SERVICE_ACCOUNT_KEY,
        AdapterMeta::new(
            AdapterCategory::Security,
            LocationLevel::Project,
            project_level_endpoint_func_with_two_queries(format!("{}/%s/keys/%s", IAM)),
            &["serviceAccounts", "keys"],
        )
        .search(
            project_level_endpoint_func_with_single_query(format!("{}/%s/keys", IAM)),
            "Search keys of a service account: \"email\"",
        )
        .list_key("keys")
        .iam_permissions(&["iam.serviceAccountKeys.get", "iam.serviceAccountKeys.list"])
        .predefined_role("roles/iam.serviceAccountKeyAdmin"),
    )
    .link(
        "name",
        IAM_SERVICE_ACCOUNT,
        "Service account the key authenticates",
        BlastPropagation::both(),
    )
    .terraform(TerraformMapping::search("google_service_account_key.id"))
}

pub fn declarations() -> Vec<AdapterDeclaration> {
    vec![service_account(), service_account_key()]
}
