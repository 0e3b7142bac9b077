//! Cloud SQL Admin

use crate::adapter::endpoint::{
    project_level_endpoint_func_with_single_query, project_level_endpoint_func_with_two_queries,
    project_level_list_func,
};
use crate::adapter::meta::{AdapterCategory, AdapterDeclaration, AdapterMeta, TerraformMapping};
use crate::gcp::location::{LocationInfo, LocationLevel};
use crate::sdp::types::*;
use crate::sdp::{AdapterError, BlastPropagation};
use serde_json::Value;

const SQL: &str = "https://sqladmin.googleapis.com/v1/projects/%s/instances";
const SQL_VIEWER: &str = "roles/cloudsql.viewer";

fn instance() -> AdapterDeclaration {
    AdapterDeclaration::new(
        SQL_ADMIN_INSTANCE,
        AdapterMeta::new(
            AdapterCategory::Database,
            LocationLevel::Project,
            project_level_endpoint_func_with_single_query(format!("{}/%s", SQL)),
            &["instances"],
        )
        .list(project_level_list_func(SQL))
        .list_key("items")
        .iam_permissions(&["cloudsql.instances.get", "cloudsql.instances.list"])
        .predefined_role(SQL_VIEWER),
    )
    .link(
        "serviceAccountEmailAddress",
        IAM_SERVICE_ACCOUNT,
        "Service agent of the instance",
        BlastPropagation::inbound(),
    )
    .link(
        "ipAddresses.ipAddress",
        NETWORK_IP,
        "Addresses the instance listens on",
        BlastPropagation::both(),
    )
    .link(
        "settings.ipConfiguration.privateNetwork",
        COMPUTE_NETWORK,
        "VPC the private address is allocated in",
        BlastPropagation::inbound(),
    )
    .link(
        "diskEncryptionConfiguration.kmsKeyName",
        CLOUD_KMS_CRYPTO_KEY,
        "Customer-managed key of the data disk",
        BlastPropagation::inbound(),
    )
    .link(
        "replicaNames",
        SQL_ADMIN_INSTANCE,
        "Read replicas of this instance",
        BlastPropagation::both(),
    )
    .terraform(TerraformMapping::get("google_sql_database_instance.name"))
}

/// Backup runs carry neither `name` nor, in some API versions, `selfLink`;
/// build a resource name from `instance` and `id`.
fn backup_run_name(location: &LocationInfo, mut raw: Value) -> Result<Value, AdapterError> {
    let has_identity = ["name", "selfLink"]
        .iter()
        .any(|field| raw.get(*field).and_then(Value::as_str).is_some_and(|s| !s.is_empty()));
    if has_identity {
        return Ok(raw);
    }

    let instance = raw.get("instance").and_then(Value::as_str);
    let id = match raw.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };

    let (Some(instance), Some(id)) = (instance, id) else {
        return Err(AdapterError::UniqueAttribute {
            item_type: SQL_ADMIN_BACKUP_RUN.to_string(),
            reason: "backup run has neither a name nor instance and id".to_string(),
        });
    };

    let name = format!(
        "projects/{}/instances/{}/backupRuns/{}",
        location.project_id(),
        instance,
        id
    );
    if let Some(map) = raw.as_object_mut() {
        map.insert("name".to_string(), Value::String(name));
    }
    Ok(raw)
}

fn backup_run() -> AdapterDeclaration {
    AdapterDeclaration::new(
        SQL_ADMIN_BACKUP_RUN,
        AdapterMeta::new(
            AdapterCategory::Database,
            LocationLevel::Project,
            project_level_endpoint_func_with_two_queries(format!("{}/%s/backupRuns/%s", SQL)),
            &["instances", "backupRuns"],
        )
        .search(
            project_level_endpoint_func_with_single_query(format!("{}/%s/backupRuns", SQL)),
            "Search backup runs of an instance: \"instance\"",
        )
        .list_key("items")
        .extractor(backup_run_name)
        .iam_permissions(&["cloudsql.backupRuns.get", "cloudsql.backupRuns.list"])
        .predefined_role(SQL_VIEWER),
    )
    .link(
        "instance",
        SQL_ADMIN_INSTANCE,
        "Instance the backup was taken from",
        BlastPropagation::both(),
    )
    .link(
        "diskEncryptionConfiguration.kmsKeyName",
        CLOUD_KMS_CRYPTO_KEY,
        "Key protecting the backup",
        BlastPropagation::inbound(),
    )
    .link(
        "diskEncryptionStatus.kmsKeyVersionName",
        CLOUD_KMS_CRYPTO_KEY_VERSION,
        "Key version used for the backup",
        BlastPropagation::inbound(),
    )
}

pub fn declarations() -> Vec<AdapterDeclaration> {
    vec![instance(), backup_run()]
}
