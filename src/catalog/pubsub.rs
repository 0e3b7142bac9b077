//! Pub/Sub

use crate::adapter::endpoint::{project_level_endpoint_func_with_single_query, project_level_list_func};
use crate::adapter::meta::{AdapterCategory, AdapterDeclaration, AdapterMeta, TerraformMapping};
use crate::gcp::location::LocationLevel;
use crate::sdp::types::*;
use crate::sdp::BlastPropagation;

const PUBSUB: &str = "https://pubsub.googleapis.com/v1/projects/%s";
const PUBSUB_VIEWER: &str = "roles/pubsub.viewer";

fn topic() -> AdapterDeclaration {
    AdapterDeclaration::new(
        PUB_SUB_TOPIC,
        AdapterMeta::new(
            AdapterCategory::Configuration,
            LocationLevel::Project,
            project_level_endpoint_func_with_single_query(format!("{}/topics/%s", PUBSUB)),
            &["topics"],
        )
        .list(project_level_list_func(format!("{}/topics", PUBSUB)))
        .list_key("topics")
        .iam_permissions(&["pubsub.topics.get", "pubsub.topics.list"])
        .predefined_role(PUBSUB_VIEWER),
    )
    .link(
        "kmsKeyName",
        CLOUD_KMS_CRYPTO_KEY,
        "Key protecting messages at rest",
        BlastPropagation::inbound(),
    )
    .terraform(TerraformMapping::get("google_pubsub_topic.name"))
}

fn subscription() -> AdapterDeclaration {
    AdapterDeclaration::new(
        PUB_SUB_SUBSCRIPTION,
        AdapterMeta::new(
            AdapterCategory::Configuration,
            LocationLevel::Project,
            project_level_endpoint_func_with_single_query(format!("{}/subscriptions/%s", PUBSUB)),
            &["subscriptions"],
        )
        .list(project_level_list_func(format!("{}/subscriptions", PUBSUB)))
        .list_key("subscriptions")
        .iam_permissions(&["pubsub.subscriptions.get", "pubsub.subscriptions.list"])
        .predefined_role(PUBSUB_VIEWER),
    )
    .link(
        "topic",
        PUB_SUB_TOPIC,
        "Topic the subscription reads from",
        BlastPropagation::both(),
    )
    .link(
        "deadLetterPolicy.deadLetterTopic",
        PUB_SUB_TOPIC,
        "Topic receiving undeliverable messages",
        BlastPropagation::outbound(),
    )
    .link(
        "pushConfig.pushEndpoint",
        NETWORK_DNS,
        "Endpoint messages are pushed to",
        BlastPropagation::both(),
    )
    .link(
        "pushConfig.oidcToken.serviceAccountEmail",
        IAM_SERVICE_ACCOUNT,
        "Identity used to sign push requests",
        BlastPropagation::inbound(),
    )
    .link(
        "cloudStorageConfig.bucket",
        STORAGE_BUCKET,
        "Bucket messages are written to",
        BlastPropagation::both(),
    )
    .terraform(TerraformMapping::get("google_pubsub_subscription.name"))
}

pub fn declarations() -> Vec<AdapterDeclaration> {
    vec![topic(), subscription()]
}
