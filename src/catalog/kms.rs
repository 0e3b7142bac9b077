//! Cloud KMS
//!
//! Keys are addressed by location, so every KMS adapter is project-level and
//! carries the location as the first query segment.

use crate::adapter::endpoint::{
    project_level_endpoint_func_with_four_queries, project_level_endpoint_func_with_single_query,
    project_level_endpoint_func_with_three_queries, project_level_endpoint_func_with_two_queries,
};
use crate::adapter::meta::{AdapterCategory, AdapterDeclaration, AdapterMeta, TerraformMapping};
use crate::gcp::location::LocationLevel;
use crate::sdp::types::*;
use crate::sdp::BlastPropagation;

const KMS: &str = "https://cloudkms.googleapis.com/v1/projects/%s/locations/%s";
const KMS_VIEWER: &str = "roles/cloudkms.viewer";

fn key_ring() -> AdapterDeclaration {
    AdapterDeclaration::new(
        CLOUD_KMS_KEY_RING,
        AdapterMeta::new(
            AdapterCategory::Security,
            LocationLevel::Project,
            project_level_endpoint_func_with_two_queries(format!("{}/keyRings/%s", KMS)),
            &["locations", "keyRings"],
        )
        .search(
            project_level_endpoint_func_with_single_query(format!("{}/keyRings", KMS)),
            "Search key rings by location: \"location\"",
        )
        .list_key("keyRings")
        .iam_permissions(&["cloudkms.keyRings.get", "cloudkms.keyRings.list"])
        .predefined_role(KMS_VIEWER),
    )
    .terraform(TerraformMapping::search("google_kms_key_ring.id"))
}

fn crypto_key() -> AdapterDeclaration {
    AdapterDeclaration::new(
        CLOUD_KMS_CRYPTO_KEY,
        AdapterMeta::new(
            AdapterCategory::Security,
            LocationLevel::Project,
            project_level_endpoint_func_with_three_queries(format!(
                "{}/keyRings/%s/cryptoKeys/%s",
                KMS
            )),
            &["locations", "keyRings", "cryptoKeys"],
        )
        .search(
            project_level_endpoint_func_with_two_queries(format!("{}/keyRings/%s/cryptoKeys", KMS)),
            "Search crypto keys of a key ring: \"location|keyRing\"",
        )
        .list_key("cryptoKeys")
        .iam_permissions(&["cloudkms.cryptoKeys.get", "cloudkms.cryptoKeys.list"])
        .predefined_role(KMS_VIEWER),
    )
    .link(
        "name",
        CLOUD_KMS_KEY_RING,
        "Key ring holding the key",
        BlastPropagation::both(),
    )
    .link(
        "primary.name",
        CLOUD_KMS_CRYPTO_KEY_VERSION,
        "Primary version used for encryption",
        BlastPropagation::both(),
    )
    .terraform(TerraformMapping::search("google_kms_crypto_key.id"))
}

fn crypto_key_version() -> AdapterDeclaration {
    AdapterDeclaration::new(
        CLOUD_KMS_CRYPTO_KEY_VERSION,
        AdapterMeta::new(
            AdapterCategory::Security,
            LocationLevel::Project,
            project_level_endpoint_func_with_four_queries(format!(
                "{}/keyRings/%s/cryptoKeys/%s/cryptoKeyVersions/%s",
                KMS
            )),
            &["locations", "keyRings", "cryptoKeys", "cryptoKeyVersions"],
        )
        .search(
            project_level_endpoint_func_with_three_queries(format!(
                "{}/keyRings/%s/cryptoKeys/%s/cryptoKeyVersions",
                KMS
            )),
            "Search versions of a crypto key: \"location|keyRing|cryptoKey\"",
        )
        .list_key("cryptoKeyVersions")
        .iam_permissions(&["cloudkms.cryptoKeyVersions.get", "cloudkms.cryptoKeyVersions.list"])
        .predefined_role(KMS_VIEWER),
    )
    .link(
        "name",
        CLOUD_KMS_CRYPTO_KEY,
        "Crypto key the version belongs to",
        BlastPropagation::both(),
    )
    .terraform(TerraformMapping::search("google_kms_crypto_key_version.id"))
}

pub fn declarations() -> Vec<AdapterDeclaration> {
    vec![key_ring(), crypto_key(), crypto_key_version()]
}
