//! Compute Engine

use crate::adapter::endpoint::{
    project_level_endpoint_func_with_single_query, project_level_list_func,
    regional_level_endpoint_func_with_single_query, regional_level_list_func,
    zone_level_endpoint_func_with_single_query, zone_level_list_func,
};
use crate::adapter::meta::{AdapterCategory, AdapterDeclaration, AdapterMeta, TerraformMapping};
use crate::gcp::location::LocationLevel;
use crate::sdp::types::*;
use crate::sdp::BlastPropagation;

const COMPUTE: &str = "https://compute.googleapis.com/compute/v1/projects/%s";
const COMPUTE_VIEWER: &str = "roles/compute.viewer";

fn global(collection: &str) -> (String, String) {
    (
        format!("{}/global/{}/%s", COMPUTE, collection),
        format!("{}/global/{}", COMPUTE, collection),
    )
}

fn regional(collection: &str) -> (String, String) {
    (
        format!("{}/regions/%s/{}/%s", COMPUTE, collection),
        format!("{}/regions/%s/{}", COMPUTE, collection),
    )
}

fn zonal(collection: &str) -> (String, String) {
    (
        format!("{}/zones/%s/{}/%s", COMPUTE, collection),
        format!("{}/zones/%s/{}", COMPUTE, collection),
    )
}

fn network() -> AdapterDeclaration {
    let (get, list) = global("networks");
    AdapterDeclaration::new(
        COMPUTE_NETWORK,
        AdapterMeta::new(
            AdapterCategory::Network,
            LocationLevel::Project,
            project_level_endpoint_func_with_single_query(get),
            &["networks"],
        )
        .list(project_level_list_func(list))
        .list_key("items")
        .iam_permissions(&["compute.networks.get", "compute.networks.list"])
        .predefined_role(COMPUTE_VIEWER),
    )
    .link(
        "subnetworks",
        COMPUTE_SUBNETWORK,
        "Subnetworks live inside the network and go away with it",
        BlastPropagation::both(),
    )
    .link(
        "peerings.network",
        COMPUTE_NETWORK,
        "Peered networks exchange routes with this one",
        BlastPropagation::both(),
    )
    .link(
        "gatewayIPv4",
        NETWORK_IP,
        "Gateway address of a legacy network",
        BlastPropagation::both(),
    )
    .terraform(TerraformMapping::get("google_compute_network.name"))
}

fn subnetwork() -> AdapterDeclaration {
    let (get, list) = regional("subnetworks");
    AdapterDeclaration::new(
        COMPUTE_SUBNETWORK,
        AdapterMeta::new(
            AdapterCategory::Network,
            LocationLevel::Regional,
            regional_level_endpoint_func_with_single_query(get),
            &["subnetworks"],
        )
        .list(regional_level_list_func(list))
        .list_key("items")
        .iam_permissions(&["compute.subnetworks.get", "compute.subnetworks.list"])
        .predefined_role(COMPUTE_VIEWER),
    )
    .link(
        "network",
        COMPUTE_NETWORK,
        "The subnetwork belongs to the network; either one changing affects the other",
        BlastPropagation::both(),
    )
    .link(
        "gatewayAddress",
        NETWORK_IP,
        "Gateway address of the subnetwork",
        BlastPropagation::both(),
    )
    .terraform(TerraformMapping::get("google_compute_subnetwork.name"))
}

fn instance() -> AdapterDeclaration {
    let (get, list) = zonal("instances");
    AdapterDeclaration::new(
        COMPUTE_INSTANCE,
        AdapterMeta::new(
            AdapterCategory::Compute,
            LocationLevel::Zonal,
            zone_level_endpoint_func_with_single_query(get),
            &["instances"],
        )
        .list(zone_level_list_func(list))
        .list_key("items")
        .iam_permissions(&["compute.instances.get", "compute.instances.list"])
        .predefined_role(COMPUTE_VIEWER),
    )
    .link(
        "disks.source",
        COMPUTE_DISK,
        "Attached disks",
        BlastPropagation::both(),
    )
    .link(
        "disks.initializeParams.sourceImage",
        COMPUTE_IMAGE,
        "Image the boot disk was created from",
        BlastPropagation::inbound(),
    )
    .link(
        "disks.diskEncryptionKey.kmsKeyName",
        CLOUD_KMS_CRYPTO_KEY_VERSION,
        "Key version encrypting an attached disk",
        BlastPropagation::inbound(),
    )
    .link(
        "networkInterfaces.network",
        COMPUTE_NETWORK,
        "Network of a network interface",
        BlastPropagation::inbound(),
    )
    .link(
        "networkInterfaces.subnetwork",
        COMPUTE_SUBNETWORK,
        "Subnetwork of a network interface",
        BlastPropagation::inbound(),
    )
    .link(
        "networkInterfaces.networkIP",
        NETWORK_IP,
        "Internal address of a network interface",
        BlastPropagation::both(),
    )
    .link(
        "networkInterfaces.accessConfigs.natIP",
        NETWORK_IP,
        "External address of a network interface",
        BlastPropagation::both(),
    )
    .link(
        "networkInterfaces.ipv6Address",
        NETWORK_IP,
        "IPv6 address of a network interface",
        BlastPropagation::both(),
    )
    .link(
        "serviceAccounts.email",
        IAM_SERVICE_ACCOUNT,
        "Identity the instance runs as",
        BlastPropagation::inbound(),
    )
    .terraform(TerraformMapping::get("google_compute_instance.name"))
}

fn disk() -> AdapterDeclaration {
    let (get, list) = zonal("disks");
    AdapterDeclaration::new(
        COMPUTE_DISK,
        AdapterMeta::new(
            AdapterCategory::Storage,
            LocationLevel::Zonal,
            zone_level_endpoint_func_with_single_query(get),
            &["disks"],
        )
        .list(zone_level_list_func(list))
        .list_key("items")
        .iam_permissions(&["compute.disks.get", "compute.disks.list"])
        .predefined_role(COMPUTE_VIEWER),
    )
    .link(
        "type",
        COMPUTE_DISK_TYPE,
        "Disk type",
        BlastPropagation::inbound(),
    )
    .link(
        "sourceImage",
        COMPUTE_IMAGE,
        "Image the disk was created from",
        BlastPropagation::inbound(),
    )
    .link(
        "users",
        COMPUTE_INSTANCE,
        "Instances the disk is attached to",
        BlastPropagation::both(),
    )
    .link(
        "diskEncryptionKey.kmsKeyName",
        CLOUD_KMS_CRYPTO_KEY_VERSION,
        "Key version encrypting the disk",
        BlastPropagation::inbound(),
    )
    .terraform(TerraformMapping::get("google_compute_disk.name"))
}

fn disk_type() -> AdapterDeclaration {
    let (get, list) = zonal("diskTypes");
    AdapterDeclaration::new(
        COMPUTE_DISK_TYPE,
        AdapterMeta::new(
            AdapterCategory::Configuration,
            LocationLevel::Zonal,
            zone_level_endpoint_func_with_single_query(get),
            &["diskTypes"],
        )
        .list(zone_level_list_func(list))
        .list_key("items")
        .iam_permissions(&["compute.diskTypes.get", "compute.diskTypes.list"])
        .predefined_role(COMPUTE_VIEWER),
    )
}

fn image() -> AdapterDeclaration {
    let (get, list) = global("images");
    AdapterDeclaration::new(
        COMPUTE_IMAGE,
        AdapterMeta::new(
            AdapterCategory::Storage,
            LocationLevel::Project,
            project_level_endpoint_func_with_single_query(get),
            &["images"],
        )
        .list(project_level_list_func(list))
        .search(
            project_level_endpoint_func_with_single_query(format!(
                "{}/global/images?filter=family%%3D%s",
                COMPUTE
            )),
            "Search images of a family: \"family\"",
        )
        .list_key("items")
        .iam_permissions(&["compute.images.get", "compute.images.list"])
        .predefined_role(COMPUTE_VIEWER),
    )
    .link(
        "sourceDisk",
        COMPUTE_DISK,
        "Disk the image was created from",
        BlastPropagation::inbound(),
    )
    .link(
        "imageEncryptionKey.kmsKeyName",
        CLOUD_KMS_CRYPTO_KEY_VERSION,
        "Key version encrypting the image",
        BlastPropagation::inbound(),
    )
    .terraform(TerraformMapping::get("google_compute_image.name"))
}

fn address() -> AdapterDeclaration {
    let (get, list) = regional("addresses");
    AdapterDeclaration::new(
        COMPUTE_ADDRESS,
        AdapterMeta::new(
            AdapterCategory::Network,
            LocationLevel::Regional,
            regional_level_endpoint_func_with_single_query(get),
            &["addresses"],
        )
        .list(regional_level_list_func(list))
        .list_key("items")
        .iam_permissions(&["compute.addresses.get", "compute.addresses.list"])
        .predefined_role(COMPUTE_VIEWER),
    )
    .link(
        "address",
        NETWORK_IP,
        "The reserved address",
        BlastPropagation::both(),
    )
    .link(
        "network",
        COMPUTE_NETWORK,
        "Network of an internal address",
        BlastPropagation::inbound(),
    )
    .link(
        "subnetwork",
        COMPUTE_SUBNETWORK,
        "Subnetwork of an internal address",
        BlastPropagation::inbound(),
    )
    .terraform(TerraformMapping::get("google_compute_address.name"))
}

fn firewall() -> AdapterDeclaration {
    let (get, list) = global("firewalls");
    AdapterDeclaration::new(
        COMPUTE_FIREWALL,
        AdapterMeta::new(
            AdapterCategory::Security,
            LocationLevel::Project,
            project_level_endpoint_func_with_single_query(get),
            &["firewalls"],
        )
        .list(project_level_list_func(list))
        .list_key("items")
        .iam_permissions(&["compute.firewalls.get", "compute.firewalls.list"])
        .predefined_role(COMPUTE_VIEWER),
    )
    .link(
        "network",
        COMPUTE_NETWORK,
        "Network the rule applies to",
        BlastPropagation::both(),
    )
    .link(
        "sourceServiceAccounts",
        IAM_SERVICE_ACCOUNT,
        "Traffic sources matched by identity",
        BlastPropagation::inbound(),
    )
    .link(
        "targetServiceAccounts",
        IAM_SERVICE_ACCOUNT,
        "Instances the rule applies to, by identity",
        BlastPropagation::inbound(),
    )
    .terraform(TerraformMapping::get("google_compute_firewall.name"))
}

fn snapshot() -> AdapterDeclaration {
    let (get, list) = global("snapshots");
    AdapterDeclaration::new(
        COMPUTE_SNAPSHOT,
        AdapterMeta::new(
            AdapterCategory::Storage,
            LocationLevel::Project,
            project_level_endpoint_func_with_single_query(get),
            &["snapshots"],
        )
        .list(project_level_list_func(list))
        .list_key("items")
        .iam_permissions(&["compute.snapshots.get", "compute.snapshots.list"])
        .predefined_role(COMPUTE_VIEWER)
        .in_development(),
    )
    .link(
        "sourceDisk",
        COMPUTE_DISK,
        "Disk the snapshot was taken from",
        BlastPropagation::inbound(),
    )
    .terraform(TerraformMapping::get("google_compute_snapshot.name"))
}

pub fn declarations() -> Vec<AdapterDeclaration> {
    vec![
        network(),
        subnetwork(),
        instance(),
        disk(),
        disk_type(),
        image(),
        address(),
        firewall(),
        snapshot(),
    ]
}
