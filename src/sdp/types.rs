//! Item type identifiers

use super::item::ItemType;

// Generic network types, shared with non-GCP sources
pub const NETWORK_IP: ItemType = ItemType::new("ip");
pub const NETWORK_DNS: ItemType = ItemType::new("dns");

// Compute Engine
pub const COMPUTE_NETWORK: ItemType = ItemType::new("gcp-compute-network");
pub const COMPUTE_SUBNETWORK: ItemType = ItemType::new("gcp-compute-subnetwork");
pub const COMPUTE_INSTANCE: ItemType = ItemType::new("gcp-compute-instance");
pub const COMPUTE_DISK: ItemType = ItemType::new("gcp-compute-disk");
pub const COMPUTE_DISK_TYPE: ItemType = ItemType::new("gcp-compute-disk-type");
pub const COMPUTE_IMAGE: ItemType = ItemType::new("gcp-compute-image");
pub const COMPUTE_ADDRESS: ItemType = ItemType::new("gcp-compute-address");
pub const COMPUTE_FIREWALL: ItemType = ItemType::new("gcp-compute-firewall");
pub const COMPUTE_SNAPSHOT: ItemType = ItemType::new("gcp-compute-snapshot");

// Cloud KMS
pub const CLOUD_KMS_KEY_RING: ItemType = ItemType::new("gcp-cloud-kms-key-ring");
pub const CLOUD_KMS_CRYPTO_KEY: ItemType = ItemType::new("gcp-cloud-kms-crypto-key");
pub const CLOUD_KMS_CRYPTO_KEY_VERSION: ItemType =
    ItemType::new("gcp-cloud-kms-crypto-key-version");

// IAM
pub const IAM_SERVICE_ACCOUNT: ItemType = ItemType::new("gcp-iam-service-account");
pub const IAM_SERVICE_ACCOUNT_KEY: ItemType = ItemType::new("gcp-iam-service-account-key");

// Spanner
pub const SPANNER_INSTANCE: ItemType = ItemType::new("gcp-spanner-instance");
pub const SPANNER_DATABASE: ItemType = ItemType::new("gcp-spanner-database");

// Cloud Storage
pub const STORAGE_BUCKET: ItemType = ItemType::new("gcp-storage-bucket");

// Pub/Sub
pub const PUB_SUB_TOPIC: ItemType = ItemType::new("gcp-pub-sub-topic");
pub const PUB_SUB_SUBSCRIPTION: ItemType = ItemType::new("gcp-pub-sub-subscription");

// Cloud SQL
pub const SQL_ADMIN_INSTANCE: ItemType = ItemType::new("gcp-sql-admin-instance");
pub const SQL_ADMIN_BACKUP_RUN: ItemType = ItemType::new("gcp-sql-admin-backup-run");
