//! Adapter catalog
//!
//! Static declarations of the supported GCP resource types, grouped by
//! service. New types are added here and picked up by
//! [`crate::adapter::registry::build_registry`].
//!
//! - [`compute`] - networks, subnetworks, instances, disks, images, addresses, firewalls
//! - [`kms`] - key rings, crypto keys and their versions
//! - [`iam`] - service accounts and their keys
//! - [`spanner`] - instances and databases
//! - [`storage`] - buckets
//! - [`pubsub`] - topics and subscriptions
//! - [`sql`] - Cloud SQL instances and backup runs

pub mod compute;
pub mod iam;
pub mod kms;
pub mod pubsub;
pub mod spanner;
pub mod sql;
pub mod storage;

use crate::adapter::meta::AdapterDeclaration;

/// Every declaration, in registration order
pub fn declarations() -> Vec<AdapterDeclaration> {
    [
        compute::declarations(),
        kms::declarations(),
        iam::declarations(),
        spanner::declarations(),
        storage::declarations(),
        pubsub::declarations(),
        sql::declarations(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_item_types_are_unique() {
        let declarations = declarations();
        let types: HashSet<_> = declarations.iter().map(|d| d.item_type).collect();
        assert_eq!(types.len(), declarations.len());
    }
}
