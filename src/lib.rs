//! Dynamic GCP adapters
//!
//! Fetch Google Cloud resources through declarative, per-type adapters,
//! normalize them into discovery items and link them to each other.

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod gcp;
pub mod sdp;

/// Version injected at compile time via GCP_ADAPTERS_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("GCP_ADAPTERS_VERSION") {
    Some(v) => v,
    None => "dev",
};
