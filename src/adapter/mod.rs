//! Dynamic adapter engine
//!
//! Resource types are described by data ([`meta::AdapterDeclaration`]) and
//! served by one generic adapter implementation, so adding a type never needs
//! new fetch or link code.
//!
//! # Architecture
//!
//! - [`composite`] - composite query keys and resource path helpers
//! - [`endpoint`] - URL template builders bound to a project/region/zone
//! - [`fetcher`] - HTTP fetch, envelope unwrapping and pagination
//! - [`attributes`] - raw resource -> item attributes and unique value
//! - [`walker`] - field paths through attribute trees
//! - [`linker`] - linked item queries and scope inference
//! - [`registry`] - declarations keyed by item type
//! - [`terraform`] - full resource names in search queries
//! - [`dynamic`] - the adapter itself and its factory
//!
//! # Example
//!
//! ```ignore
//! use gcp_adapters::adapter::{make_adapter, registry, Linker};
//! use gcp_adapters::gcp::location::LocationInfo;
//! use gcp_adapters::sdp::{types, NoopCache};
//!
//! async fn get_network(http: std::sync::Arc<dyn gcp_adapters::gcp::http::HttpClientProvider>) -> anyhow::Result<()> {
//!     let linker = std::sync::Arc::new(Linker::new(registry()?));
//!     let adapter = make_adapter(
//!         &linker,
//!         types::COMPUTE_NETWORK,
//!         http,
//!         std::sync::Arc::new(NoopCache),
//!         LocationInfo::project("my-project"),
//!     )?;
//!     let ctx = tokio_util::sync::CancellationToken::new();
//!     let item = adapter.get(&ctx, "my-project", "default", false).await?;
//!     println!("{}", item.globally_unique_name());
//!     Ok(())
//! }
//! ```

pub mod attributes;
pub mod composite;
pub mod dynamic;
pub mod endpoint;
pub mod fetcher;
pub mod linker;
pub mod meta;
pub mod registry;
pub mod terraform;
pub mod walker;

#[cfg(test)]
mod testing;

pub use composite::CompositeKey;
pub use dynamic::{make_adapter, make_adapters, AdapterMetadata, Capabilities, DynamicAdapter};
pub use fetcher::{Fetcher, DEFAULT_MAX_PAGES};
pub use linker::Linker;
pub use meta::{AdapterDeclaration, AdapterMeta, Impact};
pub use registry::{build_registry, registry, Registration, Registry};
