//! SDP data model
//!
//! The item and query types adapters hand to the discovery framework.
//!
//! - [`item`] - items, linked-item queries and blast propagation
//! - [`types`] - item type identifiers
//! - [`error`] - adapter error taxonomy
//! - [`cache`] - injected response cache
//! - [`stream`] - sinks for streaming queries

pub mod cache;
pub mod error;
pub mod item;
pub mod stream;
pub mod types;

pub use cache::{Cache, CacheKey, CachedResult, MemoryCache, NoopCache};
pub use error::{AdapterError, LinkWarning};
pub use item::{BlastPropagation, Item, ItemType, LinkedItemQuery, QueryMethod};
pub use stream::{ItemSink, StreamEvent};
