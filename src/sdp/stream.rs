//! Item sinks for streaming queries
//!
//! Streaming adapters push items as pages arrive. A sink must not block for
//! long, the fetch loop waits on it.

use super::error::AdapterError;
use super::item::Item;
use tokio::sync::mpsc::UnboundedSender;

/// Receives items and errors from a streaming query
pub trait ItemSink: Send + Sync {
    fn send_item(&self, item: Item);
    fn send_error(&self, error: AdapterError);
}

/// Event delivered through a channel-backed sink
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Item(Item),
    Error(AdapterError),
}

impl ItemSink for UnboundedSender<StreamEvent> {
    fn send_item(&self, item: Item) {
        if self.send(StreamEvent::Item(item)).is_err() {
            tracing::debug!("stream receiver dropped, discarding item");
        }
    }

    fn send_error(&self, error: AdapterError) {
        if self.send(StreamEvent::Error(error)).is_err() {
            tracing::debug!("stream receiver dropped, discarding error");
        }
    }
}
