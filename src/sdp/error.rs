//! Adapter errors
//!
//! Errors are `Clone` so that "not found" answers can be cached and replayed.

use thiserror::Error;

/// Errors returned by adapters and the engine that builds them
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// Invalid declaration or init parameters, detected before any network call
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The API answered 404
    #[error("resource not found: {url}")]
    NotFound { url: String },

    /// Any other non-2xx answer, or a transport failure (status is `None`)
    #[error("API request to {url} failed{}: {message}", status_suffix(.status))]
    Upstream {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The body could not be decoded into a resource tree
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// A paginated fetch failed after some pages were already collected
    #[error("pagination failed after {pages} page(s) and {items} item(s): {cause}")]
    Pagination {
        pages: usize,
        items: usize,
        #[source]
        cause: Box<AdapterError>,
    },

    /// The query does not fit the endpoint of this adapter
    #[error("invalid query {query:?}: {reason}")]
    InvalidQuery { query: String, reason: String },

    /// The requested scope is not served by this adapter
    #[error("scope {requested} is not served by this adapter (serves {expected})")]
    NoScope { requested: String, expected: String },

    /// The adapter has no endpoint configured for this method
    #[error("{method} is not supported by {item_type}")]
    Unsupported { method: String, item_type: String },

    /// No configured identity field produced a unique attribute value
    #[error("cannot determine unique attribute for {item_type}: {reason}")]
    UniqueAttribute { item_type: String, reason: String },

    /// The query context was cancelled
    #[error("query cancelled")]
    Cancelled,
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" with status {}", code))
        .unwrap_or_default()
}

impl AdapterError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn invalid_query(query: &str, reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            query: query.to_string(),
            reason: reason.into(),
        }
    }

    /// True for a 404, including one that interrupted pagination
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Pagination { cause, .. } => cause.is_not_found(),
            _ => false,
        }
    }

    /// Only definitive answers are worth caching
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A configured link whose value could not be turned into a query
///
/// Warnings are logged and reported next to the item, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkWarning {
    pub field_path: String,
    pub value: String,
    pub reason: String,
}

impl LinkWarning {
    pub fn new(field_path: &str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            field_path: field_path.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for LinkWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot link {} value {:?}: {}",
            self.field_path, self.value, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguishable() {
        let not_found = AdapterError::NotFound {
            url: "https://example.com/x".to_string(),
        };
        let upstream = AdapterError::Upstream {
            url: "https://example.com/x".to_string(),
            status: Some(500),
            message: "backend error".to_string(),
        };
        assert!(not_found.is_not_found());
        assert!(!upstream.is_not_found());
        assert!(matches!(upstream, AdapterError::Upstream { status: Some(500), .. }));
    }

    #[test]
    fn test_upstream_display_includes_status() {
        let err = AdapterError::Upstream {
            url: "u".to_string(),
            status: Some(403),
            message: "denied".to_string(),
        };
        assert_eq!(err.to_string(), "API request to u failed with status 403: denied");

        let err = AdapterError::Upstream {
            url: "u".to_string(),
            status: None,
            message: "timed out".to_string(),
        };
        assert_eq!(err.to_string(), "API request to u failed: timed out");
    }

    #[test]
    fn test_pagination_wraps_not_found() {
        let err = AdapterError::Pagination {
            pages: 1,
            items: 10,
            cause: Box::new(AdapterError::NotFound {
                url: "u".to_string(),
            }),
        };
        assert!(err.is_not_found());
        assert!(!err.is_cacheable());
    }
}
