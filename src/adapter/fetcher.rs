//! Response Fetcher
//!
//! Issues GET requests through the injected transport, decodes JSON bodies
//! and follows `nextPageToken` continuation for list and search endpoints.

use crate::gcp::http::{gcp_error_message, sanitize_for_log, HttpClientProvider};
use crate::sdp::AdapterError;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Upper bound on pages followed for one query
pub const DEFAULT_MAX_PAGES: usize = 1000;

const PAGE_TOKEN_FIELD: &str = "nextPageToken";
const AGGREGATED_WARNING_FIELD: &str = "warning";

/// Fetches and decodes API responses
#[derive(Clone)]
pub struct Fetcher {
    http: Arc<dyn HttpClientProvider>,
    max_pages: usize,
}

impl Fetcher {
    pub fn new(http: Arc<dyn HttpClientProvider>) -> Self {
        Self {
            http,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Fetch one URL and decode its body
    pub async fn fetch(&self, ctx: &CancellationToken, url: &str) -> Result<Value, AdapterError> {
        if ctx.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }

        tracing::debug!("fetching {}", url);
        let response = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(AdapterError::Cancelled),
            response = self.http.get(url) => response,
        };

        let response = response.map_err(|err| AdapterError::Upstream {
            url: url.to_string(),
            status: None,
            message: format!("{:#}", err),
        })?;

        if response.status == 404 {
            tracing::debug!("not found: {}", url);
            return Err(AdapterError::NotFound {
                url: url.to_string(),
            });
        }

        if !response.is_success() {
            return Err(api_error(url, response.status, &response.body_text()));
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_slice(&response.body).map_err(|err| AdapterError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        })
    }

    /// Walk every page of a list/search endpoint
    ///
    /// `on_page` receives the unwrapped resources of each page as soon as it
    /// arrives. Returns the number of pages read. A failure after the first
    /// page is reported as [`AdapterError::Pagination`]; cancellation is
    /// checked before every page.
    pub async fn for_each_page<F>(
        &self,
        ctx: &CancellationToken,
        url: &str,
        list_key: &str,
        mut on_page: F,
    ) -> Result<usize, AdapterError>
    where
        F: FnMut(Vec<Value>) -> Result<(), AdapterError> + Send,
    {
        let mut pages = 0;
        let mut items = 0;
        let mut seen_tokens = HashSet::new();
        let mut page_url = url.to_string();

        loop {
            if ctx.is_cancelled() {
                return Err(AdapterError::Cancelled);
            }

            let body = match self.fetch(ctx, &page_url).await {
                Ok(body) => body,
                Err(AdapterError::Cancelled) => return Err(AdapterError::Cancelled),
                Err(err) if pages == 0 => return Err(err),
                Err(err) => {
                    return Err(AdapterError::Pagination {
                        pages,
                        items,
                        cause: Box::new(err),
                    })
                },
            };

            let page = unwrap_envelope(&page_url, &body, list_key)?;
            pages += 1;
            items += page.len();
            tracing::debug!("page {} of {}: {} item(s)", pages, url, page.len());
            on_page(page)?;

            let Some(token) = body
                .get(PAGE_TOKEN_FIELD)
                .and_then(Value::as_str)
                .filter(|token| !token.is_empty())
            else {
                break;
            };

            if !seen_tokens.insert(token.to_string()) {
                tracing::warn!(
                    "{} returned page token {:?} twice, stopping after {} page(s)",
                    url,
                    token,
                    pages
                );
                break;
            }

            if pages >= self.max_pages {
                return Err(AdapterError::Pagination {
                    pages,
                    items,
                    cause: Box::new(AdapterError::configuration(format!(
                        "page limit of {} reached",
                        self.max_pages
                    ))),
                });
            }

            page_url = with_page_token(url, token);
        }

        Ok(pages)
    }

    /// Fetch all pages and concatenate their resources
    pub async fn fetch_all(
        &self,
        ctx: &CancellationToken,
        url: &str,
        list_key: &str,
    ) -> Result<Vec<Value>, AdapterError> {
        let mut all_items = Vec::new();
        self.for_each_page(ctx, url, list_key, |page| {
            all_items.extend(page);
            Ok(())
        })
        .await?;
        Ok(all_items)
    }
}

/// Append `pageToken` to a URL that may already carry a query string
pub fn with_page_token(url: &str, token: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}pageToken={}", url, separator, urlencoding::encode(token))
}

/// Pull the resources out of a list envelope
///
/// A missing key is an empty page. When the key holds an object, the body is
/// an aggregated list (`{"zones/us-central1-a": {"instances": [...]}}`) and
/// every per-location array is collected, skipping `warning` entries.
pub fn unwrap_envelope(url: &str, body: &Value, list_key: &str) -> Result<Vec<Value>, AdapterError> {
    let decode_error = |message: String| AdapterError::Decode {
        url: url.to_string(),
        message,
    };

    let Some(envelope) = body.as_object() else {
        return Err(decode_error("list response is not a JSON object".to_string()));
    };

    match envelope.get(list_key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(Value::Object(scoped)) => Ok(scoped
            .values()
            .filter_map(Value::as_object)
            .flat_map(|location| {
                location
                    .iter()
                    .filter(|(key, _)| key.as_str() != AGGREGATED_WARNING_FIELD)
                    .filter_map(|(_, value)| value.as_array())
                    .flatten()
                    .cloned()
            })
            .collect()),
        Some(other) => Err(decode_error(format!(
            "field {:?} is neither an array nor an aggregated map: {}",
            list_key,
            sanitize_for_log(&other.to_string())
        ))),
    }
}

/// Map a non-2xx response to an upstream error, logging the sanitized message
fn api_error(url: &str, status: u16, body: &str) -> AdapterError {
    let message = sanitize_for_log(&gcp_error_message(body).unwrap_or_else(|| body.to_string()));
    tracing::error!("API error from {}: {} - {}", url, status, message);
    AdapterError::Upstream {
        url: url.to_string(),
        status: Some(status),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::testing::MockHttp;
    use serde_json::json;

    const LIST_URL: &str = "https://compute.googleapis.com/compute/v1/projects/p/global/networks";

    fn fetcher(mock: MockHttp) -> (Fetcher, Arc<MockHttp>) {
        let mock = Arc::new(mock);
        (Fetcher::new(mock.clone()), mock)
    }

    #[test]
    fn test_with_page_token() {
        assert_eq!(with_page_token("https://x/a", "t1"), "https://x/a?pageToken=t1");
        assert_eq!(
            with_page_token("https://x/a?filter=b", "t/2="),
            "https://x/a?filter=b&pageToken=t%2F2%3D"
        );
    }

    #[test]
    fn test_unwrap_envelope() {
        let body = json!({"items": [{"name": "a"}, {"name": "b"}]});
        assert_eq!(unwrap_envelope("u", &body, "items").unwrap().len(), 2);
        assert!(unwrap_envelope("u", &json!({}), "items").unwrap().is_empty());
        assert!(unwrap_envelope("u", &json!([]), "items").is_err());
        assert!(unwrap_envelope("u", &json!({"items": "x"}), "items").is_err());
    }

    #[test]
    fn test_unwrap_aggregated_envelope() {
        let body = json!({
            "items": {
                "zones/us-central1-a": {"instances": [{"name": "a"}]},
                "zones/us-central1-b": {"warning": {"code": "NO_RESULTS_ON_PAGE"}},
                "zones/us-central1-c": {"instances": [{"name": "c"}, {"name": "d"}]}
            }
        });
        let items = unwrap_envelope("u", &body, "items").unwrap();
        let names: Vec<&str> = items.iter().filter_map(|i| i["name"].as_str()).collect();
        assert_eq!(names, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_api_error_message_is_sanitized() {
        let err = api_error("https://x/denied", 403, "{\"error\": {\"message\": \"denied\\nfor caller\"}}");
        assert_eq!(
            err,
            AdapterError::Upstream {
                url: "https://x/denied".to_string(),
                status: Some(403),
                message: "deniedfor caller".to_string(),
            }
        );

        let err = api_error("https://x/raw", 502, "bad\tgateway");
        assert!(matches!(err, AdapterError::Upstream { message, .. } if message == "badgateway"));
    }

    #[tokio::test]
    async fn test_fetch_not_found_and_upstream() {
        let (fetcher, _) = fetcher(
            MockHttp::new()
                .with_json("https://x/broken", 500, json!({"error": {"message": "backend"}}))
                .with_transport_error("https://x/timeout", "operation timed out"),
        );
        let ctx = CancellationToken::new();

        let err = fetcher.fetch(&ctx, "https://x/missing").await.unwrap_err();
        assert!(err.is_not_found());

        let err = fetcher.fetch(&ctx, "https://x/broken").await.unwrap_err();
        assert_eq!(
            err,
            AdapterError::Upstream {
                url: "https://x/broken".to_string(),
                status: Some(500),
                message: "backend".to_string(),
            }
        );

        let err = fetcher.fetch(&ctx, "https://x/timeout").await.unwrap_err();
        assert!(matches!(err, AdapterError::Upstream { status: None, .. }));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_all_follows_page_tokens() {
        let (fetcher, mock) = fetcher(
            MockHttp::new()
                .with_json(LIST_URL, 200, json!({"items": [{"name": "a"}, {"name": "b"}], "nextPageToken": "t1"}))
                .with_json(&format!("{}?pageToken=t1", LIST_URL), 200, json!({"items": [{"name": "c"}]})),
        );

        let items = fetcher
            .fetch_all(&CancellationToken::new(), LIST_URL, "items")
            .await
            .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_page_token_stops() {
        let (fetcher, mock) = fetcher(
            MockHttp::new()
                .with_json(LIST_URL, 200, json!({"items": [{"name": "a"}], "nextPageToken": "loop"}))
                .with_json(
                    &format!("{}?pageToken=loop", LIST_URL),
                    200,
                    json!({"items": [{"name": "b"}], "nextPageToken": "loop"}),
                ),
        );

        let items = fetcher
            .fetch_all(&CancellationToken::new(), LIST_URL, "items")
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_page_cap_is_an_error() {
        let (fetcher, _) = fetcher(
            MockHttp::new()
                .with_json(LIST_URL, 200, json!({"items": [{"name": "a"}], "nextPageToken": "t1"})),
        );
        let fetcher = fetcher.with_max_pages(1);

        let err = fetcher
            .fetch_all(&CancellationToken::new(), LIST_URL, "items")
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Pagination { pages: 1, items: 1, .. }));
    }

    #[tokio::test]
    async fn test_failure_on_second_page_is_pagination_error() {
        let (fetcher, _) = fetcher(
            MockHttp::new()
                .with_json(LIST_URL, 200, json!({"items": [{"name": "a"}], "nextPageToken": "t1"}))
                .with_json(
                    &format!("{}?pageToken=t1", LIST_URL),
                    503,
                    json!({"error": {"message": "unavailable"}}),
                ),
        );

        let err = fetcher
            .fetch_all(&CancellationToken::new(), LIST_URL, "items")
            .await
            .unwrap_err();
        match err {
            AdapterError::Pagination { pages, items, cause } => {
                assert_eq!((pages, items), (1, 1));
                assert!(matches!(*cause, AdapterError::Upstream { status: Some(503), .. }));
            },
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_cancelled_before_first_page() {
        let (fetcher, mock) = fetcher(MockHttp::new().with_json(LIST_URL, 200, json!({"items": []})));
        let ctx = CancellationToken::new();
        ctx.cancel();

        let err = tokio_test::block_on(fetcher.fetch_all(&ctx, LIST_URL, "items")).unwrap_err();
        assert_eq!(err, AdapterError::Cancelled);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_between_pages() {
        let (fetcher, mock) = fetcher(
            MockHttp::new()
                .with_json(LIST_URL, 200, json!({"items": [{"name": "a"}], "nextPageToken": "t1"}))
                .with_json(&format!("{}?pageToken=t1", LIST_URL), 200, json!({"items": [{"name": "b"}]})),
        );
        let ctx = CancellationToken::new();

        let err = fetcher
            .for_each_page(&ctx, LIST_URL, "items", |_| {
                ctx.cancel();
                Ok(())
            })
            .await
            .unwrap_err();
        assert_eq!(err, AdapterError::Cancelled);
        assert_eq!(mock.calls().len(), 1);
    }
}
