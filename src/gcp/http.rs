//! HTTP utilities for GCP REST API calls

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::sdp::AdapterError;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Raw answer of a GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport used by adapters
///
/// Implementations own authentication and timeouts. A returned error is a
/// transport failure; HTTP error statuses come back as responses.
#[async_trait]
pub trait HttpClientProvider: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("gcp-adapters/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request, optionally authenticated with a bearer token
    pub async fn get(&self, url: &str, token: Option<&str>) -> Result<HttpResponse> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::debug!(
                "API error: {} - {}",
                status,
                sanitize_for_log(&String::from_utf8_lossy(&body))
            );
        }

        Ok(HttpResponse::new(status.as_u16(), body.to_vec()))
    }
}

/// Extract the `error.message` of a GCP error body, if present
pub fn gcp_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Format an adapter error for display
/// Security: Generic messages avoid leaking API structure details
pub fn format_gcp_error(error: &AdapterError) -> String {
    match error {
        AdapterError::NotFound { .. } => "Resource not found.".to_string(),
        AdapterError::Upstream {
            status: Some(401), ..
        } => "Authentication failed. Run 'gcloud auth application-default login'.".to_string(),
        AdapterError::Upstream {
            status: Some(403), ..
        } => "Permission denied. Check your GCP IAM permissions.".to_string(),
        AdapterError::Upstream {
            status: Some(429), ..
        } => "Rate limit exceeded. Please try again later.".to_string(),
        AdapterError::Upstream {
            status: Some(400), ..
        } => "Invalid request. Check your parameters.".to_string(),
        AdapterError::Upstream {
            status: Some(500..=599),
            ..
        } => "GCP service temporarily unavailable. Please try again.".to_string(),
        AdapterError::Upstream { status: None, .. } => {
            "Request failed. Check your network connection and try again.".to_string()
        },
        AdapterError::Pagination { cause, .. } => format_gcp_error(cause),
        other => {
            let message = other.to_string();
            let sanitized = message
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(120)
                .collect::<String>();
            if sanitized.len() < message.len() {
                format!("{}...", sanitized)
            } else {
                sanitized
            }
        },
    }
}
