//! GCP Client
//!
//! Combines a token source with the HTTP client and serves as the transport
//! handed to adapters.

use super::auth::TokenSource;
use super::http::{GcpHttpClient, HttpClientProvider, HttpResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub tokens: TokenSource,
    pub http: GcpHttpClient,
}

impl GcpClient {
    /// Create a client authenticated from the environment
    pub async fn new(timeout: Duration) -> Result<Self> {
        let tokens = TokenSource::from_environment()
            .await
            .context("Failed to initialize GCP credentials")?;

        Ok(Self {
            tokens,
            http: GcpHttpClient::new(timeout)?,
        })
    }

    /// Create a client with an explicit token source
    pub fn with_tokens(tokens: TokenSource, timeout: Duration) -> Result<Self> {
        Ok(Self {
            tokens,
            http: GcpHttpClient::new(timeout)?,
        })
    }
}

#[async_trait]
impl HttpClientProvider for GcpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let token = self.tokens.token().await?;
        self.http.get(url, token.as_deref()).await
    }
}
