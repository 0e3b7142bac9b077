//! In-memory transport for unit tests

use crate::gcp::http::{HttpClientProvider, HttpResponse};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

enum Canned {
    Response(HttpResponse),
    TransportError(String),
}

/// Canned URL -> response map; unknown URLs answer 404
#[derive(Default)]
pub struct MockHttp {
    responses: Mutex<HashMap<String, Canned>>,
    calls: Mutex<Vec<String>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, url: &str, status: u16, body: Value) -> Self {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            Canned::Response(HttpResponse::new(status, body.to_string())),
        );
        self
    }

    pub fn with_transport_error(self, url: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Canned::TransportError(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClientProvider for MockHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.responses.lock().unwrap().get(url) {
            Some(Canned::Response(response)) => Ok(response.clone()),
            Some(Canned::TransportError(message)) => Err(anyhow::anyhow!("{}", message)),
            None => Ok(HttpResponse::new(
                404,
                r#"{"error": {"code": 404, "message": "not found"}}"#,
            )),
        }
    }
}
