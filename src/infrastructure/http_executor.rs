// HTTP request executor implementation
use crate::application::client_store::ClientStore;
use crate::application::request_executor::{Method, NetworkError, RequestExecutor, RequestOptions};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const FACILITY_HEADER: &str = "x-facility-id";

#[derive(Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    base_url: String,
    store: Arc<dyn ClientStore>,
}

impl HttpExecutor {
    pub fn new(base_url: &str, timeout: Duration, store: Arc<dyn ClientStore>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Base headers, then the caller's, then auth and facility from the client store.
    fn build_headers(&self, extra: &[(String, String)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (name, value) in extra {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Skipping invalid request header"),
            }
        }

        let context = self.store.facility_context();
        if let Some(bearer) = context.bearer() {
            match HeaderValue::from_str(&bearer) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("Stored auth token is not a valid header value"),
            }
        }
        match HeaderValue::from_str(&context.facility_id) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(FACILITY_HEADER), value);
            }
            Err(_) => tracing::warn!("Stored facility id is not a valid header value"),
        }

        headers
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value, NetworkError> {
        let url = self.url_for(endpoint);
        let method = match options.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut request = self
            .client
            .request(method, &url)
            .headers(self.build_headers(&options.headers));
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.body(body.to_string());
        }

        tracing::debug!(endpoint, "Sending API request");
        let response = request.send().await.map_err(|e| {
            tracing::debug!(endpoint, "Transport failure: {}", e);
            NetworkError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| NetworkError::InvalidBody(e.to_string()))
    }
}
