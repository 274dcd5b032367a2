// Request executor trait - one network call per invocation
use crate::domain::facility::QueryParams;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("HTTP {status} {status_text}")]
    Status { status: u16, status_text: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

impl NetworkError {
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub query: QueryParams,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn get(query: QueryParams) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Issue one request against `endpoint` (relative to the API base URL)
    /// and return its parsed JSON body.
    async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value, NetworkError>;

    async fn get(&self, endpoint: &str, query: QueryParams) -> Result<Value, NetworkError> {
        self.request(endpoint, RequestOptions::get(query)).await
    }
}
