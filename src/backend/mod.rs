use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod http;
pub mod mock;
pub mod types;

pub use http::HttpClient;
pub use mock::{MockReply, MockTransport};

pub const PATH_KPIS: &str = "/api/kpis";
pub const PATH_CAPACITY: &str = "/api/capacity";
pub const PATH_PRODUCTION: &str = "/api/production";
pub const PATH_CONFIDENCE: &str = "/api/confidence";
pub const PATH_RISK: &str = "/api/risk";
pub const PATH_ALLOCATION: &str = "/api/allocation";
pub const PATH_INSIGHTS: &str = "/api/insights";
pub const PATH_BRIEF: &str = "/api/brief";
pub const PATH_PREDICT: &str = "/api/predict";
pub const PATH_SCENARIO: &str = "/api/scenario";
pub const PATH_HEALTH: &str = "/health";

/// JSON request/response seam between the dashboard and the LensOS API.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value>;
    async fn post_json(&self, path: &str, body: Value) -> Result<Value>;
}

/// Failure classes surfaced by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connection refused, timeout, reset.
    Transport(String),
    /// Non-2xx response.
    Status { status: u16, path: String },
    /// Body was not the expected shape.
    Decode(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "transport",
            ApiError::Status { .. } => "status",
            ApiError::Decode(_) => "decode",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "transport error: {}", msg),
            ApiError::Status { status, path } => write!(f, "{} returned HTTP {}", path, status),
            ApiError::Decode(msg) => write!(f, "unexpected response shape: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Classification used in log records; errors that did not come from a
/// transport are reported as "other".
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<ApiError>().map(ApiError::kind).unwrap_or("other")
}

pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()).into())
}

pub async fn get<T: DeserializeOwned>(transport: &dyn Transport, path: &str) -> Result<T> {
    decode(transport.get_json(path).await?)
}

pub async fn post<T: DeserializeOwned>(transport: &dyn Transport, path: &str, body: Value) -> Result<T> {
    decode(transport.post_json(path, body).await?)
}

/// Liveness probe against `/health`.
pub async fn health(transport: &dyn Transport) -> Result<types::Health> {
    get(transport, PATH_HEALTH).await
}
