use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use crate::backend::{ApiError, Transport};
use crate::config::Config;
use crate::logging::{log, obj, v_str, Domain, Level};

/// reqwest-backed transport with a fixed base URL.
pub struct HttpClient {
    client: Client,
    base: String,
}

impl HttpClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let base = cfg.base_url()?;
        Ok(Self {
            client: Client::builder()
                .timeout(cfg.http_timeout())
                .build()
                .unwrap_or_else(|_| Client::new()),
            base: base.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn read(path: &str, resp: Response) -> Result<Value> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), path: path.to_string() }.into());
        }
        resp.json::<Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()).into())
    }
}

fn transport_err(path: &str, err: reqwest::Error) -> anyhow::Error {
    log(
        Level::Debug,
        Domain::Http,
        "transport_error",
        obj(&[("path", v_str(path)), ("msg", v_str(&err.to_string()))]),
    );
    ApiError::Transport(err.to_string()).into()
}

#[async_trait]
impl Transport for HttpClient {
    async fn get_json(&self, path: &str) -> Result<Value> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| transport_err(path, e))?;
        Self::read(path, resp).await
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value> {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_err(path, e))?;
        Self::read(path, resp).await
    }
}
