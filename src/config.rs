use std::time::Duration;

use anyhow::{anyhow, Result};
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8001";

/// Process-wide client configuration. Read once at startup; immutable after.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub http_timeout_secs: u64,
    pub kpi_poll_secs: u64,
    pub tour_settle_ms: u64,
    pub narrow_breakpoint_px: u32,
    pub viewport_width_px: u32,
    pub state_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http_timeout_secs: 10,
            kpi_poll_secs: 30,
            tour_settle_ms: 400,
            narrow_breakpoint_px: 768,
            viewport_width_px: 1280,
            state_path: "./lensos.sqlite".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            api_url: std::env::var("LENSOS_API_URL").unwrap_or(d.api_url),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.http_timeout_secs),
            kpi_poll_secs: std::env::var("KPI_POLL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.kpi_poll_secs),
            tour_settle_ms: std::env::var("TOUR_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.tour_settle_ms),
            narrow_breakpoint_px: std::env::var("TOUR_NARROW_BREAKPOINT_PX").ok().and_then(|v| v.parse().ok()).unwrap_or(d.narrow_breakpoint_px),
            viewport_width_px: std::env::var("VIEWPORT_WIDTH_PX").ok().and_then(|v| v.parse().ok()).unwrap_or(d.viewport_width_px),
            state_path: std::env::var("LENSOS_STATE_PATH").unwrap_or(d.state_path),
        }
    }

    /// Parsed base URL. Only http(s) schemes are accepted.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.api_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(anyhow!("unsupported scheme {} in {}", other, self.api_url)),
        }
    }

    pub fn kpi_poll_interval(&self) -> Duration {
        Duration::from_secs(self.kpi_poll_secs.max(1))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.tour_settle_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_contract() {
        let cfg = Config::default();
        assert_eq!(cfg.kpi_poll_interval(), Duration::from_secs(30));
        assert_eq!(cfg.settle_delay(), Duration::from_millis(400));
        assert_eq!(cfg.narrow_breakpoint_px, 768);
    }

    #[test]
    fn base_url_rejects_non_http() {
        let cfg = Config { api_url: "ftp://example.com".to_string(), ..Config::default() };
        assert!(cfg.base_url().is_err());
        let cfg = Config { api_url: "https://lensos.example.com/".to_string(), ..Config::default() };
        assert_eq!(cfg.base_url().unwrap().host_str(), Some("lensos.example.com"));
    }

    #[test]
    fn zero_poll_interval_is_floored() {
        let cfg = Config { kpi_poll_secs: 0, ..Config::default() };
        assert_eq!(cfg.kpi_poll_interval(), Duration::from_secs(1));
    }
}
