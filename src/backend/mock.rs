use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::backend::{ApiError, Transport};

/// One scripted response.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub delay: Duration,
    pub outcome: Result<Value, String>,
}

impl MockReply {
    pub fn ok(value: Value) -> Self {
        Self { delay: Duration::ZERO, outcome: Ok(value) }
    }

    pub fn err(msg: &str) -> Self {
        Self { delay: Duration::ZERO, outcome: Err(msg.to_string()) }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct Route {
    queue: VecDeque<MockReply>,
    fallback: Option<MockReply>,
}

/// In-process stand-in for the LensOS API.
///
/// Each path has an optional queue of one-shot replies consumed in order,
/// then a fallback reply repeated forever. Unknown paths answer HTTP 404.
/// Delays use `tokio::time::sleep`, so they respect a paused test clock.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<HashMap<String, u64>>,
    bodies: Mutex<Vec<(String, Value)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the repeating reply for `path`.
    pub fn on(&self, path: &str, value: Value) {
        self.set_fallback(path, MockReply::ok(value));
    }

    pub fn on_err(&self, path: &str, msg: &str) {
        self.set_fallback(path, MockReply::err(msg));
    }

    pub fn set_fallback(&self, path: &str, reply: MockReply) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.entry(path.to_string()).or_default().fallback = Some(reply);
        }
    }

    /// Queues a one-shot reply ahead of the fallback.
    pub fn push(&self, path: &str, reply: MockReply) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.entry(path.to_string()).or_default().queue.push_back(reply);
        }
    }

    pub fn calls(&self, path: &str) -> u64 {
        self.calls
            .lock()
            .map(|c| c.get(path).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// POST bodies received, in arrival order.
    pub fn bodies(&self) -> Vec<(String, Value)> {
        self.bodies.lock().map(|b| b.clone()).unwrap_or_default()
    }

    async fn answer(&self, path: &str) -> Result<Value> {
        let reply = {
            let mut calls = self.calls.lock().map_err(|_| anyhow!("mock call log poisoned"))?;
            *calls.entry(path.to_string()).or_insert(0) += 1;
            let mut routes = self.routes.lock().map_err(|_| anyhow!("mock routes poisoned"))?;
            routes
                .get_mut(path)
                .and_then(|r| r.queue.pop_front().or_else(|| r.fallback.clone()))
        };
        let Some(reply) = reply else {
            return Err(ApiError::Status { status: 404, path: path.to_string() }.into());
        };
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.outcome.map_err(|msg| ApiError::Transport(msg).into())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_json(&self, path: &str) -> Result<Value> {
        self.answer(path).await
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value> {
        if let Ok(mut bodies) = self.bodies.lock() {
            bodies.push((path.to_string(), body));
        }
        self.answer(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn queued_replies_precede_fallback() {
        let mock = MockTransport::new();
        mock.on("/x", json!(1));
        mock.push("/x", MockReply::ok(json!(0)));
        assert_eq!(mock.get_json("/x").await.unwrap(), json!(0));
        assert_eq!(mock.get_json("/x").await.unwrap(), json!(1));
        assert_eq!(mock.get_json("/x").await.unwrap(), json!(1));
        assert_eq!(mock.calls("/x"), 3);
    }

    #[tokio::test]
    async fn post_bodies_are_recorded() {
        let mock = MockTransport::new();
        mock.on_err("/y", "connection reset");
        assert!(mock.post_json("/y", json!({ "a": 1 })).await.is_err());
        assert_eq!(mock.bodies(), vec![("/y".to_string(), json!({ "a": 1 }))]);
    }
}
