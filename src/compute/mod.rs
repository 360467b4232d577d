//! Request/response lifecycle of the interactive "what-if" panels.
//!
//! A flow is Idle until the user submits, Pending while the request is in
//! flight, then Settled with either a success or a failure. Submitting while
//! Pending is rejected; the UI disables the trigger off `can_submit`. Each
//! accepted submit bumps a generation counter and only the completion for the
//! current generation is applied, so a late reply after `reset` (or from an
//! earlier request) cannot overwrite newer state.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::backend::{self, error_kind, Transport};
use crate::error::TransitionError;
use crate::logging::{log_compute, v_str};

pub mod launch;
pub mod scenario;

pub use launch::{FrameType, LaunchSimParams, LensType, PriceBand};
pub use scenario::ScenarioParams;

/// A parameter set that can be sent to a compute endpoint.
pub trait ComputeRequest: Clone + Default + Send + Sync + 'static {
    type Output: DeserializeOwned + Clone + Send + Sync + 'static;

    /// Flow name used in logs.
    const FLOW: &'static str;
    const PATH: &'static str;

    fn body(&self) -> Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "outcome")]
pub enum FlowState {
    Idle,
    Pending,
    Settled(Outcome),
}

/// Proof of an accepted submit; carries the params snapshot that was sent.
#[derive(Debug, Clone)]
pub struct Ticket<P> {
    pub generation: u64,
    pub params: P,
}

#[derive(Debug, Clone)]
pub struct ComputeFlow<P: ComputeRequest> {
    params: P,
    state: FlowState,
    result: Option<P::Output>,
    generation: u64,
    last_error: Option<String>,
}

impl<P: ComputeRequest> Default for ComputeFlow<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ComputeRequest> ComputeFlow<P> {
    pub fn new() -> Self {
        Self {
            params: P::default(),
            state: FlowState::Idle,
            result: None,
            generation: 0,
            last_error: None,
        }
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut P {
        &mut self.params
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn result(&self) -> Option<&P::Output> {
        self.result.as_ref()
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.state != FlowState::Pending
    }

    pub fn submit(&mut self) -> Result<Ticket<P>, TransitionError> {
        if !self.can_submit() {
            log_compute(P::FLOW, "submit_rejected", self.generation, &[("reason", v_str("pending"))]);
            return Err(TransitionError::new("request already pending"));
        }
        self.generation += 1;
        self.state = FlowState::Pending;
        log_compute(P::FLOW, "submit", self.generation, &[("params", self.params.body())]);
        Ok(Ticket { generation: self.generation, params: self.params.clone() })
    }

    /// Applies a completion. Returns false when it was discarded as stale.
    pub fn settle(&mut self, generation: u64, outcome: Result<P::Output>) -> bool {
        if generation != self.generation || self.state != FlowState::Pending {
            log_compute(P::FLOW, "settle_discarded", generation, &[("current", json!(self.generation))]);
            return false;
        }
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.last_error = None;
                self.state = FlowState::Settled(Outcome::Success);
                log_compute(P::FLOW, "settled", generation, &[]);
            }
            Err(err) => {
                // prior result stays on screen
                self.last_error = Some(err.to_string());
                self.state = FlowState::Settled(Outcome::Failure);
                log_compute(
                    P::FLOW,
                    "request_failed",
                    generation,
                    &[("kind", v_str(error_kind(&err))), ("msg", v_str(&err.to_string()))],
                );
            }
        }
        true
    }

    /// Restores default params, drops any result, returns to Idle.
    pub fn reset(&mut self) {
        self.params = P::default();
        self.result = None;
        self.last_error = None;
        self.state = FlowState::Idle;
        self.generation += 1;
        log_compute(P::FLOW, "reset", self.generation, &[]);
    }
}

/// Point-in-time copy of a flow for rendering.
#[derive(Debug, Clone)]
pub struct FlowSnapshot<P: ComputeRequest> {
    pub params: P,
    pub state: FlowState,
    pub result: Option<P::Output>,
    pub can_submit: bool,
}

/// A compute flow bound to a transport, shared between the UI and the task
/// performing the request.
pub struct Simulator<P: ComputeRequest> {
    flow: Arc<Mutex<ComputeFlow<P>>>,
    transport: Arc<dyn Transport>,
}

impl<P: ComputeRequest> Clone for Simulator<P> {
    fn clone(&self) -> Self {
        Self { flow: self.flow.clone(), transport: self.transport.clone() }
    }
}

impl<P: ComputeRequest> Simulator<P> {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { flow: Arc::new(Mutex::new(ComputeFlow::new())), transport }
    }

    fn lock(&self) -> MutexGuard<'_, ComputeFlow<P>> {
        self.flow.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> FlowSnapshot<P> {
        let flow = self.lock();
        FlowSnapshot {
            params: flow.params.clone(),
            state: flow.state,
            result: flow.result.clone(),
            can_submit: flow.can_submit(),
        }
    }

    pub fn update_params(&self, f: impl FnOnce(&mut P)) {
        f(self.lock().params_mut());
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Accepts the submit synchronously, so the control is disabled before
    /// this returns, then performs the request on a spawned task.
    pub fn submit(&self) -> Result<JoinHandle<bool>, TransitionError> {
        let ticket = self.lock().submit()?;
        let this = self.clone();
        Ok(tokio::spawn(async move { this.perform(ticket).await }))
    }

    /// Submit and wait for the completion to be applied.
    pub async fn run(&self) -> Result<bool, TransitionError> {
        let ticket = self.lock().submit()?;
        Ok(self.perform(ticket).await)
    }

    async fn perform(&self, ticket: Ticket<P>) -> bool {
        let outcome = backend::post::<P::Output>(self.transport.as_ref(), P::PATH, ticket.params.body()).await;
        self.lock().settle(ticket.generation, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Echo {
        n: u32,
    }

    impl ComputeRequest for Echo {
        type Output = u32;
        const FLOW: &'static str = "echo";
        const PATH: &'static str = "/api/echo";

        fn body(&self) -> Value {
            json!({ "n": self.n })
        }
    }

    #[test]
    fn submit_rejected_while_pending() {
        let mut flow = ComputeFlow::<Echo>::new();
        let t = flow.submit().unwrap();
        assert_eq!(flow.state(), FlowState::Pending);
        assert!(!flow.can_submit());
        assert!(flow.submit().is_err());
        assert_eq!(flow.generation(), t.generation);
    }

    #[test]
    fn single_success_settles_once() {
        let mut flow = ComputeFlow::<Echo>::new();
        assert!(!flow.has_result());
        let t = flow.submit().unwrap();
        assert!(flow.settle(t.generation, Ok(7)));
        assert_eq!(flow.state(), FlowState::Settled(Outcome::Success));
        assert_eq!(flow.result(), Some(&7));
        // a duplicate completion is not applied twice
        assert!(!flow.settle(t.generation, Ok(8)));
        assert_eq!(flow.result(), Some(&7));
    }

    #[test]
    fn failure_keeps_prior_result() {
        let mut flow = ComputeFlow::<Echo>::new();
        let t = flow.submit().unwrap();
        flow.settle(t.generation, Ok(3));
        let t = flow.submit().unwrap();
        flow.settle(t.generation, Err(anyhow!("boom")));
        assert_eq!(flow.state(), FlowState::Settled(Outcome::Failure));
        assert_eq!(flow.result(), Some(&3));
        assert_eq!(flow.last_error(), Some("boom"));
        assert!(flow.can_submit());
    }

    #[test]
    fn reset_discards_late_completion() {
        let mut flow = ComputeFlow::<Echo>::new();
        flow.params_mut().n = 9;
        let t = flow.submit().unwrap();
        flow.reset();
        assert_eq!(flow.params(), &Echo::default());
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(!flow.settle(t.generation, Ok(1)));
        assert!(!flow.has_result());
    }

    #[test]
    fn ticket_carries_params_snapshot() {
        let mut flow = ComputeFlow::<Echo>::new();
        flow.params_mut().n = 4;
        let t = flow.submit().unwrap();
        flow.params_mut().n = 5;
        assert_eq!(t.params, Echo { n: 4 });
    }
}
