use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::time::{sleep, Instant};

use crate::error::TransitionError;
use crate::logging::{log, log_transition, obj, v_str, Domain, Level};
use crate::storage::FlagStore;
use crate::tour::scroll::{ScrollCoordinator, ScrollOutcome, Viewport};
use crate::tour::steps::{effective_placement, Placement, TourStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    Completed,
    Skipped,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Completed => "completed",
            FinishReason::Skipped => "skipped",
        }
    }
}

/// Input from the walkthrough UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourEvent {
    Next,
    Back,
    Skip,
    Close,
    /// The callout could not anchor to the current target.
    TargetNotFound,
}

/// `step_index` is only meaningful while `running`; it is 0 whenever idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TourRunState {
    pub step_index: usize,
    pub running: bool,
}

/// A step change whose scroll has been issued but whose index is not yet
/// applied. Hand it back to [`TourEngine::complete`] after the settle delay.
#[derive(Debug)]
pub struct PendingTransition {
    id: u64,
    pub from: usize,
    pub to: usize,
    pub scroll: ScrollOutcome,
}

#[derive(Debug)]
pub enum Advance {
    Pending(PendingTransition),
    Finished(FinishReason),
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Moved { from: usize, to: usize, scroll: ScrollOutcome },
    Finished(FinishReason),
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingSlot {
    id: u64,
    settles_at: Instant,
}

/// Clears the pending slot if the owning `advance` future is dropped before
/// its transition completes.
struct ClearOnCancel<'a> {
    slot: &'a mut Option<PendingSlot>,
    id: u64,
    armed: bool,
}

impl ClearOnCancel<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ClearOnCancel<'_> {
    fn drop(&mut self) {
        if self.armed && self.slot.map(|s| s.id) == Some(self.id) {
            *self.slot = None;
            log(Level::Debug, Domain::Tour, "transition_cancelled", obj(&[("id", json!(self.id))]));
        }
    }
}

/// Step sequencer for the first-run walkthrough.
///
/// Idle and Running are the only states. Running ends through `finish`,
/// which always records the walkthrough as seen.
pub struct TourEngine<F: FlagStore> {
    steps: Vec<TourStep>,
    state: TourRunState,
    flag: F,
    settle: Duration,
    narrow_breakpoint: u32,
    pending: Option<PendingSlot>,
    next_transition_id: u64,
}

impl<F: FlagStore> TourEngine<F> {
    pub fn new(steps: Vec<TourStep>, flag: F, settle: Duration) -> Self {
        Self {
            steps,
            state: TourRunState::default(),
            flag,
            settle,
            narrow_breakpoint: 768,
            pending: None,
            next_transition_id: 0,
        }
    }

    pub fn with_breakpoint(mut self, px: u32) -> Self {
        self.narrow_breakpoint = px;
        self
    }

    pub fn state(&self) -> TourRunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[TourStep] {
        &self.steps
    }

    pub fn flag(&self) -> &F {
        &self.flag
    }

    pub fn current_step(&self) -> Option<&TourStep> {
        if self.state.running {
            self.steps.get(self.state.step_index)
        } else {
            None
        }
    }

    /// Placement for the current callout at the given viewport width.
    pub fn current_placement(&self, viewport_width: u32) -> Option<Placement> {
        self.current_step()
            .map(|step| effective_placement(step, viewport_width, self.narrow_breakpoint))
    }

    /// Start-up check: runs the walkthrough unless it has been seen.
    /// An unreadable flag counts as unset.
    pub fn boot(&mut self) -> bool {
        match self.flag.get() {
            Ok(true) => {
                log(Level::Debug, Domain::Tour, "boot_skip", obj(&[("reason", v_str("already_seen"))]));
                false
            }
            Ok(false) => {
                self.start();
                self.state.running
            }
            Err(err) => {
                log(
                    Level::Warn,
                    Domain::Tour,
                    "flag_read_failed",
                    obj(&[("msg", v_str(&err.to_string()))]),
                );
                self.start();
                self.state.running
            }
        }
    }

    /// Starts (or restarts) from the first step regardless of the flag.
    pub fn start(&mut self) {
        if self.steps.is_empty() {
            log(Level::Warn, Domain::Tour, "start_ignored", obj(&[("reason", v_str("no_steps"))]));
            return;
        }
        self.state = TourRunState { step_index: 0, running: true };
        self.pending = None;
        log_transition("start", 0, self.steps.len(), "");
    }

    /// Issues the scroll for the neighbouring step and returns the pending
    /// transition. Running off either end finishes the walkthrough instead.
    pub fn begin_advance(
        &mut self,
        direction: Direction,
        viewport: &mut dyn Viewport,
    ) -> Result<Advance, TransitionError> {
        if !self.state.running {
            return Ok(Advance::Ignored);
        }
        // a transition nobody completed stops blocking once its settle delay is over
        if let Some(slot) = self.pending {
            if Instant::now() < slot.settles_at {
                return Err(TransitionError::new("transition already pending"));
            }
            log(Level::Debug, Domain::Tour, "transition_abandoned", obj(&[("id", json!(slot.id))]));
            self.pending = None;
        }
        let from = self.state.step_index;
        let next = match direction {
            Direction::Forward => from.checked_add(1),
            Direction::Backward => from.checked_sub(1),
        };
        let to = match next {
            None => return Ok(Advance::Finished(self.finish(FinishReason::Skipped))),
            Some(n) if n >= self.steps.len() => {
                return Ok(Advance::Finished(self.finish(FinishReason::Completed)))
            }
            Some(n) => n,
        };

        let scroll = ScrollCoordinator::prepare(viewport, &self.steps[to].target);
        let id = self.next_transition_id;
        self.next_transition_id += 1;
        self.pending = Some(PendingSlot { id, settles_at: Instant::now() + self.settle });
        Ok(Advance::Pending(PendingTransition { id, from, to, scroll }))
    }

    /// Applies a pending transition. Stale transitions (superseded by a
    /// finish or restart during the settle delay) are dropped.
    pub fn complete(&mut self, pending: PendingTransition) -> Transition {
        if self.pending.map(|s| s.id) != Some(pending.id) || !self.state.running {
            log(
                Level::Debug,
                Domain::Tour,
                "transition_dropped",
                obj(&[("to", json!(pending.to))]),
            );
            return Transition::Ignored;
        }
        self.pending = None;
        self.state.step_index = pending.to;
        let detail = match &pending.scroll {
            ScrollOutcome::Unchanged => "unchanged",
            ScrollOutcome::Centered { .. } => "centered",
            ScrollOutcome::FellBackToTop => "fallback_top",
        };
        log_transition("step", pending.to, self.steps.len(), detail);
        Transition::Moved { from: pending.from, to: pending.to, scroll: pending.scroll }
    }

    /// Scroll, wait for the settle delay, then move the step index.
    pub async fn advance(
        &mut self,
        direction: Direction,
        viewport: &mut dyn Viewport,
    ) -> Result<Transition, TransitionError> {
        match self.begin_advance(direction, viewport)? {
            Advance::Pending(pending) => {
                let settle = self.settle;
                let guard = ClearOnCancel { slot: &mut self.pending, id: pending.id, armed: true };
                sleep(settle).await;
                guard.disarm();
                Ok(self.complete(pending))
            }
            Advance::Finished(reason) => Ok(Transition::Finished(reason)),
            Advance::Ignored => Ok(Transition::Ignored),
        }
    }

    pub async fn handle(
        &mut self,
        event: TourEvent,
        viewport: &mut dyn Viewport,
    ) -> Result<Transition, TransitionError> {
        match event {
            // a missing target still moves on; the scroll fallback covers it
            TourEvent::Next | TourEvent::TargetNotFound => {
                self.advance(Direction::Forward, viewport).await
            }
            TourEvent::Back => self.advance(Direction::Backward, viewport).await,
            TourEvent::Skip | TourEvent::Close => {
                if !self.state.running {
                    return Ok(Transition::Ignored);
                }
                Ok(Transition::Finished(self.finish(FinishReason::Skipped)))
            }
        }
    }

    /// Ends the walkthrough and records it as seen. Safe to call repeatedly.
    pub fn finish(&mut self, reason: FinishReason) -> FinishReason {
        let last_step = self.state.step_index;
        self.state = TourRunState::default();
        self.pending = None;
        if let Err(err) = self.flag.set() {
            log(
                Level::Warn,
                Domain::Persist,
                "flag_write_failed",
                obj(&[("msg", v_str(&err.to_string()))]),
            );
        }
        log_transition("finish", last_step, self.steps.len(), reason.as_str());
        reason
    }
}
