//! First-run walkthrough: step data, scroll coordination and the sequencer.

pub mod engine;
pub mod scroll;
pub mod steps;

pub use engine::{Direction, FinishReason, TourEngine, TourEvent, TourRunState, Transition};
pub use scroll::{ScrollCoordinator, ScrollOutcome, Viewport, VirtualViewport};
pub use steps::{dashboard_steps, effective_placement, Placement, Target, TourStep};
