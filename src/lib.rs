//! Dashboard client for the LensOS decision-support API.
//!
//! Per-panel data orchestration, the confidence join, the two what-if
//! simulators, and the first-run walkthrough.

pub mod app;
pub mod backend;
pub mod compute;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod join;
pub mod logging;
pub mod panel;
pub mod storage;
pub mod tour;
