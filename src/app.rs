use std::sync::Arc;

use serde_json::json;

use crate::backend::Transport;
use crate::compute::{LaunchSimParams, ScenarioParams, Simulator};
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::storage::FlagStore;
use crate::tour::{dashboard_steps, TourEngine};

/// The mounted client: panels, simulators and the walkthrough.
pub struct App<F: FlagStore> {
    pub config: Config,
    pub dashboard: Dashboard,
    pub scenario: Simulator<ScenarioParams>,
    pub launch: Simulator<LaunchSimParams>,
    pub tour: TourEngine<F>,
}

impl<F: FlagStore> App<F> {
    /// Start-up sequence: read the walkthrough flag (starting the tour when
    /// unseen), then mount every panel. Must run inside a tokio runtime.
    pub fn boot(config: Config, transport: Arc<dyn Transport>, flag: F) -> Self {
        let mut tour = TourEngine::new(dashboard_steps(), flag, config.settle_delay())
            .with_breakpoint(config.narrow_breakpoint_px);
        let tour_started = tour.boot();

        let dashboard = Dashboard::mount(transport.clone(), config.kpi_poll_interval());
        log(
            Level::Info,
            Domain::System,
            "boot",
            obj(&[
                ("api_url", v_str(&config.api_url)),
                ("tour_started", json!(tour_started)),
                ("kpi_poll_secs", json!(config.kpi_poll_secs)),
            ]),
        );
        Self {
            scenario: Simulator::new(transport.clone()),
            launch: Simulator::new(transport),
            dashboard,
            tour,
            config,
        }
    }

    pub fn shutdown(&mut self) {
        self.dashboard.unmount();
        log(Level::Info, Domain::System, "shutdown", obj(&[]));
    }
}
