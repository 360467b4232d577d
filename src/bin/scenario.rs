//! Runs one what-if scenario against the configured backend.
//!
//! Usage: scenario [DEMAND_MULT] [PRICE_MULT] [CAPACITY_PCT]

use std::sync::Arc;

use anyhow::{anyhow, Result};

use lensdash::backend::{HttpClient, Transport};
use lensdash::compute::scenario::comparison;
use lensdash::compute::{FlowState, Outcome, ScenarioParams, Simulator};
use lensdash::config::Config;

fn arg(n: usize, default: f64) -> f64 {
    std::env::args()
        .nth(n)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let transport: Arc<dyn Transport> = Arc::new(HttpClient::new(&cfg)?);
    let sim: Simulator<ScenarioParams> = Simulator::new(transport);
    sim.update_params(|p| *p = ScenarioParams::new(arg(1, 1.0), arg(2, 1.0), arg(3, 0.0)));

    sim.run().await?;
    let snap = sim.snapshot();
    if snap.state != FlowState::Settled(Outcome::Success) {
        return Err(anyhow!("scenario request failed"));
    }
    let Some(result) = snap.result else {
        return Err(anyhow!("scenario returned no result"));
    };

    println!(
        "demand x{:.2}  price x{:.2}  capacity {:+.0}%",
        snap.params.demand_multiplier(),
        snap.params.price_multiplier(),
        snap.params.capacity_change_pct()
    );
    println!("{:<14} {:>14} {:>14} {:>10}", "Metric", "Baseline", "Scenario", "Delta");
    println!("{}", "-".repeat(56));
    for row in comparison(&result) {
        println!("{:<14} {:>14} {:>14} {:>10}", row.metric, row.baseline, row.scenario, row.delta);
    }
    Ok(())
}
