//! Forecasts demand for a new product configuration against the configured
//! backend.
//!
//! Usage: launch [FRAME_TYPE] [LENS_TYPE] [PRICE_BAND]
//!   e.g. launch rimless "blue cut" premium

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use lensdash::backend::{HttpClient, Transport};
use lensdash::compute::launch::city_bars;
use lensdash::compute::{ComputeRequest, FlowState, LaunchSimParams, Outcome, Simulator};
use lensdash::config::Config;
use lensdash::format::grouped;

/// Parses the nth argument using the backend's vocabulary for the attribute.
fn arg<T: DeserializeOwned + Default>(n: usize) -> Result<T> {
    match std::env::args().nth(n) {
        Some(v) => serde_json::from_value(Value::String(v.clone()))
            .with_context(|| format!("unrecognised value {:?}", v)),
        None => Ok(T::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let params = LaunchSimParams { frame_type: arg(1)?, lens_type: arg(2)?, price_band: arg(3)? };

    let cfg = Config::from_env();
    let transport: Arc<dyn Transport> = Arc::new(HttpClient::new(&cfg)?);
    let sim: Simulator<LaunchSimParams> = Simulator::new(transport);
    sim.update_params(|p| *p = params);

    sim.run().await?;
    let snap = sim.snapshot();
    if snap.state != FlowState::Settled(Outcome::Success) {
        return Err(anyhow!("forecast request failed"));
    }
    let Some(result) = snap.result else {
        return Err(anyhow!("forecast returned no result"));
    };

    println!("{}  total demand {}", params.body(), grouped(result.total_demand));
    println!("{:<14} {:>10} {:>7}", "City", "Units", "Share");
    println!("{}", "-".repeat(33));
    for (city, units, share) in city_bars(&result) {
        println!("{:<14} {:>10} {:>6.1}%", city, units, share * 100.0);
    }
    if !result.similar_skus.is_empty() {
        println!();
        println!("closest sellers:");
        for sku in result.similar_skus.iter().take(5) {
            println!("  {:<12} distance {:.3}", sku.sku_id, sku.similarity_distance);
        }
    }
    Ok(())
}
