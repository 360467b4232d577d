use serde::Serialize;
use serde_json::{json, Value};

use crate::backend::types::ScenarioResult;
use crate::backend::PATH_SCENARIO;
use crate::compute::ComputeRequest;
use crate::format::{grouped, lakhs, pct, signed_grouped, signed_pct};

pub const DEMAND_RANGE: (f64, f64) = (0.8, 1.2);
pub const PRICE_RANGE: (f64, f64) = (0.9, 1.1);
pub const CAPACITY_RANGE: (f64, f64) = (-20.0, 20.0);

/// What-if inputs. Each field is independently bounded; setters clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioParams {
    demand_multiplier: f64,
    price_multiplier: f64,
    capacity_change_pct: f64,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self { demand_multiplier: 1.0, price_multiplier: 1.0, capacity_change_pct: 0.0 }
    }
}

fn clamp_to(value: f64, (lo, hi): (f64, f64), fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(lo, hi)
    }
}

impl ScenarioParams {
    pub fn new(demand_multiplier: f64, price_multiplier: f64, capacity_change_pct: f64) -> Self {
        let mut p = Self::default();
        p.set_demand_multiplier(demand_multiplier);
        p.set_price_multiplier(price_multiplier);
        p.set_capacity_change_pct(capacity_change_pct);
        p
    }

    pub fn demand_multiplier(&self) -> f64 {
        self.demand_multiplier
    }

    pub fn price_multiplier(&self) -> f64 {
        self.price_multiplier
    }

    pub fn capacity_change_pct(&self) -> f64 {
        self.capacity_change_pct
    }

    pub fn set_demand_multiplier(&mut self, v: f64) {
        self.demand_multiplier = clamp_to(v, DEMAND_RANGE, 1.0);
    }

    pub fn set_price_multiplier(&mut self, v: f64) {
        self.price_multiplier = clamp_to(v, PRICE_RANGE, 1.0);
    }

    pub fn set_capacity_change_pct(&mut self, v: f64) {
        self.capacity_change_pct = clamp_to(v, CAPACITY_RANGE, 0.0);
    }
}

impl ComputeRequest for ScenarioParams {
    type Output = ScenarioResult;
    const FLOW: &'static str = "scenario";
    const PATH: &'static str = PATH_SCENARIO;

    fn body(&self) -> Value {
        json!({
            "demand_multiplier": self.demand_multiplier,
            "price_multiplier": self.price_multiplier,
            "capacity_change_pct": self.capacity_change_pct,
        })
    }
}

/// One row of the baseline-vs-scenario comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub metric: &'static str,
    pub baseline: String,
    pub scenario: String,
    pub delta: String,
}

/// Display strings for a scenario result. Figures are taken as returned;
/// nothing is recomputed client-side.
pub fn comparison(result: &ScenarioResult) -> Vec<ComparisonRow> {
    let b = &result.baseline;
    let s = &result.scenario;
    let d = &result.delta;
    vec![
        ComparisonRow {
            metric: "Revenue",
            baseline: lakhs(b.total_revenue),
            scenario: lakhs(s.total_revenue),
            delta: signed_pct(d.revenue_change_pct),
        },
        ComparisonRow {
            metric: "Demand",
            baseline: grouped(b.total_demand),
            scenario: grouped(s.total_demand),
            delta: signed_grouped(d.demand_change),
        },
        ComparisonRow {
            metric: "Production",
            baseline: grouped(b.total_production),
            scenario: grouped(s.total_production),
            delta: signed_grouped(d.production_change),
        },
        ComparisonRow {
            metric: "Utilization",
            baseline: pct(b.utilization_pct),
            scenario: pct(s.utilization_pct),
            delta: String::new(),
        },
    ]
}
