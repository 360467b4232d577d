//! Wire shapes of the LensOS API. Field names follow the backend's JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Kpis {
    pub revenue_protected: f64,
    pub working_capital_freed: f64,
    pub stockout_reduction_pct: f64,
    pub production_accuracy_skus: u64,
    pub capacity_utilization_pct: f64,
    #[serde(default)]
    pub total_production: Option<f64>,
    #[serde(default)]
    pub total_shortage: Option<f64>,
    #[serde(default)]
    pub revenue_risk: Option<f64>,
    #[serde(default)]
    pub revenue_lost_capacity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CapacitySummary {
    pub capacity_utilization_pct: f64,
    pub total_capacity: f64,
    pub total_optimized: f64,
    pub units_cut: f64,
    pub revenue_captured: f64,
    pub revenue_lost: f64,
    #[serde(default)]
    pub total_recommended: Option<f64>,
    #[serde(default)]
    pub items: Vec<CapacityItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CapacityItem {
    pub sku_id: String,
    pub power_cluster: String,
    pub recommended_production_qty: f64,
    pub optimized_qty: f64,
    #[serde(default)]
    pub price_band: Option<String>,
    #[serde(default)]
    pub revenue_captured: f64,
    #[serde(default)]
    pub revenue_lost: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProductionRow {
    pub sku_id: String,
    pub power_cluster: String,
    pub recommended_production_qty: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfidenceRow {
    pub sku_id: String,
    pub power_cluster: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub predicted_demand: Option<f64>,
    #[serde(default)]
    pub lower_bound: Option<f64>,
    #[serde(default)]
    pub upper_bound: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RiskCell {
    pub power_cluster: String,
    pub city: String,
    pub shortage_units: f64,
    #[serde(default)]
    pub risk_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AllocationRow {
    pub city: String,
    pub allocated_units: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub value: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub bg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BriefFinancials {
    #[serde(default)]
    pub revenue_protected: f64,
    #[serde(default)]
    pub revenue_risk: f64,
    #[serde(default)]
    pub working_capital: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExecutiveBrief {
    pub directive: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub capacity_narrative: String,
    #[serde(default)]
    pub confidence_narrative: String,
    #[serde(default)]
    pub risk_focus: String,
    #[serde(default)]
    pub financials: BriefFinancials,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Health {
    pub status: String,
}

// =============================================================================
// Compute payloads
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioBaseline {
    pub total_demand: f64,
    pub total_production: f64,
    pub total_revenue: f64,
    pub capacity: f64,
    pub utilization_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioOutcome {
    pub demand_multiplier: f64,
    pub price_multiplier: f64,
    pub capacity_change_pct: f64,
    pub total_demand: f64,
    pub total_production: f64,
    pub total_revenue: f64,
    pub capacity: f64,
    pub utilization_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioDelta {
    pub demand_change: f64,
    pub production_change: f64,
    pub revenue_change: f64,
    pub revenue_change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScenarioResult {
    pub baseline: ScenarioBaseline,
    pub scenario: ScenarioOutcome,
    pub delta: ScenarioDelta,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CityDemand {
    pub city: String,
    pub predicted_demand: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimilarSku {
    pub sku_id: String,
    pub similarity_distance: f64,
    #[serde(default)]
    pub frame_type: Option<String>,
    #[serde(default)]
    pub price_band: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LaunchSimResult {
    pub total_demand: f64,
    #[serde(default)]
    pub breakdown_by_city: Vec<CityDemand>,
    #[serde(default)]
    pub similar_skus: Vec<SimilarSku>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kpis_accept_extra_and_missing_optional_fields() {
        let k: Kpis = serde_json::from_value(json!({
            "revenue_protected": 1250000.0,
            "working_capital_freed": 300000,
            "stockout_reduction_pct": 94.5,
            "production_accuracy_skus": 212,
            "capacity_utilization_pct": 87.3,
            "total_production": 41000,
            "unused": "ignored"
        }))
        .unwrap();
        assert_eq!(k.production_accuracy_skus, 212);
        assert_eq!(k.total_production, Some(41000.0));
        assert_eq!(k.revenue_risk, None);
    }

    #[test]
    fn kpis_missing_required_field_is_rejected() {
        let r: Result<Kpis, _> = serde_json::from_value(json!({ "revenue_protected": 1.0 }));
        assert!(r.is_err());
    }

    #[test]
    fn insight_type_field_maps_to_kind() {
        let i: Insight = serde_json::from_value(json!({
            "type": "risk",
            "message": "Mumbai has the highest shortage risk",
            "value": "1,204 units",
            "color": "text-rose-500",
            "bg": "bg-rose-500/10"
        }))
        .unwrap();
        assert_eq!(i.kind, "risk");
    }

    #[test]
    fn scenario_result_defaults_missing_numbers() {
        let r: ScenarioResult = serde_json::from_value(json!({
            "baseline": { "total_revenue": 1000000 },
            "scenario": { "total_revenue": 1150000, "utilization_pct": 91.2 },
            "delta": { "revenue_change_pct": 15.0 }
        }))
        .unwrap();
        assert_eq!(r.baseline.total_demand, 0.0);
        assert_eq!(r.scenario.utilization_pct, 91.2);
        assert_eq!(r.delta.revenue_change_pct, 15.0);
    }

    #[test]
    fn risk_probability_is_optional() {
        let cells: Vec<RiskCell> = serde_json::from_value(json!([
            { "city": "Pune", "power_cluster": "high", "shortage_units": 40 },
            { "city": "Delhi", "power_cluster": "low", "shortage_units": 12, "risk_probability": 0.4 }
        ]))
        .unwrap();
        assert_eq!(cells[0].risk_probability, None);
        assert_eq!(cells[1].risk_probability, Some(0.4));
    }
}
