use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::backend::types::LaunchSimResult;
use crate::backend::PATH_PREDICT;
use crate::compute::ComputeRequest;
use crate::format::grouped;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameType {
    #[default]
    #[serde(rename = "full-rim")]
    FullRim,
    #[serde(rename = "half-rim")]
    HalfRim,
    #[serde(rename = "rimless")]
    Rimless,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LensType {
    #[default]
    #[serde(rename = "single vision")]
    SingleVision,
    #[serde(rename = "progressive")]
    Progressive,
    #[serde(rename = "blue cut")]
    BlueCut,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceBand {
    Low,
    #[default]
    Mid,
    High,
    Premium,
}

/// Attributes of a SKU that has never been sold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSimParams {
    pub frame_type: FrameType,
    pub lens_type: LensType,
    pub price_band: PriceBand,
}

impl ComputeRequest for LaunchSimParams {
    type Output = LaunchSimResult;
    const FLOW: &'static str = "new_product";
    const PATH: &'static str = PATH_PREDICT;

    fn body(&self) -> Value {
        json!({
            "frame_type": self.frame_type,
            "lens_type": self.lens_type,
            "price_band": self.price_band,
        })
    }
}

/// City demand bars, largest first, with share of the total.
pub fn city_bars(result: &LaunchSimResult) -> Vec<(String, String, f64)> {
    let total = result.total_demand.max(f64::EPSILON);
    let mut rows: Vec<_> = result
        .breakdown_by_city
        .iter()
        .map(|c| (c.city.clone(), grouped(c.predicted_demand), c.predicted_demand / total))
        .collect();
    rows.sort_by(|a, b| b.2.total_cmp(&a.2));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::CityDemand;

    #[test]
    fn body_matches_backend_vocabulary() {
        let p = LaunchSimParams {
            frame_type: FrameType::HalfRim,
            lens_type: LensType::BlueCut,
            price_band: PriceBand::Premium,
        };
        assert_eq!(
            p.body(),
            json!({ "frame_type": "half-rim", "lens_type": "blue cut", "price_band": "premium" })
        );
    }

    #[test]
    fn defaults() {
        let p = LaunchSimParams::default();
        assert_eq!(p.body()["frame_type"], "full-rim");
        assert_eq!(p.body()["lens_type"], "single vision");
        assert_eq!(p.body()["price_band"], "mid");
    }

    #[test]
    fn bars_sorted_by_demand() {
        let r = LaunchSimResult {
            total_demand: 400.0,
            breakdown_by_city: vec![
                CityDemand { city: "Pune".to_string(), predicted_demand: 100.0 },
                CityDemand { city: "Delhi".to_string(), predicted_demand: 300.0 },
            ],
            similar_skus: vec![],
        };
        let bars = city_bars(&r);
        assert_eq!(bars[0].0, "Delhi");
        assert_eq!(bars[0].2, 0.75);
        assert_eq!(bars[1].1, "100");
    }
}
