use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};

use crate::backend::types::{
    AllocationRow, CapacitySummary, ConfidenceRow, ExecutiveBrief, Insight, Kpis, ProductionRow, RiskCell,
};
use crate::backend::{
    Transport, PATH_ALLOCATION, PATH_BRIEF, PATH_CAPACITY, PATH_CONFIDENCE, PATH_INSIGHTS, PATH_KPIS,
    PATH_PRODUCTION, PATH_RISK,
};
use crate::format::{inr_compact, pct};
use crate::join::{self, ProductionView};
use crate::panel::{Panel, PanelHandle, PanelState};

/// Every panel on the dashboard, each with its own fetch lifecycle.
pub struct Dashboard {
    pub kpis: PanelHandle<Kpis>,
    pub capacity: PanelHandle<CapacitySummary>,
    pub production: PanelHandle<Vec<ProductionRow>>,
    pub confidence: PanelHandle<Vec<ConfidenceRow>>,
    pub risk: PanelHandle<Vec<RiskCell>>,
    pub allocation: PanelHandle<Vec<AllocationRow>>,
    pub insights: PanelHandle<Vec<Insight>>,
    pub brief: PanelHandle<ExecutiveBrief>,
}

impl Dashboard {
    pub fn mount(transport: Arc<dyn Transport>, kpi_every: Duration) -> Self {
        Self {
            kpis: Panel::polled("kpis", PATH_KPIS, kpi_every).mount(transport.clone()),
            capacity: Panel::once("capacity", PATH_CAPACITY).mount(transport.clone()),
            production: Panel::once("production", PATH_PRODUCTION).mount(transport.clone()),
            confidence: Panel::once("confidence", PATH_CONFIDENCE).mount(transport.clone()),
            risk: Panel::once("risk", PATH_RISK).mount(transport.clone()),
            allocation: Panel::once("allocation", PATH_ALLOCATION).mount(transport.clone()),
            insights: Panel::once("insights", PATH_INSIGHTS).mount(transport.clone()),
            brief: Panel::once("brief", PATH_BRIEF).mount(transport),
        }
    }

    pub fn unmount(&mut self) {
        self.kpis.unmount();
        self.capacity.unmount();
        self.production.unmount();
        self.confidence.unmount();
        self.risk.unmount();
        self.allocation.unmount();
        self.insights.unmount();
        self.brief.unmount();
    }

    /// Waits until every panel has finished its first fetch.
    pub async fn settled(&mut self) {
        tokio::join!(
            self.kpis.settled(),
            self.capacity.settled(),
            self.production.settled(),
            self.confidence.settled(),
            self.risk.settled(),
            self.allocation.settled(),
            self.insights.settled(),
            self.brief.settled(),
        );
    }

    pub fn production_view(&self) -> ProductionView {
        join::compose(&self.production.snapshot(), &self.confidence.snapshot())
    }

    pub fn kpi_cards(&self) -> Option<Vec<KpiCard>> {
        self.kpis.snapshot().data.as_ref().map(kpi_cards)
    }

    /// Status of every panel, keyed by panel name.
    pub fn status(&self) -> Value {
        fn entry<T: Clone>(h: &PanelHandle<T>) -> (String, Value) {
            let s: PanelState<T> = h.snapshot();
            (h.name().to_string(), json!({ "status": s.status, "seq": s.seq }))
        }
        Value::Object(
            [
                entry(&self.kpis),
                entry(&self.capacity),
                entry(&self.production),
                entry(&self.confidence),
                entry(&self.risk),
                entry(&self.allocation),
                entry(&self.insights),
                entry(&self.brief),
            ]
            .into_iter()
            .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
}

pub fn kpi_cards(k: &Kpis) -> Vec<KpiCard> {
    vec![
        KpiCard { label: "Revenue Protected", value: inr_compact(k.revenue_protected) },
        KpiCard { label: "Working Capital Freed", value: inr_compact(k.working_capital_freed) },
        KpiCard { label: "Stock-out Reduction", value: pct(k.stockout_reduction_pct) },
        KpiCard { label: "Production Accuracy", value: format!("{} SKUs", k.production_accuracy_skus) },
        KpiCard { label: "Capacity Utilization", value: pct(k.capacity_utilization_pct) },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cards_format_each_kpi() {
        let k = Kpis {
            revenue_protected: 23_400_000.0,
            working_capital_freed: 560_000.0,
            stockout_reduction_pct: 94.5,
            production_accuracy_skus: 212,
            capacity_utilization_pct: 87.34,
            total_production: None,
            total_shortage: None,
            revenue_risk: None,
            revenue_lost_capacity: None,
        };
        let cards = kpi_cards(&k);
        assert_eq!(cards[0].value, "₹2.34Cr");
        assert_eq!(cards[1].value, "₹5.6L");
        assert_eq!(cards[2].value, "94.5%");
        assert_eq!(cards[3].value, "212 SKUs");
        assert_eq!(cards[4].value, "87.3%");
    }
}
