//! Confidence annotation of production rows.
//!
//! Production recommendations and forecast confidence come from two
//! independent endpoints. Confidence is optional decoration: when it is
//! missing for a row, or the whole confidence fetch failed, rows are still
//! shown and read "unknown".

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::json;

use crate::backend::types::{ConfidenceRow, ProductionRow};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::panel::{PanelState, PanelStatus};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConfidenceKey {
    pub sku_id: String,
    pub power_cluster: String,
}

impl ConfidenceKey {
    pub fn new(sku_id: &str, power_cluster: &str) -> Self {
        Self { sku_id: sku_id.to_string(), power_cluster: power_cluster.to_string() }
    }
}

impl fmt::Display for ConfidenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.sku_id, self.power_cluster)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "score")]
pub enum Confidence {
    Known(f64),
    Unknown,
}

impl Confidence {
    /// Whole-percent label, e.g. `82%`, or `unknown`.
    pub fn label(&self) -> String {
        match self {
            Confidence::Known(score) => format!("{:.0}%", score * 100.0),
            Confidence::Unknown => "unknown".to_string(),
        }
    }
}

/// Lookup from (sku, power cluster) to confidence score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfidenceIndex {
    scores: HashMap<ConfidenceKey, f64>,
}

impl ConfidenceIndex {
    /// Later rows win on duplicate keys; scores are clamped to [0, 1].
    pub fn build(rows: &[ConfidenceRow]) -> Self {
        let mut scores = HashMap::with_capacity(rows.len());
        for row in rows {
            let key = ConfidenceKey::new(&row.sku_id, &row.power_cluster);
            if !row.confidence_score.is_finite() {
                log(Level::Debug, Domain::Join, "score_skipped", obj(&[("key", v_str(&key.to_string()))]));
                continue;
            }
            scores.insert(key, row.confidence_score.clamp(0.0, 1.0));
        }
        Self { scores }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn get(&self, key: &ConfidenceKey) -> Option<f64> {
        self.scores.get(key).copied()
    }

    pub fn confidence_for(&self, row: &ProductionRow) -> Confidence {
        match self.get(&ConfidenceKey::new(&row.sku_id, &row.power_cluster)) {
            Some(score) => Confidence::Known(score),
            None => Confidence::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedRow {
    pub sku_id: String,
    pub power_cluster: String,
    pub recommended_production_qty: f64,
    pub confidence: Confidence,
}

pub fn annotate(rows: &[ProductionRow], index: &ConfidenceIndex) -> Vec<AnnotatedRow> {
    rows.iter()
        .map(|row| AnnotatedRow {
            sku_id: row.sku_id.clone(),
            power_cluster: row.power_cluster.clone(),
            recommended_production_qty: row.recommended_production_qty,
            confidence: index.confidence_for(row),
        })
        .collect()
}

/// Joined production table as the UI sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "rows")]
pub enum ProductionView {
    Loading,
    /// Production itself failed; nothing to show.
    Unavailable,
    Ready(Vec<AnnotatedRow>),
}

/// Composes the production and confidence panel states.
///
/// The join waits until both panels have produced data once. A panel that is
/// refetching keeps contributing its last data. A failed confidence panel
/// degrades to an empty index instead of blocking the table.
pub fn compose(
    production: &PanelState<Vec<ProductionRow>>,
    confidence: &PanelState<Vec<ConfidenceRow>>,
) -> ProductionView {
    let rows = match (production.status, &production.data) {
        (PanelStatus::Error, _) => return ProductionView::Unavailable,
        (_, Some(rows)) => rows,
        (_, None) => return ProductionView::Loading,
    };
    let index = match (confidence.status, &confidence.data) {
        (PanelStatus::Error, _) => ConfidenceIndex::default(),
        (_, Some(conf)) => ConfidenceIndex::build(conf),
        (PanelStatus::Loading, None) => return ProductionView::Loading,
        (PanelStatus::Ready, None) => ConfidenceIndex::default(),
    };
    let annotated = annotate(rows, &index);
    let unknown = annotated.iter().filter(|r| r.confidence == Confidence::Unknown).count();
    log(
        Level::Debug,
        Domain::Join,
        "composed",
        obj(&[
            ("rows", json!(annotated.len())),
            ("index_size", json!(index.len())),
            ("unknown", json!(unknown)),
        ]),
    );
    ProductionView::Ready(annotated)
}
