use serde::Serialize;

/// What a step highlights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "selector")]
pub enum Target {
    /// Whole page, callout centered; the viewport is left where it is.
    Page,
    Selector(String),
}

impl Target {
    pub fn selector(sel: &str) -> Self {
        Target::Selector(sel.to_string())
    }

    pub fn is_page(&self) -> bool {
        matches!(self, Target::Page)
    }

    pub fn describe(&self) -> &str {
        match self {
            Target::Page => "page",
            Target::Selector(sel) => sel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Auto,
    Bottom,
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourStep {
    pub target: Target,
    pub title: String,
    pub body: Vec<String>,
    pub placement: Placement,
}

impl TourStep {
    pub fn new(target: Target, title: &str, body: &[&str], placement: Placement) -> Self {
        Self {
            target,
            title: title.to_string(),
            body: body.iter().map(|p| p.to_string()).collect(),
            placement,
        }
    }
}

/// Placement to use when rendering `step` at `viewport_width`.
///
/// Below the breakpoint every anchored callout goes underneath its target so
/// it stays on-screen; page-level steps keep their own placement. The step
/// itself is never modified.
pub fn effective_placement(step: &TourStep, viewport_width: u32, narrow_breakpoint: u32) -> Placement {
    if viewport_width < narrow_breakpoint && !step.target.is_page() {
        Placement::Bottom
    } else {
        step.placement
    }
}

/// The first-run walkthrough of the dashboard, in display order.
pub fn dashboard_steps() -> Vec<TourStep> {
    vec![
        TourStep::new(
            Target::Page,
            "Welcome to LensOS",
            &[
                "LensOS turns demand forecasts into production, allocation and capacity decisions.",
                "This short tour walks through each part of the dashboard.",
            ],
            Placement::Center,
        ),
        TourStep::new(
            Target::selector("#kpi-summary"),
            "Executive KPIs",
            &["Revenue protected, working capital freed and stock-out reduction, refreshed every 30 seconds."],
            Placement::Bottom,
        ),
        TourStep::new(
            Target::selector("#executive-brief"),
            "Decision brief",
            &["A plain-language summary of this week's production directive and the key actions behind it."],
            Placement::Auto,
        ),
        TourStep::new(
            Target::selector("#capacity-panel"),
            "Capacity",
            &["How much of factory capacity the optimised plan uses, and the revenue lost to units that had to be cut."],
            Placement::Auto,
        ),
        TourStep::new(
            Target::selector("#production-plan"),
            "Production plan",
            &[
                "Recommended quantities per SKU and power cluster.",
                "Each row carries the forecast confidence for that pair when one is available.",
            ],
            Placement::Auto,
        ),
        TourStep::new(
            Target::selector("#risk-heatmap"),
            "Stock-out risk",
            &["Shortage units by city and power cluster. Darker cells need attention first."],
            Placement::Auto,
        ),
        TourStep::new(
            Target::selector("#allocation-chart"),
            "Allocation",
            &["Where the planned units are shipped, by city."],
            Placement::Auto,
        ),
        TourStep::new(
            Target::selector("#scenario-simulator"),
            "What-if scenarios",
            &["Move demand, price and capacity and compare the outcome against the current plan."],
            Placement::Auto,
        ),
        TourStep::new(
            Target::selector("#new-product-simulator"),
            "New product launch",
            &["Pick a frame, lens and price band to estimate demand for a SKU that has never been sold."],
            Placement::Auto,
        ),
        TourStep::new(
            Target::selector("#insights-feed"),
            "Insights",
            &["Automatically surfaced risks and opportunities."],
            Placement::Auto,
        ),
        TourStep::new(
            Target::Page,
            "You're all set",
            &["You can replay this tour any time from the help menu."],
            Placement::Center,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_viewport_forces_bottom_for_anchored_steps() {
        let steps = dashboard_steps();
        let anchored = &steps[3];
        assert_eq!(anchored.placement, Placement::Auto);
        assert_eq!(effective_placement(anchored, 375, 768), Placement::Bottom);
        assert_eq!(effective_placement(anchored, 1280, 768), Placement::Auto);
        // stored data untouched
        assert_eq!(steps[3].placement, Placement::Auto);
    }

    #[test]
    fn page_steps_keep_center_when_narrow() {
        let steps = dashboard_steps();
        assert!(steps[0].target.is_page());
        assert_eq!(effective_placement(&steps[0], 375, 768), Placement::Center);
    }

    #[test]
    fn breakpoint_is_exclusive() {
        let step = TourStep::new(Target::selector("#x"), "x", &[], Placement::Auto);
        assert_eq!(effective_placement(&step, 768, 768), Placement::Auto);
        assert_eq!(effective_placement(&step, 767, 768), Placement::Bottom);
    }

    #[test]
    fn walkthrough_opens_and_closes_on_page() {
        let steps = dashboard_steps();
        assert!(steps.first().unwrap().target.is_page());
        assert!(steps.last().unwrap().target.is_page());
        assert!(steps.len() > 2);
    }
}
