use std::collections::HashMap;

use serde_json::json;

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::tour::steps::Target;

/// Vertical extent of a document element, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBox {
    pub top: f64,
    pub height: f64,
}

/// The live document as the walkthrough sees it.
pub trait Viewport {
    fn width(&self) -> u32;
    fn height(&self) -> f64;
    fn scroll_y(&self) -> f64;
    fn locate(&self, selector: &str) -> Option<ElementBox>;
    fn scroll_to(&mut self, y: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrollOutcome {
    /// Page-level step; viewing position unchanged.
    Unchanged,
    Centered { y: f64 },
    /// Target missing from the document; scrolled to the top instead.
    FellBackToTop,
}

/// Brings the upcoming step's target into view.
pub struct ScrollCoordinator;

impl ScrollCoordinator {
    pub fn prepare(viewport: &mut dyn Viewport, target: &Target) -> ScrollOutcome {
        let selector = match target {
            Target::Page => return ScrollOutcome::Unchanged,
            Target::Selector(sel) => sel,
        };
        match viewport.locate(selector) {
            Some(el) => {
                let y = centered_offset(el, viewport.height());
                viewport.scroll_to(y);
                ScrollOutcome::Centered { y }
            }
            None => {
                log(
                    Level::Info,
                    Domain::Tour,
                    "target_not_found",
                    obj(&[("selector", v_str(selector)), ("fallback", v_str("scroll_top"))]),
                );
                viewport.scroll_to(0.0);
                ScrollOutcome::FellBackToTop
            }
        }
    }
}

/// Scroll offset that puts the middle of `el` in the middle of the viewport.
fn centered_offset(el: ElementBox, viewport_height: f64) -> f64 {
    (el.top + el.height / 2.0 - viewport_height / 2.0).max(0.0)
}

/// In-memory document used by the headless client and in tests.
#[derive(Debug, Clone)]
pub struct VirtualViewport {
    width: u32,
    height: f64,
    scroll_y: f64,
    elements: HashMap<String, ElementBox>,
    scroll_log: Vec<f64>,
}

impl VirtualViewport {
    pub fn new(width: u32, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_y: 0.0,
            elements: HashMap::new(),
            scroll_log: Vec::new(),
        }
    }

    pub fn with_element(mut self, selector: &str, top: f64, height: f64) -> Self {
        self.insert(selector, top, height);
        self
    }

    pub fn insert(&mut self, selector: &str, top: f64, height: f64) {
        self.elements.insert(selector.to_string(), ElementBox { top, height });
    }

    /// Every scroll issued so far, oldest first.
    pub fn scroll_log(&self) -> &[f64] {
        &self.scroll_log
    }

    /// Stacked dashboard sections, top to bottom, matching the walkthrough.
    pub fn dashboard(width: u32) -> Self {
        let sections: [(&str, f64); 9] = [
            ("#kpi-summary", 220.0),
            ("#executive-brief", 320.0),
            ("#capacity-panel", 280.0),
            ("#production-plan", 640.0),
            ("#risk-heatmap", 420.0),
            ("#allocation-chart", 360.0),
            ("#scenario-simulator", 520.0),
            ("#new-product-simulator", 560.0),
            ("#insights-feed", 300.0),
        ];
        let mut vp = Self::new(width, 800.0);
        let mut top = 80.0;
        for (sel, h) in sections {
            vp.insert(sel, top, h);
            top += h + 24.0;
        }
        vp
    }
}

impl Viewport for VirtualViewport {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn locate(&self, selector: &str) -> Option<ElementBox> {
        self.elements.get(selector).copied()
    }

    fn scroll_to(&mut self, y: f64) {
        self.scroll_y = y;
        self.scroll_log.push(y);
        log(Level::Trace, Domain::Tour, "scroll", obj(&[("y", json!(y))]));
    }
}
