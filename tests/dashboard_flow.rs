//! End-to-end behaviour of the mounted client against a scripted backend.
//!
//! All tests run on a paused tokio clock so poll periods and response delays
//! are deterministic.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use lensdash::app::App;
use lensdash::backend::types::Kpis;
use lensdash::backend::{MockReply, MockTransport, Transport, PATH_KPIS, PATH_PREDICT, PATH_SCENARIO};
use lensdash::compute::scenario::comparison;
use lensdash::compute::{FlowState, FrameType, Outcome, PriceBand, ScenarioParams, Simulator};
use lensdash::config::Config;
use lensdash::join::{Confidence, ProductionView};
use lensdash::panel::{Panel, PanelStatus};
use lensdash::storage::{FlagStore, MemoryFlagStore};

fn kpis_json() -> Value {
    json!({
        "revenue_protected": 23400000.0,
        "working_capital_freed": 560000.0,
        "stockout_reduction_pct": 94.5,
        "production_accuracy_skus": 212,
        "capacity_utilization_pct": 87.3
    })
}

fn backend() -> Arc<MockTransport> {
    let m = Arc::new(MockTransport::new());
    m.on(PATH_KPIS, kpis_json());
    m.on(
        "/api/capacity",
        json!({
            "capacity_utilization_pct": 92.1, "total_capacity": 70000, "total_optimized": 64470,
            "units_cut": 3100, "revenue_captured": 18000000.0, "revenue_lost": 950000.0
        }),
    );
    m.on(
        "/api/production",
        json!([
            { "sku_id": "A1", "power_cluster": "North", "recommended_production_qty": 480 },
            { "sku_id": "B7", "power_cluster": "high", "recommended_production_qty": 300 }
        ]),
    );
    m.on(
        "/api/confidence",
        json!([{ "sku_id": "A1", "power_cluster": "North", "confidence_score": 0.82 }]),
    );
    m.on("/api/risk", json!([{ "city": "Pune", "power_cluster": "high", "shortage_units": 40 }]));
    m.on("/api/allocation", json!([{ "city": "Pune", "allocated_units": 1200 }]));
    m.on("/api/insights", json!([]));
    m.on(
        "/api/brief",
        json!({ "directive": "Produce 64,470 units", "actions": ["Prioritize Pune"] }),
    );
    m
}

/// Lets spawned panel tasks run up to their next suspension point.
async fn run_pending_tasks() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn kpi_panel_polls_every_30s_until_unmounted() {
    let m = backend();
    let mut kpis = Panel::polled("kpis", PATH_KPIS, Duration::from_secs(30)).mount::<Kpis>(m.clone());
    run_pending_tasks().await;
    assert_eq!(m.calls(PATH_KPIS), 1);
    assert!(kpis.snapshot().is_ready());

    for expected in 2..=4 {
        tokio::time::advance(Duration::from_secs(30)).await;
        run_pending_tasks().await;
        assert_eq!(m.calls(PATH_KPIS), expected);
    }

    tokio::time::advance(Duration::from_secs(10)).await;
    run_pending_tasks().await;
    assert_eq!(m.calls(PATH_KPIS), 4);

    kpis.unmount();
    tokio::time::advance(Duration::from_secs(300)).await;
    run_pending_tasks().await;
    assert_eq!(m.calls(PATH_KPIS), 4);
}

#[tokio::test(start_paused = true)]
async fn unmount_during_inflight_fetch_leaves_state_untouched() {
    let m = Arc::new(MockTransport::new());
    m.set_fallback(PATH_KPIS, MockReply::ok(kpis_json()).after(Duration::from_secs(5)));
    let mut kpis = Panel::polled("kpis", PATH_KPIS, Duration::from_secs(30)).mount::<Kpis>(m.clone());

    tokio::time::advance(Duration::from_secs(1)).await;
    run_pending_tasks().await;
    assert_eq!(m.calls(PATH_KPIS), 1);
    let before = kpis.snapshot();
    assert_eq!(before.status, PanelStatus::Loading);

    kpis.unmount();
    tokio::time::advance(Duration::from_secs(10)).await;
    run_pending_tasks().await;

    let after = kpis.snapshot();
    assert_eq!(after, before);
    assert_eq!(after.data, None);
    assert!(!kpis.is_mounted());
}

#[tokio::test(start_paused = true)]
async fn boot_starts_tour_only_on_first_run() {
    let m: Arc<dyn Transport> = backend();
    let mut first = App::boot(Config::default(), m.clone(), MemoryFlagStore::new());
    assert!(first.tour.is_running());
    first.shutdown();

    let mut later = App::boot(Config::default(), m, MemoryFlagStore::completed());
    assert!(!later.tour.is_running());
    later.tour.start();
    assert!(later.tour.is_running());
    later.shutdown();
}

#[tokio::test(start_paused = true)]
async fn production_rows_carry_confidence() {
    let m: Arc<dyn Transport> = backend();
    let mut app = App::boot(Config::default(), m, MemoryFlagStore::completed());
    app.dashboard.settled().await;

    let rows = match app.dashboard.production_view() {
        ProductionView::Ready(rows) => rows,
        other => panic!("expected rows, got {:?}", other),
    };
    assert_eq!(rows[0].confidence, Confidence::Known(0.82));
    assert_eq!(rows[1].confidence, Confidence::Unknown);
    assert_eq!(app.dashboard.kpi_cards().unwrap()[2].value, "94.5%");
    assert_eq!(app.dashboard.status()["brief"]["status"], "ready");
    app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn confidence_outage_does_not_block_production() {
    let m = backend();
    m.on_err("/api/confidence", "connection refused");
    let t: Arc<dyn Transport> = m;
    let mut app = App::boot(Config::default(), t, MemoryFlagStore::completed());
    app.dashboard.settled().await;

    assert_eq!(app.dashboard.confidence.snapshot().status, PanelStatus::Error);
    assert!(app.dashboard.kpis.snapshot().is_ready());
    match app.dashboard.production_view() {
        ProductionView::Ready(rows) => {
            assert!(rows.iter().all(|r| r.confidence == Confidence::Unknown));
        }
        other => panic!("expected rows, got {:?}", other),
    }
    app.shutdown();
}

fn scenario_json() -> Value {
    json!({
        "baseline": { "total_demand": 60000, "total_production": 64000, "total_revenue": 1000000,
                      "capacity": 70000, "utilization_pct": 91.4 },
        "scenario": { "demand_multiplier": 1.1, "price_multiplier": 1.0, "capacity_change_pct": 15,
                      "total_demand": 66000, "total_production": 69000, "total_revenue": 1150000,
                      "capacity": 80500, "utilization_pct": 85.7 },
        "delta": { "demand_change": 6000, "production_change": 5000, "revenue_change": 150000,
                   "revenue_change_pct": 15.0 }
    })
}

#[tokio::test(start_paused = true)]
async fn scenario_submit_is_disabled_while_pending() {
    let m = Arc::new(MockTransport::new());
    m.set_fallback(PATH_SCENARIO, MockReply::ok(scenario_json()).after(Duration::from_secs(2)));
    let sim: Simulator<ScenarioParams> = Simulator::new(m.clone());
    sim.update_params(|p| p.set_demand_multiplier(1.1));

    assert!(sim.snapshot().result.is_none());
    let handle = sim.submit().unwrap();
    assert!(!sim.snapshot().can_submit);
    assert!(sim.submit().is_err());

    assert!(handle.await.unwrap());
    let snap = sim.snapshot();
    assert_eq!(snap.state, FlowState::Settled(Outcome::Success));
    assert_eq!(m.calls(PATH_SCENARIO), 1);
    assert_eq!(m.bodies()[0].1["demand_multiplier"], json!(1.1));

    let rows = comparison(snap.result.as_ref().unwrap());
    assert_eq!((rows[0].baseline.as_str(), rows[0].scenario.as_str()), ("10.0L", "11.5L"));
}

#[tokio::test(start_paused = true)]
async fn scenario_failure_keeps_previous_result() {
    let m = Arc::new(MockTransport::new());
    m.push(PATH_SCENARIO, MockReply::ok(scenario_json()));
    m.on_err(PATH_SCENARIO, "503 upstream");
    let sim: Simulator<ScenarioParams> = Simulator::new(m.clone());

    assert!(sim.run().await.unwrap());
    assert!(sim.run().await.unwrap());
    let snap = sim.snapshot();
    assert_eq!(snap.state, FlowState::Settled(Outcome::Failure));
    assert_eq!(snap.result.unwrap().scenario.total_revenue, 1_150_000.0);

    sim.reset();
    let snap = sim.snapshot();
    assert_eq!(snap.state, FlowState::Idle);
    assert!(snap.result.is_none());
    assert_eq!(snap.params, ScenarioParams::default());
}

#[tokio::test(start_paused = true)]
async fn reset_while_pending_discards_reply() {
    let m = Arc::new(MockTransport::new());
    m.set_fallback(PATH_SCENARIO, MockReply::ok(scenario_json()).after(Duration::from_secs(2)));
    let sim: Simulator<ScenarioParams> = Simulator::new(m);
    let handle = sim.submit().unwrap();
    sim.reset();
    assert!(!handle.await.unwrap());
    assert!(sim.snapshot().result.is_none());
    assert_eq!(sim.snapshot().state, FlowState::Idle);
}

#[tokio::test(start_paused = true)]
async fn new_product_simulator_posts_selected_attributes() {
    let m = Arc::new(MockTransport::new());
    m.on(
        PATH_PREDICT,
        json!({
            "total_demand": 840.5,
            "breakdown_by_city": [{ "city": "Delhi", "predicted_demand": 420.2 }],
            "similar_skus": [{ "sku_id": "SKU_0042", "similarity_distance": 0.013 }]
        }),
    );
    let t: Arc<dyn Transport> = m.clone();
    let mut app = App::boot(Config::default(), t, MemoryFlagStore::completed());
    app.launch.update_params(|p| {
        p.frame_type = FrameType::Rimless;
        p.price_band = PriceBand::Premium;
    });
    assert!(app.launch.run().await.unwrap());

    let body = &m.bodies()[0].1;
    assert_eq!(body["frame_type"], "rimless");
    assert_eq!(body["price_band"], "premium");
    let result = app.launch.snapshot().result.unwrap();
    assert_eq!(result.similar_skus[0].sku_id, "SKU_0042");
    app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn finishing_tour_persists_flag_for_next_boot() {
    use lensdash::tour::{TourEvent, VirtualViewport};

    let m: Arc<dyn Transport> = backend();
    let mut app = App::boot(Config::default(), m, MemoryFlagStore::new());
    let mut vp = VirtualViewport::dashboard(390);
    app.tour.handle(TourEvent::Next, &mut vp).await.unwrap();
    app.tour.handle(TourEvent::Skip, &mut vp).await.unwrap();
    assert!(!app.tour.is_running());
    assert!(app.tour.flag().get().unwrap());
    app.shutdown();
}
