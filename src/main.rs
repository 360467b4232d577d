use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use lensdash::app::App;
use lensdash::backend::{self, HttpClient, Transport};
use lensdash::config::Config;
use lensdash::logging::{log, obj, v_str, Domain, Level};
use lensdash::storage::SqliteFlagStore;
use lensdash::tour::{TourEvent, Transition, Viewport, VirtualViewport};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let client = HttpClient::new(&cfg)?;
    let api = client.base().to_string();
    let transport: Arc<dyn Transport> = Arc::new(client);

    match backend::health(transport.as_ref()).await {
        Ok(h) => log(
            Level::Info,
            Domain::System,
            "health",
            obj(&[("api", v_str(&api)), ("status", v_str(&h.status))]),
        ),
        Err(err) => log(
            Level::Warn,
            Domain::System,
            "health",
            obj(&[
                ("api", v_str(&api)),
                ("kind", v_str(backend::error_kind(&err))),
                ("msg", v_str(&err.to_string())),
            ]),
        ),
    }

    let flag = SqliteFlagStore::open(&cfg.state_path)?;
    let mut app = App::boot(cfg.clone(), transport, flag);

    app.dashboard.settled().await;
    log(
        Level::Info,
        Domain::System,
        "dashboard_ready",
        obj(&[
            ("panels", app.dashboard.status()),
            ("kpis", json!(app.dashboard.kpi_cards())),
            ("production", json!(app.dashboard.production_view())),
        ]),
    );

    // Headless first run: narrate the walkthrough into the log.
    let mut viewport = VirtualViewport::dashboard(cfg.viewport_width_px);
    while let Some(step) = app.tour.current_step() {
        log(
            Level::Info,
            Domain::Tour,
            "callout",
            obj(&[
                ("step", json!(app.tour.state().step_index)),
                ("title", v_str(&step.title)),
                ("target", v_str(step.target.describe())),
                ("placement", json!(app.tour.current_placement(viewport.width()))),
            ]),
        );
        if let Transition::Finished(_) = app.tour.handle(TourEvent::Next, &mut viewport).await? {
            break;
        }
    }

    loop {
        tokio::select! {
            alive = app.dashboard.kpis.changed() => {
                if !alive {
                    break;
                }
                if let Some(cards) = app.dashboard.kpi_cards() {
                    log(Level::Info, Domain::Panel, "kpis", obj(&[("panel", v_str("kpis")), ("cards", json!(cards))]));
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    app.shutdown();
    Ok(())
}
