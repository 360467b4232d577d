//! Per-panel fetch/poll controller.
//!
//! A [`Panel`] names one endpoint and an optional refresh period. Mounting it
//! spawns a task that owns the fetch loop and publishes [`PanelState`] over a
//! watch channel. The returned [`PanelHandle`] is the cancellation handle:
//! unmounting (or dropping) it aborts the task, and any response that lands
//! afterwards is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::backend::{self, error_kind, Transport};
use crate::logging::{log, log_fetch, log_panel_error, obj, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelStatus {
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelState<T> {
    pub status: PanelStatus,
    pub data: Option<T>,
    /// Request sequence number of the response currently shown; 0 before
    /// the first response.
    pub seq: u64,
}

impl<T> PanelState<T> {
    fn loading() -> Self {
        Self { status: PanelStatus::Loading, data: None, seq: 0 }
    }

    pub fn is_ready(&self) -> bool {
        self.status == PanelStatus::Ready
    }
}

/// Static description of a dashboard panel.
#[derive(Debug, Clone, Copy)]
pub struct Panel {
    pub name: &'static str,
    pub path: &'static str,
    pub refresh: Option<Duration>,
}

impl Panel {
    pub const fn once(name: &'static str, path: &'static str) -> Self {
        Self { name, path, refresh: None }
    }

    pub const fn polled(name: &'static str, path: &'static str, every: Duration) -> Self {
        Self { name, path, refresh: Some(every) }
    }

    pub fn mount<T>(&self, transport: Arc<dyn Transport>) -> PanelHandle<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let (tx, rx) = watch::channel(PanelState::loading());
        let shared = Arc::new(Shared {
            name: self.name,
            path: self.path,
            tx,
            mounted: AtomicBool::new(true),
            refresh: Notify::new(),
        });
        let task = tokio::spawn(run_loop(shared.clone(), transport, self.refresh));
        log(
            Level::Debug,
            Domain::Panel,
            "mount",
            obj(&[
                ("panel", v_str(self.name)),
                ("path", v_str(self.path)),
                ("refresh_secs", json!(self.refresh.map(|d| d.as_secs_f64()))),
            ]),
        );
        PanelHandle { shared, rx, task: Some(task) }
    }
}

struct Shared<T> {
    name: &'static str,
    path: &'static str,
    tx: watch::Sender<PanelState<T>>,
    mounted: AtomicBool,
    refresh: Notify,
}

impl<T> Shared<T> {
    /// Mutates state only while mounted. The mounted check runs under the
    /// channel lock, so it cannot interleave with `unmount`.
    fn update(&self, f: impl FnOnce(&mut PanelState<T>) -> bool) -> bool {
        self.tx.send_if_modified(|state| {
            if !self.mounted.load(Ordering::SeqCst) {
                return false;
            }
            f(state)
        })
    }
}

async fn run_loop<T>(shared: Arc<Shared<T>>, transport: Arc<dyn Transport>, refresh: Option<Duration>)
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let mut seq: u64 = 0;
    let mut ticker = refresh.map(|every| {
        let mut t = interval_at(Instant::now() + every, every);
        t.set_missed_tick_behavior(MissedTickBehavior::Delay);
        t
    });
    loop {
        seq += 1;
        fetch_once(&shared, transport.as_ref(), seq).await;
        match ticker.as_mut() {
            Some(t) => {
                tokio::select! {
                    _ = t.tick() => {}
                    _ = shared.refresh.notified() => {}
                }
            }
            None => shared.refresh.notified().await,
        }
    }
}

async fn fetch_once<T>(shared: &Shared<T>, transport: &dyn Transport, seq: u64)
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    shared.update(|state| {
        let changed = state.status != PanelStatus::Loading;
        state.status = PanelStatus::Loading;
        changed
    });
    log_fetch(shared.name, shared.path, seq);

    let result = backend::get::<T>(transport, shared.path).await;

    if let Err(err) = &result {
        log_panel_error(shared.name, shared.path, error_kind(err), &err.to_string());
    }
    let applied = shared.update(|state| {
        if seq <= state.seq {
            return false;
        }
        state.seq = seq;
        match result {
            Ok(data) => {
                state.status = PanelStatus::Ready;
                state.data = Some(data);
            }
            Err(_) => {
                state.status = PanelStatus::Error;
                state.data = None;
            }
        }
        true
    });
    if !applied {
        log(
            Level::Debug,
            Domain::Panel,
            "response_discarded",
            obj(&[("panel", v_str(shared.name)), ("req_seq", json!(seq))]),
        );
    }
}

/// Live view of a mounted panel. Dropping it unmounts the panel.
pub struct PanelHandle<T> {
    shared: Arc<Shared<T>>,
    rx: watch::Receiver<PanelState<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Clone> PanelHandle<T> {
    pub fn name(&self) -> &'static str {
        self.shared.name
    }

    pub fn snapshot(&self) -> PanelState<T> {
        self.rx.borrow().clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.load(Ordering::SeqCst)
    }

    /// User-triggered fetch. Queued behind a fetch already in flight.
    pub fn refresh(&self) {
        if self.is_mounted() {
            self.shared.refresh.notify_one();
        }
    }

    /// Waits for the next state change. Returns false once unmounted.
    pub async fn changed(&mut self) -> bool {
        self.is_mounted() && self.rx.changed().await.is_ok()
    }

    /// Waits until the panel is no longer loading.
    pub async fn settled(&mut self) -> PanelState<T> {
        loop {
            {
                let state = self.rx.borrow_and_update();
                if state.status != PanelStatus::Loading {
                    return state.clone();
                }
            }
            if !self.changed().await {
                return self.snapshot();
            }
        }
    }

    pub fn unmount(&mut self) {
        self.shared.tx.send_if_modified(|_| {
            self.shared.mounted.store(false, Ordering::SeqCst);
            false
        });
        if let Some(task) = self.task.take() {
            task.abort();
            log(Level::Debug, Domain::Panel, "unmount", obj(&[("panel", v_str(self.shared.name))]));
        }
    }
}

impl<T> Drop for PanelHandle<T> {
    fn drop(&mut self) {
        self.shared.mounted.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
