//! Structured logging for the dashboard client.
//!
//! Every record is one JSON line with a run id, a monotonically increasing
//! sequence number, a level, a component (domain) and an event name. Records
//! go to stderr; when `LOG_DIR` is set they are also appended to
//! `LOG_DIR/<run_id>/events.jsonl` so a session can be replayed afterwards.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            Ok("fatal") => Level::Fatal,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains (categories for filtering)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Tour,    // Walkthrough transitions, scroll fallbacks
    Panel,   // Per-panel fetch lifecycle
    Join,    // Confidence join
    Compute, // Scenario / new-product simulator requests
    Http,    // Raw transport
    Persist, // Flag store
    System,  // Startup, shutdown
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Tour => "tour",
            Domain::Panel => "panel",
            Domain::Join => "join",
            Domain::Compute => "compute",
            Domain::Http => "http",
            Domain::Persist => "persist",
            Domain::System => "system",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS is a comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let events = std::env::var("LOG_DIR").ok().and_then(|base| {
            let mut run_dir = PathBuf::from(base);
            run_dir.push(&run_id);
            if let Err(err) = create_dir_all(&run_dir) {
                eprintln!("[log] failed to create run dir: {}", err);
                return None;
            }
            match File::create(run_dir.join("events.jsonl")) {
                Ok(f) => Some(Mutex::new(BufWriter::new(f))),
                Err(err) => {
                    eprintln!("[log] failed to create events log: {}", err);
                    None
                }
            }
        });
        RunContext { run_id, events }
    })
}

fn write_line(writer: &Mutex<BufWriter<File>>, line: &str) {
    if let Ok(mut w) = writer.lock() {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

/// Pulls correlation fields out of `data` onto the top level of the record.
fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["panel", "flow", "step", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let min_level = Level::from_env();
    if level < min_level || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let line = Value::Object(build_record(&ctx.run_id, level, component, event, fields)).to_string();
    if let Some(events) = &ctx.events {
        write_line(events, &line);
    }
    eprintln!("{}", line);
}

fn build_record(
    run_id: &str,
    level: Level,
    component: &str,
    event: &str,
    fields: Map<String, Value>,
) -> Map<String, Value> {
    let (mut top, data) = split_fields(fields);
    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));
    entry
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_fetch(panel: &str, path: &str, seq: u64) {
    log(
        Level::Debug,
        Domain::Panel,
        "fetch",
        obj(&[
            ("panel", v_str(panel)),
            ("path", v_str(path)),
            ("req_seq", json!(seq)),
        ]),
    );
}

pub fn log_panel_error(panel: &str, path: &str, kind: &str, err: &str) {
    log(
        Level::Warn,
        Domain::Panel,
        "fetch_failed",
        obj(&[
            ("panel", v_str(panel)),
            ("path", v_str(path)),
            ("kind", v_str(kind)),
            ("msg", v_str(err)),
        ]),
    );
}

pub fn log_transition(event: &str, step: usize, step_count: usize, detail: &str) {
    log(
        Level::Info,
        Domain::Tour,
        event,
        obj(&[
            ("step", json!(step)),
            ("step_count", json!(step_count)),
            ("detail", v_str(detail)),
        ]),
    );
}

pub fn log_compute(flow: &str, event: &str, generation: u64, fields: &[(&str, Value)]) {
    let mut map = obj(fields);
    map.insert("flow".to_string(), v_str(flow));
    map.insert("generation".to_string(), json!(generation));
    let level = if event.ends_with("failed") { Level::Warn } else { Level::Info };
    log(level, Domain::Compute, event, map);
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(Level::Trace < Level::Info);
        assert!(Level::Warn < Level::Error);
        assert_eq!(Level::Fatal.as_str(), "fatal");
    }

    #[test]
    fn record_lifts_correlation_fields() {
        let rec = build_record(
            "r-test",
            Level::Warn,
            "panel",
            "fetch_failed",
            obj(&[
                ("panel", v_str("kpis")),
                ("msg", v_str("boom")),
                ("path", v_str("/api/kpis")),
            ]),
        );
        assert_eq!(rec["lvl"], "WARN");
        assert_eq!(rec["panel"], "kpis");
        assert_eq!(rec["msg"], "boom");
        assert_eq!(rec["data"]["path"], "/api/kpis");
        assert!(rec["data"].get("panel").is_none());
    }

    #[test]
    fn obj_preserves_pairs() {
        let m = obj(&[("a", v_num(1.5)), ("b", v_str("x"))]);
        assert_eq!(m["a"], json!(1.5));
        assert_eq!(m["b"], json!("x"));
    }
}
