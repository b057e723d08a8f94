//! `firetap replay`: drive a monitor from a recorded data-store script.
//!
//! The script is a JSON array of steps applied, in order, to an in-memory
//! data store while a [`DeviceMonitor`] watches one device:
//!
//! ```json
//! [
//!   { "path": "devices/d1", "value": { "smokeLevel": 120, "lastSeen": 1700000000000 } },
//!   { "path": "devices/d1/statusHistory/-a1", "value": { "timestamp": 1700000000500 } },
//!   { "path": "devices/d1", "value": null },
//!   { "path": "devices/d1", "error": "permission_denied" }
//! ]
//! ```
//!
//! A `null` value deletes the node. An `error` step fails every
//! subscription on exactly that path. History is persisted to the
//! configured storage directory, like a live session would.
//!
//! Each step is applied only after the monitor has caught up with every
//! push the previous one produced, so the report never depends on how
//! fast the event loop happens to run.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use firetap_api::MemoryRealtimeStore;
use firetap_core::{
    AlertCards, DeviceId, DeviceMonitor, DeviceStore, LoggingAlertSignal, MonitorPhase, Reading,
    Timeline,
};

use crate::cli::ReplayArgs;
use crate::error::CliError;
use crate::output::{self, ReadingRow};

use super::{Context, device_id, read_json};

/// How long the monitor may take to catch up with a single step.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

// ── Script ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Set(Value),
    Remove,
    Fail(firetap_api::Error),
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    path: String,
    action: Action,
}

impl Step {
    fn apply(&self, db: &MemoryRealtimeStore) {
        match &self.action {
            Action::Set(value) => db.set(&self.path, value.clone()),
            Action::Remove => db.remove(&self.path),
            Action::Fail(error) => db.fail(&self.path, error),
        }
    }
}

fn parse_script(script: &Value) -> Result<Vec<Step>, CliError> {
    let steps = script.as_array().ok_or_else(|| CliError::InvalidScript {
        step: 0,
        reason: "script must be a JSON array".into(),
    })?;

    steps
        .iter()
        .enumerate()
        .map(|(i, raw)| parse_step(i + 1, raw))
        .collect()
}

fn parse_step(step: usize, raw: &Value) -> Result<Step, CliError> {
    let invalid = |reason: &str| CliError::InvalidScript {
        step,
        reason: reason.into(),
    };

    let path = raw
        .get("path")
        .and_then(Value::as_str)
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| invalid("missing \"path\""))?
        .to_owned();

    let action = match (raw.get("value"), raw.get("error")) {
        (Some(_), Some(_)) => return Err(invalid("\"value\" and \"error\" are exclusive")),
        (Some(Value::Null), None) => Action::Remove,
        (Some(value), None) => Action::Set(value.clone()),
        (None, Some(kind)) => {
            let kind = kind
                .as_str()
                .ok_or_else(|| invalid("\"error\" must be a string"))?;
            let reason = raw
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("replayed failure");
            Action::Fail(transport_error(kind, &path, reason).ok_or_else(|| {
                CliError::InvalidScript {
                    step,
                    reason: format!("unknown error kind '{kind}'"),
                }
            })?)
        }
        (None, None) => return Err(invalid("expected \"value\" or \"error\"")),
    };

    Ok(Step { path, action })
}

fn transport_error(kind: &str, path: &str, reason: &str) -> Option<firetap_api::Error> {
    let path = path.to_owned();
    Some(match kind {
        "permission_denied" => firetap_api::Error::PermissionDenied { path },
        "unreachable" => firetap_api::Error::Unreachable {
            path,
            reason: reason.to_owned(),
        },
        "disconnected" => firetap_api::Error::Disconnected,
        "invalid_path" => firetap_api::Error::InvalidPath { path },
        _ => return None,
    })
}

// ── Report ──────────────────────────────────────────────────────────

/// State of the monitor once the script has been applied.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    device: DeviceId,
    phase: MonitorPhase,
    latest: Option<Arc<Reading>>,
    timeline: Arc<Timeline>,
    alert_cards: AlertCards,
}

impl ReplayReport {
    fn capture(device: DeviceId, state: &DeviceStore) -> Self {
        Self {
            device,
            phase: state.phase(),
            latest: state.latest(),
            timeline: state.timeline(),
            alert_cards: state.alert_cards(),
        }
    }

    fn detail(&self, color: bool) -> String {
        let table = |readings: &[Arc<Reading>]| {
            tabled::Table::new(readings.iter().map(|r| ReadingRow::new(r, color)))
                .with(tabled::settings::Style::rounded())
                .to_string()
        };

        let mut out = vec![format!("Device: {}  Phase: {}", self.device, self.phase)];
        match &self.latest {
            Some(latest) => {
                out.push(String::new());
                out.push("Latest".into());
                out.push(output::reading_detail(latest, color));
            }
            None => out.push("No current reading".into()),
        }
        out.push(String::new());
        out.push(format!("Timeline ({} entries)", self.timeline.len()));
        out.push(table(self.timeline.as_slice()));
        if !self.alert_cards.is_empty() {
            out.push(String::new());
            out.push(format!("Alert cards ({})", self.alert_cards.len()));
            out.push(table(self.alert_cards.as_slice()));
        }
        out.join("\n")
    }

    /// Plain mode: timeline identifiers, newest first.
    fn ids(&self) -> String {
        self.timeline
            .iter()
            .map(|r| output::reading_id(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ── Handler ─────────────────────────────────────────────────────────

/// Wait until the monitor has applied every push `db` has delivered.
async fn settle(db: &MemoryRealtimeStore, state: &DeviceStore) -> Result<(), CliError> {
    let target = db.delivered();
    let mut applied = state.subscribe_applied();
    match tokio::time::timeout(SETTLE_TIMEOUT, applied.wait_for(|n| *n >= target)).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) | Err(_) => Err(CliError::Internal(format!(
            "monitor applied {} of {target} replayed pushes",
            state.applied()
        ))),
    }
}

pub async fn handle(args: ReplayArgs, ctx: &Context) -> Result<(), CliError> {
    let device = device_id(&args.device)?;
    let steps = parse_script(&read_json(&args.script)?)?;
    let delay = Duration::from_millis(args.step_delay_ms);

    let db = MemoryRealtimeStore::new();
    let monitor = DeviceMonitor::new(
        Arc::new(db.clone()),
        ctx.history_store(),
        Arc::new(LoggingAlertSignal),
        ctx.config.monitor.clone(),
    )?;

    monitor.start(device.clone()).await;
    settle(&db, monitor.state()).await?;

    for (i, step) in steps.iter().enumerate() {
        tokio::time::sleep(delay).await;
        debug!(step = i + 1, path = %step.path, "applying replay step");
        step.apply(&db);
        settle(&db, monitor.state()).await?;
    }

    let report = ReplayReport::capture(device, monitor.state());
    monitor.stop().await;
    info!(
        device_id = %report.device,
        steps = steps.len(),
        timeline = report.timeline.len(),
        "replay finished"
    );

    let out = output::render_single(
        ctx.output,
        &report,
        |r| r.detail(ctx.color),
        ReplayReport::ids,
    )?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
