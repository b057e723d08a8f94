// ── Device monitor ──
//
// Subscription coordinator for one device at a time. `start()` opens the
// three feeds and hands their receivers to a single event-loop task that
// owns the `DeviceContext`, so pushes are applied one at a time, each to
// completion. `stop()` detaches the feeds, raises the stopped guard, and
// joins the task before returning: once it returns, no queued push can
// touch state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use firetap_api::{DevicePaths, Push, Query, RealtimeStore, SubscriptionHandle};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::alerts::AlertSignal;
use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::model::DeviceId;
use crate::persist::HistoryStore;
use crate::reconcile::{DeviceContext, Feed};
use crate::store::{DeviceStore, MonitorPhase};

/// Child key the alert feed is ordered by.
const ALERT_ORDER_KEY: &str = "timestamp";

// ── DeviceMonitor ────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<MonitorInner>`. Watches one device at a
/// time and publishes its reconciled state through [`state()`](Self::state).
#[derive(Clone)]
pub struct DeviceMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    source: Arc<dyn RealtimeStore>,
    history: HistoryStore,
    alerts: Arc<dyn AlertSignal>,
    config: MonitorConfig,
    store: Arc<DeviceStore>,
    session: Mutex<Option<Session>>,
}

/// Everything `stop()` has to release.
struct Session {
    device: DeviceId,
    cancel: CancellationToken,
    stopped: Arc<AtomicBool>,
    handles: Vec<SubscriptionHandle>,
    task: JoinHandle<()>,
}

impl DeviceMonitor {
    /// Create an idle monitor. Does NOT subscribe -- call
    /// [`start()`](Self::start) to begin watching a device.
    pub fn new(
        source: Arc<dyn RealtimeStore>,
        history: HistoryStore,
        alerts: Arc<dyn AlertSignal>,
        config: MonitorConfig,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(MonitorInner {
                source,
                history,
                alerts,
                config,
                store: Arc::new(DeviceStore::new()),
                session: Mutex::new(None),
            }),
        })
    }

    /// Reactive state of the watched device.
    pub fn state(&self) -> &Arc<DeviceStore> {
        &self.inner.store
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// The device currently being watched, if any.
    pub async fn device_id(&self) -> Option<DeviceId> {
        self.inner
            .session
            .lock()
            .await
            .as_ref()
            .map(|s| s.device.clone())
    }

    pub async fn is_running(&self) -> bool {
        self.inner.session.lock().await.is_some()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start watching `device`.
    ///
    /// Loads the persisted timeline, enters `Loading`, and opens the
    /// current-state, readings-archive, and alert-feed subscriptions. A
    /// monitor that is already running is fully stopped first.
    pub async fn start(&self, device: DeviceId) {
        let mut session = self.inner.session.lock().await;
        if let Some(previous) = session.take() {
            debug!(device_id = %previous.device, "restarting monitor");
            self.shutdown(Some(previous)).await;
        }

        let inner = &self.inner;
        let ctx = DeviceContext::open(
            device.clone(),
            &inner.config,
            inner.history.clone(),
            Arc::clone(&inner.store),
        );

        let paths = DevicePaths::new(device.as_str());
        let subscribe = |feed: Feed, query: Query| {
            debug!(device_id = %device, %feed, %query, "subscribing");
            inner.source.subscribe(query).into_parts()
        };
        let (current, current_handle) = subscribe(Feed::Current, Query::path(paths.current()));
        let (archive, archive_handle) = subscribe(Feed::Archive, Query::path(paths.readings()));
        let (alerts, alerts_handle) = subscribe(
            Feed::Alerts,
            Query::path(paths.status_history())
                .order_by_child(ALERT_ORDER_KEY)
                .limit_to_last(inner.config.alert_card_limit),
        );

        let cancel = CancellationToken::new();
        let stopped = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(event_loop(
            ctx,
            Receivers {
                current,
                archive,
                alerts,
            },
            cancel.clone(),
            Arc::clone(&stopped),
        ));

        info!(device_id = %device, "monitor started");
        *session = Some(Session {
            device,
            cancel,
            stopped,
            handles: vec![current_handle, archive_handle, alerts_handle],
            task,
        });
    }

    /// Stop watching. Idempotent. Always cancels dependent alerts and
    /// returns the phase to `Idle`.
    pub async fn stop(&self) {
        let mut session = self.inner.session.lock().await;
        self.shutdown(session.take()).await;
    }

    // ── Private helpers ──────────────────────────────────────────

    async fn shutdown(&self, session: Option<Session>) {
        if let Some(mut session) = session {
            session.stopped.store(true, Ordering::Release);
            for handle in &mut session.handles {
                handle.unsubscribe();
            }
            session.cancel.cancel();
            if let Err(e) = session.task.await {
                warn!(device_id = %session.device, error = %e, "event loop ended abnormally");
            }
            info!(device_id = %session.device, "monitor stopped");
        }

        self.inner.alerts.stop_all_alerts();
        self.inner.store.set_phase(MonitorPhase::Idle);
    }
}

impl Drop for MonitorInner {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.stopped.store(true, Ordering::Release);
            session.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for DeviceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceMonitor")
            .field("config", &self.inner.config)
            .field("history", &self.inner.history)
            .field("state", &self.inner.store)
            .finish_non_exhaustive()
    }
}

// ── Event loop ───────────────────────────────────────────────────

struct Receivers {
    current: mpsc::UnboundedReceiver<Push>,
    archive: mpsc::UnboundedReceiver<Push>,
    alerts: mpsc::UnboundedReceiver<Push>,
}

/// Apply pushes from all three feeds, one at a time, until cancelled.
async fn event_loop(
    mut ctx: DeviceContext,
    mut rx: Receivers,
    cancel: CancellationToken,
    stopped: Arc<AtomicBool>,
) {
    loop {
        let (feed, push) = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            Some(push) = rx.current.recv() => (Feed::Current, push),
            Some(push) = rx.archive.recv() => (Feed::Archive, push),
            Some(push) = rx.alerts.recv() => (Feed::Alerts, push),
        };

        if stopped.load(Ordering::Acquire) {
            break;
        }
        ctx.apply(feed, push, Utc::now());
    }

    debug!(device_id = %ctx.device(), "event loop exited");
}
