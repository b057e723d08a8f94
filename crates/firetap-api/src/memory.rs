// ── In-process real-time store ──
//
// A JSON tree held behind an `ArcSwap` for wait-free reads. Writes are
// serialized so that every subscriber sees pushes in write order. Each
// write re-evaluates the subscribers whose path overlaps the written path
// and pushes a fresh full snapshot to those whose view actually changed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use arc_swap::ArcSwap;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::RealtimeStore;
use crate::error::Error;
use crate::query::{Query, Snapshot, is_ancestor_or_self, normalize_path, segments};
use crate::subscription::{Push, Subscription, SubscriptionHandle};

struct Subscriber {
    query: Query,
    tx: mpsc::UnboundedSender<Push>,
}

struct Inner {
    root: ArcSwap<Value>,
    write_lock: Mutex<()>,
    subscribers: DashMap<u64, Subscriber>,
    next_id: AtomicU64,
    next_push_key: AtomicU64,
    delivered: AtomicU64,
}

/// In-memory [`RealtimeStore`]. Cheaply cloneable; clones share the tree.
#[derive(Clone)]
pub struct MemoryRealtimeStore {
    inner: Arc<Inner>,
}

impl MemoryRealtimeStore {
    pub fn new() -> Self {
        Self::with_root(Value::Null)
    }

    /// Start from an existing tree.
    pub fn with_root(root: Value) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: ArcSwap::from_pointee(root),
                write_lock: Mutex::new(()),
                subscribers: DashMap::new(),
                next_id: AtomicU64::new(0),
                next_push_key: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
            }),
        }
    }

    /// Read the current value at `path`.
    pub fn get(&self, path: &str) -> Option<Value> {
        let root = self.inner.root.load();
        read_at(&root, &segments(path))
    }

    /// Replace the value at `path`. Writing `null` deletes the node.
    pub fn set(&self, path: &str, value: Value) {
        let _guard = self
            .inner
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let old_root = self.inner.root.load_full();
        let mut new_root = (*old_root).clone();
        write_at(&mut new_root, &segments(path), value);
        let new_root = Arc::new(new_root);
        self.inner.root.store(Arc::clone(&new_root));

        self.notify(path, &old_root, &new_root);
    }

    /// Delete the node at `path`.
    pub fn remove(&self, path: &str) {
        self.set(path, Value::Null);
    }

    /// Append a child under `path` with a generated, time-ordered key.
    pub fn push_child(&self, path: &str, value: Value) -> String {
        let n = self.inner.next_push_key.fetch_add(1, Ordering::Relaxed);
        let key = format!("-{n:016x}");
        self.set(&format!("{}/{key}", normalize_path(path)), value);
        key
    }

    /// Deliver a transport error to every subscriber of exactly `path`
    /// and cancel those subscriptions.
    pub fn fail(&self, path: &str, error: &Error) {
        let _guard = self
            .inner
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let target = normalize_path(path);
        let failed: Vec<u64> = self
            .inner
            .subscribers
            .iter()
            .filter(|s| s.value().query.target() == target)
            .map(|s| *s.key())
            .collect();

        for id in failed {
            if let Some((_, sub)) = self.inner.subscribers.remove(&id) {
                debug!(path = %target, %error, "cancelling subscription with error");
                if sub.tx.send(Err(error.clone())).is_ok() {
                    self.inner.delivered.fetch_add(1, Ordering::AcqRel);
                }
            }
        }
    }

    /// Number of attached subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Total pushes handed to open subscriptions since creation,
    /// initial snapshots and errors included. A consumer that has
    /// applied this many pushes has caught up with every write so far.
    pub fn delivered(&self) -> u64 {
        self.inner.delivered.load(Ordering::Acquire)
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn notify(&self, written: &str, old_root: &Value, new_root: &Value) {
        let mut closed = Vec::new();

        for entry in &self.inner.subscribers {
            let sub = entry.value();
            let target = sub.query.target();
            if !is_ancestor_or_self(target, written) && !is_ancestor_or_self(written, target) {
                continue;
            }

            let segs = segments(target);
            let before = sub.query.apply(read_at(old_root, &segs));
            let after = sub.query.apply(read_at(new_root, &segs));
            if before == after {
                continue;
            }

            trace!(path = %target, "pushing snapshot");
            if sub.tx.send(Ok(Snapshot::new(target, after))).is_ok() {
                self.inner.delivered.fetch_add(1, Ordering::AcqRel);
            } else {
                closed.push(*entry.key());
            }
        }

        for id in closed {
            self.inner.subscribers.remove(&id);
        }
    }
}

impl Default for MemoryRealtimeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeStore for MemoryRealtimeStore {
    fn subscribe(&self, query: Query) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        {
            // Registration and the initial push happen under the write lock
            // so no write can slip between them.
            let _guard = self
                .inner
                .write_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            let initial = query.apply(self.get(query.target()));
            if tx.send(Ok(Snapshot::new(query.target(), initial))).is_ok() {
                self.inner.delivered.fetch_add(1, Ordering::AcqRel);
            }
            debug!(%query, id, "subscription opened");
            self.inner.subscribers.insert(id, Subscriber { query, tx });
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = SubscriptionHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.remove(&id);
                debug!(id, "subscription closed");
            }
        });

        Subscription::new(rx, handle)
    }
}

// ── Tree manipulation ────────────────────────────────────────────────

fn read_at(root: &Value, segs: &[&str]) -> Option<Value> {
    let mut node = root;
    for seg in segs {
        node = node.as_object()?.get(*seg)?;
    }
    if node.is_null() {
        None
    } else {
        Some(node.clone())
    }
}

fn write_at(node: &mut Value, segs: &[&str], value: Value) {
    let Some((first, rest)) = segs.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(children) = node else {
        return;
    };

    if rest.is_empty() && value.is_null() {
        children.remove(*first);
        return;
    }

    let child = children
        .entry((*first).to_owned())
        .or_insert(Value::Null);
    write_at(child, rest, value);
    if child.is_null() || child.as_object().is_some_and(Map::is_empty) {
        children.remove(*first);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn drain(sub: &mut Subscription) -> Vec<Push> {
        let mut out = Vec::new();
        while let Some(p) = sub.try_recv() {
            out.push(p);
        }
        out
    }

    #[test]
    fn set_and_get_nested() {
        let store = MemoryRealtimeStore::new();
        store.set("devices/a/temperature", json!(21.5));
        store.set("devices/a/dht/humidity", json!(40));

        assert_eq!(store.get("devices/a/temperature"), Some(json!(21.5)));
        assert_eq!(
            store.get("devices/a"),
            Some(json!({ "temperature": 21.5, "dht": { "humidity": 40 } }))
        );
    }

    #[test]
    fn remove_prunes_empty_parents() {
        let store = MemoryRealtimeStore::new();
        store.set("devices/a/readings/r1", json!({ "smoke": 1 }));
        store.remove("devices/a/readings/r1");

        assert_eq!(store.get("devices/a"), None);
    }

    #[test]
    fn subscribe_delivers_initial_value() {
        let store = MemoryRealtimeStore::new();
        store.set("devices/a", json!({ "smoke": 3 }));

        let mut sub = store.subscribe(Query::path("devices/a"));
        let pushes = drain(&mut sub);

        assert_eq!(pushes.len(), 1);
        let snap = pushes.into_iter().next().unwrap().unwrap();
        assert!(snap.exists());
        assert_eq!(snap.value(), Some(&json!({ "smoke": 3 })));
    }

    #[test]
    fn initial_push_for_missing_path_is_empty() {
        let store = MemoryRealtimeStore::new();
        let mut sub = store.subscribe(Query::path("devices/missing"));

        let snap = sub.try_recv().unwrap().unwrap();
        assert!(!snap.exists());
    }

    #[test]
    fn writes_below_and_above_reach_subscriber() {
        let store = MemoryRealtimeStore::new();
        let mut sub = store.subscribe(Query::path("devices/a/readings"));
        drain(&mut sub);

        store.set("devices/a/readings/r1", json!({ "smoke": 1 }));
        store.set("devices/a", json!({ "readings": { "r2": { "smoke": 2 } } }));
        store.set("devices/b/smoke", json!(9));

        let pushes = drain(&mut sub);
        assert_eq!(pushes.len(), 2);
        let last = pushes.into_iter().last().unwrap().unwrap();
        assert_eq!(last.value(), Some(&json!({ "r2": { "smoke": 2 } })));
    }

    #[test]
    fn unchanged_view_is_not_pushed() {
        let store = MemoryRealtimeStore::new();
        store.set("devices/a/smoke", json!(1));
        let mut sub = store.subscribe(Query::path("devices/a"));
        drain(&mut sub);

        store.set("devices/a/smoke", json!(1));
        assert!(drain(&mut sub).is_empty());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let store = MemoryRealtimeStore::new();
        let mut sub = store.subscribe(Query::path("devices/a"));
        assert_eq!(store.subscriber_count(), 1);

        sub.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);

        store.set("devices/a/smoke", json!(5));
        assert!(drain(&mut sub).into_iter().all(|p| p.is_ok()));
    }

    #[test]
    fn fail_cancels_matching_subscriptions() {
        let store = MemoryRealtimeStore::new();
        let mut sub = store.subscribe(Query::path("devices/a"));
        let mut other = store.subscribe(Query::path("devices/b"));
        drain(&mut sub);
        drain(&mut other);

        store.fail(
            "devices/a",
            &Error::PermissionDenied {
                path: "devices/a".into(),
            },
        );

        let pushes = drain(&mut sub);
        assert!(matches!(pushes.as_slice(), [Err(Error::PermissionDenied { .. })]));
        assert_eq!(store.subscriber_count(), 1);
        assert!(drain(&mut other).is_empty());
    }

    #[test]
    fn delivered_counts_every_push() {
        let store = MemoryRealtimeStore::new();
        let mut sub = store.subscribe(Query::path("devices/a"));
        let _other = store.subscribe(Query::path("devices/b"));
        assert_eq!(store.delivered(), 2);

        store.set("devices/a/smoke", json!(1));
        store.set("devices/a/smoke", json!(1));
        assert_eq!(store.delivered(), 3);

        store.fail("devices/a", &Error::Disconnected);
        assert_eq!(store.delivered(), 4);
        assert_eq!(drain(&mut sub).len(), 3);

        // The failed subscription is gone; later writes reach nobody.
        store.set("devices/a/smoke", json!(2));
        assert_eq!(store.delivered(), 4);
    }

    #[test]
    fn limited_query_only_pushes_window() {
        let store = MemoryRealtimeStore::new();
        let query = Query::path("devices/a/statusHistory")
            .order_by_child("timestamp")
            .limit_to_last(1);
        let mut sub = store.subscribe(query);
        drain(&mut sub);

        store.set("devices/a/statusHistory/s1", json!({ "timestamp": 10 }));
        store.set("devices/a/statusHistory/s0", json!({ "timestamp": 5 }));

        let pushes = drain(&mut sub);
        // The older entry never enters the one-element window.
        assert_eq!(pushes.len(), 1);
    }

    #[test]
    fn push_child_generates_ordered_keys() {
        let store = MemoryRealtimeStore::new();
        let k1 = store.push_child("devices/a/readings", json!({ "smoke": 1 }));
        let k2 = store.push_child("devices/a/readings", json!({ "smoke": 2 }));

        assert!(k1 < k2);
        assert_eq!(
            store.get(&format!("devices/a/readings/{k2}")),
            Some(json!({ "smoke": 2 }))
        );
    }
}
