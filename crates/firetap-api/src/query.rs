// ── Paths, queries, and snapshots ──
//
// Paths are slash-separated keys (`devices/abc/readings`). Leading,
// trailing, and repeated slashes are ignored.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Path helpers ─────────────────────────────────────────────────────

/// Split a path into its non-empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Canonical form of a path: segments joined by a single `/`.
pub fn normalize_path(path: &str) -> String {
    segments(path).join("/")
}

/// `true` if `ancestor` is `path` itself or one of its parents.
pub fn is_ancestor_or_self(ancestor: &str, path: &str) -> bool {
    let a = segments(ancestor);
    let p = segments(path);
    a.len() <= p.len() && a.iter().zip(p.iter()).all(|(x, y)| x == y)
}

/// The well-known paths a single device publishes under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePaths {
    device_id: String,
}

impl DevicePaths {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
        }
    }

    /// `devices/{id}`: full current state.
    pub fn current(&self) -> String {
        format!("devices/{}", self.device_id)
    }

    /// `devices/{id}/readings`: archived readings keyed by entry id.
    pub fn readings(&self) -> String {
        format!("devices/{}/readings", self.device_id)
    }

    /// `devices/{id}/statusHistory`: alert feed.
    pub fn status_history(&self) -> String {
        format!("devices/{}/statusHistory", self.device_id)
    }
}

// ── Query ────────────────────────────────────────────────────────────

/// A subscription target: a path plus optional child ordering and limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    path: String,
    order_by_child: Option<String>,
    limit_to_last: Option<usize>,
}

impl Query {
    pub fn path(path: impl AsRef<str>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            order_by_child: None,
            limit_to_last: None,
        }
    }

    /// Order children by the value of `child`.
    pub fn order_by_child(mut self, child: impl Into<String>) -> Self {
        self.order_by_child = Some(child.into());
        self
    }

    /// Keep only the last `limit` children in query order.
    pub fn limit_to_last(mut self, limit: usize) -> Self {
        self.limit_to_last = Some(limit);
        self
    }

    pub fn target(&self) -> &str {
        &self.path
    }

    pub fn ordered_by(&self) -> Option<&str> {
        self.order_by_child.as_deref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit_to_last
    }

    /// Apply ordering and limit to the raw value found at the query path.
    ///
    /// Modifiers only affect object values; scalars pass through untouched.
    pub fn apply(&self, value: Option<Value>) -> Option<Value> {
        let Some(limit) = self.limit_to_last else {
            return value;
        };
        let Some(Value::Object(children)) = value else {
            return value;
        };

        let mut entries: Vec<(String, Value)> = children.into_iter().collect();
        match &self.order_by_child {
            Some(child) => entries.sort_by(|(ka, va), (kb, vb)| {
                compare_values(va.get(child), vb.get(child)).then_with(|| ka.cmp(kb))
            }),
            None => entries.sort_by(|(ka, _), (kb, _)| ka.cmp(kb)),
        }

        let skip = entries.len().saturating_sub(limit);
        let kept: Map<String, Value> = entries.into_iter().skip(skip).collect();
        if kept.is_empty() {
            None
        } else {
            Some(Value::Object(kept))
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if let Some(child) = &self.order_by_child {
            write!(f, "?orderBy={child}")?;
        }
        if let Some(limit) = self.limit_to_last {
            write!(f, "&limitToLast={limit}")?;
        }
        Ok(())
    }
}

/// Child ordering: missing/null < false < true < numbers < strings < objects.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(false)) => 1,
            Some(Value::Bool(true)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(Value::Array(_) | Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────

/// The full value at a path at one point in time.
///
/// A JSON `null` is normalized to "no data", matching the store's
/// semantics where writing `null` deletes a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    path: String,
    value: Option<Value>,
}

impl Snapshot {
    pub fn new(path: impl AsRef<str>, value: Option<Value>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            value: value.filter(|v| !v.is_null()),
        }
    }

    pub fn empty(path: impl AsRef<str>) -> Self {
        Self::new(path, None)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The last path segment.
    pub fn key(&self) -> Option<&str> {
        self.path.rsplit('/').next().filter(|k| !k.is_empty())
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn normalize_strips_redundant_slashes() {
        assert_eq!(normalize_path("/devices//abc/"), "devices/abc");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn ancestor_check() {
        assert!(is_ancestor_or_self("devices/a", "devices/a/readings"));
        assert!(is_ancestor_or_self("devices/a", "devices/a"));
        assert!(is_ancestor_or_self("", "devices/a"));
        assert!(!is_ancestor_or_self("devices/a/readings", "devices/a"));
        assert!(!is_ancestor_or_self("devices/ab", "devices/a"));
    }

    #[test]
    fn device_paths() {
        let p = DevicePaths::new("FT-01");
        assert_eq!(p.current(), "devices/FT-01");
        assert_eq!(p.readings(), "devices/FT-01/readings");
        assert_eq!(p.status_history(), "devices/FT-01/statusHistory");
    }

    #[test]
    fn limit_to_last_keeps_newest_by_child() {
        let q = Query::path("devices/a/statusHistory")
            .order_by_child("timestamp")
            .limit_to_last(2);
        let raw = json!({
            "k1": { "timestamp": 300 },
            "k2": { "timestamp": 100 },
            "k3": { "timestamp": 200 },
        });

        let out = q.apply(Some(raw)).unwrap();
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["k1", "k3"]);
    }

    #[test]
    fn missing_child_sorts_first() {
        let q = Query::path("x").order_by_child("timestamp").limit_to_last(1);
        let raw = json!({
            "a": { "timestamp": 1 },
            "b": { "other": true },
        });

        let out = q.apply(Some(raw)).unwrap();
        assert!(out.get("a").is_some());
    }

    #[test]
    fn modifiers_ignore_scalars() {
        let q = Query::path("x").limit_to_last(1);
        assert_eq!(q.apply(Some(json!(42))), Some(json!(42)));
        assert_eq!(q.apply(None), None);
    }

    #[test]
    fn null_snapshot_does_not_exist() {
        let snap = Snapshot::new("devices/a", Some(Value::Null));
        assert!(!snap.exists());
        assert_eq!(snap.key(), Some("a"));
    }

    #[test]
    fn query_display() {
        let q = Query::path("devices/a/statusHistory")
            .order_by_child("timestamp")
            .limit_to_last(5);
        assert_eq!(
            q.to_string(),
            "devices/a/statusHistory?orderBy=timestamp&limitToLast=5"
        );
    }
}
