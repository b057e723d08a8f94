// ── Raw-snapshot-to-domain conversions ──
//
// Bridges untyped device payloads into canonical `Reading`s. Two firmware
// generations publish under the same paths: the legacy layout nests
// climate data under `dht` and the digital smoke flag under `mq2_do`,
// while newer devices put `temperature`/`humidity` at the top level and
// report the analog sensor as an `mq2` node. One normalizer handles both,
// for the current-state node and for every archived entry alike.
//
// Every lookup is an explicit presence check: a present `0` is a value,
// a `null` or a missing key is absent.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde_json::Value;
use tracing::trace;

use crate::classify::classify;
use crate::model::{ButtonEvent, GasStatus, Reading, ReadingId, ReadingStatus};

/// Fields tried in order for the analog smoke value.
const SMOKE_ANALOG_KEYS: &[&str] = &["smokeLevel", "smoke", "smokeAnalog", "mq2"];

const SENSOR_ERROR_MESSAGE: &str = "Sensor Error";
const ALERT_CARD_MESSAGE: &str = "Alert";
const ALARM_TYPE: &str = "alarm";

// ── Helpers ────────────────────────────────────────────────────────

/// Look up a (possibly nested) key, treating JSON `null` as absent.
fn field<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(raw, |node, key| node.get(*key))
        .filter(|v| !v.is_null())
}

/// A number, or a string that parses as one.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// A non-empty string.
fn as_text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn flag(raw: &Value, path: &[&str]) -> bool {
    field(raw, path).and_then(Value::as_bool) == Some(true)
}

fn number_at(raw: &Value, path: &[&str]) -> Option<f64> {
    field(raw, path).and_then(as_number)
}

/// Convert an epoch-millis value to `DateTime<Utc>`.
fn millis_to_datetime(ms: f64) -> Option<DateTime<Utc>> {
    #[allow(clippy::cast_possible_truncation)]
    let ms = ms.trunc() as i64;
    DateTime::from_timestamp_millis(ms)
}

/// Parse a device timestamp: epoch millis (number or numeric string),
/// RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS` taken as UTC.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::Number(n) => n.as_f64().and_then(millis_to_datetime),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                        .map(|naive| naive.and_utc())
                        .ok()
                })
                .or_else(|| s.parse::<f64>().ok().and_then(millis_to_datetime))
        }
        _ => None,
    };
    parsed.map(|dt| dt.trunc_subsecs(3))
}

/// First parseable timestamp along the fallback chain.
fn resolve_timestamp(raw: &Value, now: DateTime<Utc>) -> DateTime<Utc> {
    const CHAIN: &[&[&str]] = &[
        &["status", "lastEventAt"],
        &["lastSeen"],
        &["dht", "timestamp"],
        &["mq2_do", "timestamp"],
        &["mq2", "timestamp"],
        &["timestamp"],
    ];

    CHAIN
        .iter()
        .find_map(|path| field(raw, path).and_then(parse_timestamp))
        .unwrap_or_else(|| now.trunc_subsecs(3))
}

fn smoke_analog(raw: &Value) -> f64 {
    SMOKE_ANALOG_KEYS
        .iter()
        .find_map(|key| number_at(raw, &[*key]))
        .unwrap_or(0.0)
}

fn smoke_detected(raw: &Value) -> bool {
    flag(raw, &["smokeDetected"])
        || flag(raw, &["mq2_do", "smokeDetected"])
        || field(raw, &["mq2", "status"])
            .and_then(Value::as_str)
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("smoke detected"))
}

fn gas_status(raw: &Value) -> GasStatus {
    field(raw, &["gasStatus"])
        .and_then(as_text)
        .map(GasStatus::from)
        .unwrap_or_default()
}

// ── Device snapshot ────────────────────────────────────────────────

/// Normalize one raw device snapshot. Pure: the same input, id, and `now`
/// always produce the same reading.
pub fn normalize(raw: &Value, id: ReadingId, now: DateTime<Utc>) -> Reading {
    let button_state = field(raw, &["status", "state"])
        .and_then(as_text)
        .unwrap_or("idle")
        .to_owned();
    let button_event = ButtonEvent::from_state(&button_state);
    let sensor_error = flag(raw, &["sensorError"]);

    let message = button_event
        .message()
        .or_else(|| field(raw, &["message"]).and_then(as_text))
        .or(sensor_error.then_some(SENSOR_ERROR_MESSAGE))
        .unwrap_or_default()
        .to_owned();

    let mut reading = Reading {
        id,
        timestamp: resolve_timestamp(raw, now),
        smoke_analog: smoke_analog(raw),
        smoke_detected: smoke_detected(raw),
        gas_status: gas_status(raw),
        temperature: number_at(raw, &["temperature"])
            .or_else(|| number_at(raw, &["dht", "temperature"])),
        humidity: number_at(raw, &["humidity"]).or_else(|| number_at(raw, &["dht", "humidity"])),
        message,
        sensor_error,
        sprinkler_active: flag(raw, &["sprinklerActive"])
            || button_event == ButtonEvent::Sprinkler,
        button_event,
        button_state,
        last_type: field(raw, &["lastType"]).and_then(as_text).map(str::to_owned),
        status: ReadingStatus::Safe,
    };
    reading.status = classify(&reading, button_event);
    reading
}

/// Normalize the current-state node. Live readings are keyed by `now`.
pub fn normalize_current(raw: &Value, now: DateTime<Utc>) -> Reading {
    normalize(raw, ReadingId::Live(now.timestamp_millis()), now)
}

/// Normalize every entry of a readings archive, in archive-key order.
/// Entries that are not objects carry no reading and are skipped.
pub fn normalize_archive(archive: &Value, now: DateTime<Utc>) -> Vec<Arc<Reading>> {
    let Some(entries) = archive.as_object() else {
        return Vec::new();
    };

    let mut keyed: Vec<(&String, &Value)> = entries.iter().collect();
    keyed.sort_by(|a, b| a.0.cmp(b.0));

    keyed
        .into_iter()
        .filter_map(|(key, value)| {
            if value.is_object() {
                Some(Arc::new(normalize(value, ReadingId::Archive(key.clone()), now)))
            } else {
                trace!(key = %key, "skipping non-object archive entry");
                None
            }
        })
        .collect()
}

// ── Alert feed ─────────────────────────────────────────────────────

/// Map one `statusHistory` entry to an alert card. Cards are always
/// alarms, whatever the entry says.
pub fn normalize_alert_entry(key: &str, raw: &Value, now: DateTime<Utc>) -> Reading {
    Reading {
        id: ReadingId::Archive(key.to_owned()),
        timestamp: field(raw, &["timestamp"])
            .and_then(parse_timestamp)
            .unwrap_or_else(|| now.trunc_subsecs(3)),
        smoke_analog: number_at(raw, &["smokeLevel"]).unwrap_or(0.0),
        smoke_detected: false,
        gas_status: gas_status(raw),
        temperature: number_at(raw, &["temperature"]),
        humidity: number_at(raw, &["humidity"]),
        message: field(raw, &["message"])
            .and_then(as_text)
            .unwrap_or(ALERT_CARD_MESSAGE)
            .to_owned(),
        sensor_error: false,
        sprinkler_active: false,
        button_event: ButtonEvent::Idle,
        button_state: "idle".into(),
        last_type: Some(ALARM_TYPE.into()),
        status: ReadingStatus::Alert,
    }
}

/// Build the alert cards from an alert-feed snapshot: newest first,
/// at most `limit`.
pub fn normalize_alert_feed(feed: &Value, limit: usize, now: DateTime<Utc>) -> Vec<Arc<Reading>> {
    let Some(entries) = feed.as_object() else {
        return Vec::new();
    };

    let mut cards: Vec<Arc<Reading>> = entries
        .iter()
        .map(|(key, value)| Arc::new(normalize_alert_entry(key, value, now)))
        .collect();
    cards.sort_by(|a, b| {
        Reverse(a.timestamp)
            .cmp(&Reverse(b.timestamp))
            .then_with(|| a.id.cmp(&b.id))
    });
    cards.truncate(limit);
    cards
}
