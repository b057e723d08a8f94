// ── Status classification ──
//
// A fixed priority table: the first matching rule decides. Button
// overrides sit above every sensor signal, so an active sprinkler reports
// Safe even while the sensor is faulted.

use crate::model::{ButtonEvent, Reading, ReadingStatus};

/// Device messages that mean somebody raised an alarm.
pub const ALARM_PHRASES: &[&str] = &["help requested", "alarm has been triggered"];

/// Derive the safety status of `reading` under the given button event.
pub fn classify(reading: &Reading, button: ButtonEvent) -> ReadingStatus {
    match button {
        ButtonEvent::Alert => return ReadingStatus::Alert,
        ButtonEvent::Sprinkler => return ReadingStatus::Safe,
        ButtonEvent::Idle => {}
    }

    if reading.sensor_error
        || ALARM_PHRASES.contains(&reading.message.as_str())
        || reading.last_type.as_deref() == Some("alarm")
        || reading.gas_status.is_alarming()
    {
        ReadingStatus::Alert
    } else if reading.smoke_detected {
        ReadingStatus::SmokeDetected
    } else {
        ReadingStatus::Safe
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{GasStatus, ReadingId};

    fn base() -> Reading {
        Reading {
            id: ReadingId::Live(0),
            timestamp: Utc::now(),
            smoke_analog: 0.0,
            smoke_detected: false,
            gas_status: GasStatus::Normal,
            temperature: None,
            humidity: None,
            message: String::new(),
            sensor_error: false,
            sprinkler_active: false,
            button_event: ButtonEvent::Idle,
            button_state: "idle".into(),
            last_type: None,
            status: ReadingStatus::Safe,
        }
    }

    #[test]
    fn quiet_reading_is_safe() {
        assert_eq!(classify(&base(), ButtonEvent::Idle), ReadingStatus::Safe);
    }

    #[test]
    fn alert_button_beats_everything() {
        let r = Reading {
            smoke_detected: true,
            ..base()
        };
        assert_eq!(classify(&r, ButtonEvent::Alert), ReadingStatus::Alert);
    }

    #[test]
    fn sprinkler_button_beats_sensor_signals() {
        let r = Reading {
            sensor_error: true,
            smoke_detected: true,
            gas_status: GasStatus::Critical,
            ..base()
        };
        assert_eq!(classify(&r, ButtonEvent::Sprinkler), ReadingStatus::Safe);
    }

    #[test]
    fn sensor_error_is_alert() {
        let r = Reading {
            sensor_error: true,
            ..base()
        };
        assert_eq!(classify(&r, ButtonEvent::Idle), ReadingStatus::Alert);
    }

    #[test]
    fn alarm_phrases_are_exact() {
        for phrase in ALARM_PHRASES {
            let r = Reading {
                message: (*phrase).to_owned(),
                ..base()
            };
            assert_eq!(classify(&r, ButtonEvent::Idle), ReadingStatus::Alert);
        }
        let r = Reading {
            message: "Help Requested".into(),
            ..base()
        };
        assert_eq!(classify(&r, ButtonEvent::Idle), ReadingStatus::Safe);
    }

    #[test]
    fn alarm_type_and_gas_are_alert() {
        let r = Reading {
            last_type: Some("alarm".into()),
            ..base()
        };
        assert_eq!(classify(&r, ButtonEvent::Idle), ReadingStatus::Alert);

        let r = Reading {
            gas_status: GasStatus::Detected,
            ..base()
        };
        assert_eq!(classify(&r, ButtonEvent::Idle), ReadingStatus::Alert);

        let r = Reading {
            gas_status: GasStatus::Other("warming".into()),
            ..base()
        };
        assert_eq!(classify(&r, ButtonEvent::Idle), ReadingStatus::Safe);
    }

    #[test]
    fn alert_outranks_smoke() {
        let r = Reading {
            smoke_detected: true,
            gas_status: GasStatus::Critical,
            ..base()
        };
        assert_eq!(classify(&r, ButtonEvent::Idle), ReadingStatus::Alert);

        let r = Reading {
            smoke_detected: true,
            ..base()
        };
        assert_eq!(classify(&r, ButtonEvent::Idle), ReadingStatus::SmokeDetected);
    }

    #[test]
    fn deterministic() {
        let r = Reading {
            smoke_detected: true,
            ..base()
        };
        let first = classify(&r, ButtonEvent::Idle);
        for _ in 0..10 {
            assert_eq!(classify(&r, ButtonEvent::Idle), first);
        }
    }
}
