//! Alert delivery to the UI notification callback
//!
//! Delivery only: the detector and monitors already guarantee at most one
//! event per actual state change, so no further suppression happens here.
//! Callback panics are contained so one bad handler cannot stop the
//! position-processing loop. A bounded rolling history of formatted alert
//! lines is kept for presentation, not for de-duplication.

use crate::domain::types::{SafetyAlert, SafetyAlertKind, TransitionEvent};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

/// Default bound for the rolling alert history
const DEFAULT_HISTORY_LIMIT: usize = 20;

/// An alert on its way to the notification surface
#[derive(Debug, Clone)]
pub enum AlertEvent {
    Zone(TransitionEvent),
    Safety(SafetyAlert),
}

impl std::fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertEvent::Zone(t) => {
                write!(f, "{} zone '{}' {}", t.zone.kind.as_str(), t.zone.name, t.kind.as_str())
            }
            AlertEvent::Safety(a) => match a.kind {
                SafetyAlertKind::BatteryLow | SafetyAlertKind::BatteryCritical => {
                    write!(f, "{}: {:.0}%", a.kind.as_str(), a.value * 100.0)
                }
                SafetyAlertKind::HighSpeed => {
                    write!(f, "{}: {:.1} km/h", a.kind.as_str(), a.value)
                }
            },
        }
    }
}

pub type AlertCallback = Box<dyn Fn(&AlertEvent) + Send + Sync>;

/// Shared, bounded view of recently delivered alerts, newest first
#[derive(Clone)]
pub struct AlertLog {
    inner: Arc<Mutex<VecDeque<String>>>,
    limit: usize,
}

impl AlertLog {
    fn new(limit: usize) -> Self {
        Self { inner: Arc::new(Mutex::new(VecDeque::with_capacity(limit))), limit }
    }

    fn push(&self, line: String) {
        let mut lines = self.inner.lock();
        lines.push_front(line);
        lines.truncate(self.limit);
    }

    /// Recent alert lines, newest first
    pub fn recent(&self) -> Vec<String> {
        self.inner.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Delivers alerts to a single registered callback (or none)
pub struct AlertEmitter {
    callback: Option<AlertCallback>,
    log: AlertLog,
}

impl AlertEmitter {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(limit: usize) -> Self {
        Self { callback: None, log: AlertLog::new(limit) }
    }

    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: Fn(&AlertEvent) + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Shared handle to the rolling history
    pub fn log(&self) -> AlertLog {
        self.log.clone()
    }

    /// Deliver an alert. Never fails: a panicking callback is logged and
    /// must not abort the processing of a position-stream tick.
    pub fn emit(&self, event: AlertEvent) {
        let line = event.to_string();
        info!(alert = %line, "alert_emitted");
        self.log.push(line);

        if let Some(ref callback) = self.callback {
            if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                error!("alert_callback_panicked");
            }
        }
    }
}

impl Default for AlertEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Position;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn speed_alert(kmh: f64) -> AlertEvent {
        AlertEvent::Safety(SafetyAlert {
            kind: SafetyAlertKind::HighSpeed,
            value: kmh,
            timestamp: Utc::now(),
        })
    }

    fn battery_alert(level: f64) -> AlertEvent {
        AlertEvent::Safety(SafetyAlert {
            kind: SafetyAlertKind::BatteryLow,
            value: level,
            timestamp: Utc::now(),
        })
    }

    #[test]
    fn test_emit_delivers_to_callback() {
        let mut emitter = AlertEmitter::new();
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = delivered.clone();
        emitter.set_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(speed_alert(72.5));
        emitter.emit(battery_alert(0.15));

        assert_eq!(delivered.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_emit_without_callback_is_fine() {
        let emitter = AlertEmitter::new();
        emitter.emit(speed_alert(80.0));
        assert_eq!(emitter.log().len(), 1);
    }

    #[test]
    fn test_callback_panic_is_contained() {
        let mut emitter = AlertEmitter::new();
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = delivered.clone();
        emitter.set_callback(move |event| {
            if let AlertEvent::Safety(a) = event {
                if a.value > 100.0 {
                    panic!("bad handler");
                }
            }
            counter.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(speed_alert(120.0)); // panics inside the callback
        emitter.emit(speed_alert(65.0)); // still delivered

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.log().len(), 2);
    }

    #[test]
    fn test_clear_callback_stops_delivery() {
        let mut emitter = AlertEmitter::new();
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = delivered.clone();
        emitter.set_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(speed_alert(70.0));
        emitter.clear_callback();
        emitter.emit(speed_alert(71.0)); // history only

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.log().len(), 2);
    }

    #[test]
    fn test_history_is_bounded_and_newest_first() {
        let emitter = AlertEmitter::with_history_limit(3);
        for kmh in [61.0, 62.0, 63.0, 64.0] {
            emitter.emit(speed_alert(kmh));
        }

        let recent = emitter.log().recent();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].contains("64.0"));
        assert!(recent[2].contains("62.0"));
    }

    #[test]
    fn test_display_formats() {
        use crate::domain::types::{GeofenceZone, SessionId, TransitionKind, ZoneId, ZoneKind};

        let zone = GeofenceZone {
            id: ZoneId::from("z1"),
            session_id: SessionId::from("s1"),
            name: "Casa".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            radius: 100.0,
            kind: ZoneKind::Safe,
            active: true,
            created_at: Utc::now(),
        };
        let event = AlertEvent::Zone(TransitionEvent {
            zone,
            kind: TransitionKind::Entered,
            position: Position::new(0.0, 0.0),
            timestamp: Utc::now(),
        });
        assert_eq!(event.to_string(), "safe zone 'Casa' entered");

        assert_eq!(battery_alert(0.15).to_string(), "battery_low: 15%");
        assert_eq!(speed_alert(72.49).to_string(), "high_speed: 72.5 km/h");
    }
}
