//! Battery level monitoring with edge-triggered low/critical alerts
//!
//! Each threshold re-fires only after the level rose back above it, the
//! same discipline the transition detector applies to zones. A reading
//! that crosses both thresholds at once yields only the critical alert.

use crate::domain::types::{SafetyAlert, SafetyAlertKind};
use crate::io::battery::BatteryReading;
use crate::services::alert_policy::{AlertGate, AlertPolicy};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info};

pub struct BatteryMonitor {
    low_threshold: f64,
    critical_threshold: f64,
    low_gate: AlertGate,
    critical_gate: AlertGate,
    last: Option<BatteryReading>,
    supported: bool,
}

impl BatteryMonitor {
    pub fn new(low_threshold: f64, critical_threshold: f64) -> Self {
        Self {
            low_threshold,
            critical_threshold,
            low_gate: AlertGate::new(AlertPolicy::EdgeTriggered),
            critical_gate: AlertGate::new(AlertPolicy::EdgeTriggered),
            last: None,
            supported: true,
        }
    }

    /// Record that the device exposes no battery state; no alert will fire.
    pub fn mark_unsupported(&mut self) {
        self.supported = false;
        debug!("battery_monitor_unsupported");
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Most recent reading, if any arrived
    pub fn last_reading(&self) -> Option<BatteryReading> {
        self.last
    }

    /// Feed a reading; returns the alert to deliver, if any.
    pub fn record(&mut self, reading: BatteryReading) -> Option<SafetyAlert> {
        if !self.supported {
            return None;
        }
        self.last = Some(reading);

        let discharging = !reading.charging;
        let low = discharging && reading.level <= self.low_threshold;
        let critical = discharging && reading.level <= self.critical_threshold;

        let now = Instant::now();
        let fire_low = self.low_gate.observe(low, now);
        let fire_critical = self.critical_gate.observe(critical, now);

        // Critical supersedes low when one reading crosses both thresholds
        let kind = if fire_critical {
            Some(SafetyAlertKind::BatteryCritical)
        } else if fire_low {
            Some(SafetyAlertKind::BatteryLow)
        } else {
            None
        };

        kind.map(|kind| {
            info!(
                kind = kind.as_str(),
                level_pct = (reading.level * 100.0).round() as i64,
                "battery_alert"
            );
            SafetyAlert { kind, value: reading.level, timestamp: Utc::now() }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> BatteryMonitor {
        BatteryMonitor::new(0.20, 0.10)
    }

    fn discharging(level: f64) -> BatteryReading {
        BatteryReading::new(level, false)
    }

    fn charging(level: f64) -> BatteryReading {
        BatteryReading::new(level, true)
    }

    #[test]
    fn test_edge_triggered_sequence() {
        let mut m = monitor();
        let readings = [0.5, 0.19, 0.15, 0.05, 0.25, 0.05];
        let fired: Vec<Option<SafetyAlertKind>> = readings
            .iter()
            .map(|&level| m.record(discharging(level)).map(|a| a.kind))
            .collect();

        assert_eq!(
            fired,
            vec![
                None,
                Some(SafetyAlertKind::BatteryLow), // 0.19 crosses low
                None,                              // 0.15 still low, no re-fire
                Some(SafetyAlertKind::BatteryCritical), // 0.05 crosses critical
                None,                              // 0.25 re-arms both
                Some(SafetyAlertKind::BatteryCritical), // 0.05 again, re-armed
            ]
        );
    }

    #[test]
    fn test_direct_drop_to_critical_emits_only_critical() {
        let mut m = monitor();
        assert!(m.record(discharging(0.9)).is_none());
        let alert = m.record(discharging(0.05)).unwrap();
        assert_eq!(alert.kind, SafetyAlertKind::BatteryCritical);
        // No trailing low alert for the same crossing
        assert!(m.record(discharging(0.05)).is_none());
    }

    #[test]
    fn test_recovery_from_critical_to_low_stays_silent() {
        let mut m = monitor();
        m.record(discharging(0.19)); // low
        m.record(discharging(0.05)); // critical

        // Rising back into the low band re-arms critical but must not
        // re-announce low
        assert!(m.record(discharging(0.15)).is_none());

        // Dropping below critical again fires critical once more
        let alert = m.record(discharging(0.08)).unwrap();
        assert_eq!(alert.kind, SafetyAlertKind::BatteryCritical);
    }

    #[test]
    fn test_charging_suppresses_alerts() {
        let mut m = monitor();
        assert!(m.record(charging(0.05)).is_none());
        assert!(m.record(charging(0.15)).is_none());
    }

    #[test]
    fn test_unplugging_below_threshold_fires() {
        let mut m = monitor();
        m.record(charging(0.15));
        let alert = m.record(discharging(0.15)).unwrap();
        assert_eq!(alert.kind, SafetyAlertKind::BatteryLow);
    }

    #[test]
    fn test_unsupported_never_emits() {
        let mut m = monitor();
        m.mark_unsupported();
        assert!(!m.is_supported());
        assert!(m.record(discharging(0.05)).is_none());
    }

    #[test]
    fn test_last_reading_kept() {
        let mut m = monitor();
        assert!(m.last_reading().is_none());
        m.record(discharging(0.42));
        assert_eq!(m.last_reading().unwrap().level, 0.42);
    }
}
