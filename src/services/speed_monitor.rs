//! Speed monitoring with a bounded rolling window and rate-limited alerts
//!
//! High-speed alerts are deliberate periodic reminders during a sustained
//! episode, unlike the edge-only discipline used for zones and battery:
//! at most one alert per configured interval while the threshold is
//! exceeded.

use crate::domain::types::{SafetyAlert, SafetyAlertKind};
use crate::services::alert_policy::{AlertGate, AlertPolicy};
use chrono::Utc;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Samples kept for max/average statistics
const SPEED_WINDOW: usize = 10;

const MS_TO_KMH: f64 = 3.6;

/// Below this the point is considered stationary
const MOVING_THRESHOLD_KMH: f64 = 1.0;

/// Rolling view of recent speed, for the tracking UI
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedStats {
    pub current_kmh: f64,
    pub max_kmh: f64,
    pub average_kmh: f64,
    pub moving: bool,
    pub high_speed: bool,
}

pub struct SpeedMonitor {
    threshold_kmh: f64,
    gate: AlertGate,
    window: VecDeque<f64>,
    stats: SpeedStats,
}

impl SpeedMonitor {
    pub fn new(threshold_kmh: f64, min_alert_interval: Duration) -> Self {
        Self {
            threshold_kmh,
            gate: AlertGate::new(AlertPolicy::Periodic { min_interval: min_alert_interval }),
            window: VecDeque::with_capacity(SPEED_WINDOW),
            stats: SpeedStats::default(),
        }
    }

    /// Feed the instantaneous speed of a new reading (m/s as reported by
    /// the device, None when it didn't report one). Returns the alert to
    /// deliver, if any.
    pub fn record(&mut self, speed_ms: Option<f64>, at: Instant) -> Option<SafetyAlert> {
        let Some(speed_ms) = speed_ms.filter(|s| *s >= 0.0) else {
            // No usable sample: treat as stationary, keep the history
            self.stats.current_kmh = 0.0;
            self.stats.moving = false;
            self.stats.high_speed = false;
            return None;
        };

        let kmh = speed_ms * MS_TO_KMH;
        if self.window.len() == SPEED_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(kmh);

        let max_kmh = self.window.iter().copied().fold(0.0_f64, f64::max);
        let average_kmh = self.window.iter().sum::<f64>() / self.window.len() as f64;
        self.stats = SpeedStats {
            current_kmh: kmh,
            max_kmh,
            average_kmh,
            moving: kmh > MOVING_THRESHOLD_KMH,
            high_speed: kmh > self.threshold_kmh,
        };
        debug!(speed_kmh = kmh as i64, "speed_sample");

        if self.gate.observe(self.stats.high_speed, at) {
            info!(speed_kmh = kmh as i64, threshold_kmh = self.threshold_kmh as i64, "high_speed_alert");
            Some(SafetyAlert { kind: SafetyAlertKind::HighSpeed, value: kmh, timestamp: Utc::now() })
        } else {
            None
        }
    }

    pub fn stats(&self) -> SpeedStats {
        self.stats
    }

    /// Clear window and statistics (e.g. when monitoring stops)
    pub fn reset(&mut self) {
        self.window.clear();
        self.stats = SpeedStats::default();
    }
}
