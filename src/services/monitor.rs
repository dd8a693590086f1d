//! Session monitoring - the per-session tracking event loop
//!
//! Wires the position feed, zone store, transition detector, safety
//! monitors and alert emitter for one tracked session. Everything runs on
//! one logical task: readings are processed strictly in arrival order and
//! the zone snapshot is copied before iteration, so detector state never
//! races zone mutations from the UI side.

use crate::domain::types::{Position, SessionId};
use crate::infra::config::Config;
use crate::io::backend::{Backend, LocationRow};
use crate::io::battery::{BatteryCapability, BatteryReading};
use crate::io::geolocation::WatchHandle;
use crate::services::alert_emitter::{AlertEmitter, AlertEvent, AlertLog};
use crate::services::battery_monitor::BatteryMonitor;
use crate::services::speed_monitor::{SpeedMonitor, SpeedStats};
use crate::services::transition_detector::TransitionDetector;
use crate::services::zone_store::ZoneStore;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Per-session orchestrator for position processing and alerting
pub struct SessionMonitor<B: Backend> {
    session_id: SessionId,
    backend: Arc<B>,
    zones: ZoneStore<B>,
    detector: TransitionDetector,
    emitter: AlertEmitter,
    battery: BatteryMonitor,
    speed: SpeedMonitor,
}

impl<B: Backend> SessionMonitor<B> {
    pub fn new(session_id: SessionId, backend: Arc<B>, config: &Config) -> Self {
        let zones = ZoneStore::new(backend.clone(), session_id.clone(), &config.geofence);
        Self {
            session_id,
            backend,
            zones,
            detector: TransitionDetector::new(),
            emitter: AlertEmitter::with_history_limit(config.alerts.history_limit),
            battery: BatteryMonitor::new(
                config.battery.low_threshold,
                config.battery.critical_threshold,
            ),
            speed: SpeedMonitor::new(config.speed.threshold_kmh, config.speed.alert_interval()),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Zone handle for the UI; create/delete/list share this monitor's cache
    pub fn zones(&self) -> ZoneStore<B> {
        self.zones.clone()
    }

    /// Shared view of recently delivered alerts
    pub fn alert_log(&self) -> AlertLog {
        self.emitter.log()
    }

    pub fn set_alert_callback<F>(&mut self, callback: F)
    where
        F: Fn(&AlertEvent) + Send + Sync + 'static,
    {
        self.emitter.set_callback(callback);
    }

    pub fn speed_stats(&self) -> SpeedStats {
        self.speed.stats()
    }

    pub fn battery_supported(&self) -> bool {
        self.battery.is_supported()
    }

    /// Run until the position watch ends or shutdown flips. Consumes the
    /// watch and, when the device supports it, the battery stream.
    pub async fn run(
        &mut self,
        mut positions: WatchHandle,
        battery: BatteryCapability,
        mut shutdown: watch::Receiver<bool>,
    ) {
        // Prime the zone cache; an unreachable backend only delays zones
        if let Err(e) = self.zones.reload().await {
            warn!(error = %e, "zone_preload_failed");
        }

        let mut battery_rx = match battery {
            BatteryCapability::Supported(rx) => Some(rx),
            BatteryCapability::Unsupported => {
                self.battery.mark_unsupported();
                None
            }
        };

        info!(
            session_id = %self.session_id,
            battery_supported = battery_rx.is_some(),
            "session_monitor_started"
        );

        loop {
            tokio::select! {
                item = positions.next() => match item {
                    Some(Ok(position)) => self.process_position(position).await,
                    Some(Err(e)) => warn!(error = %e, "position_feed_error"),
                    None => break, // watch stopped or source hung up
                },
                reading = recv_battery(&mut battery_rx) => match reading {
                    Some(reading) => self.process_battery(reading),
                    None => battery_rx = None, // battery stream ended
                },
                _ = shutdown.changed() => break,
            }
        }

        positions.stop();
        info!(session_id = %self.session_id, "session_monitor_stopped");
    }

    /// Handle one position reading: persist it, detect zone transitions,
    /// update the speed window.
    pub async fn process_position(&mut self, position: Position) {
        let row = LocationRow::from_position(self.session_id.clone(), &position);
        if let Err(e) = self.backend.insert_location(row).await {
            // A failed append must not stall detection
            warn!(error = %e, "location_persist_failed");
        }

        let zones = self.zones.snapshot();
        for event in self.detector.process(&self.session_id, &position, &zones) {
            self.emitter.emit(AlertEvent::Zone(event));
        }

        if let Some(alert) = self.speed.record(position.speed, Instant::now()) {
            self.emitter.emit(AlertEvent::Safety(alert));
        }
    }

    /// Handle one battery reading
    pub fn process_battery(&mut self, reading: BatteryReading) {
        if let Some(alert) = self.battery.record(reading) {
            self.emitter.emit(AlertEvent::Safety(alert));
        }
    }
}

async fn recv_battery(
    rx: &mut Option<mpsc::Receiver<BatteryReading>>,
) -> Option<BatteryReading> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
