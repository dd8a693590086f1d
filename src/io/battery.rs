//! Optional device battery capability
//!
//! Battery state is a feature the device may simply not have. Probing
//! returns a typed capability so callers branch on a value, not on the
//! presence of a global.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// A battery state snapshot from the device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    /// Charge level, 0..1
    pub level: f64,
    pub charging: bool,
    /// Seconds until full, if charging and reported
    pub charging_time_s: Option<f64>,
    /// Seconds until empty, if discharging and reported
    pub discharging_time_s: Option<f64>,
}

impl BatteryReading {
    pub fn new(level: f64, charging: bool) -> Self {
        Self { level, charging, charging_time_s: None, discharging_time_s: None }
    }
}

/// Result of probing the device for battery support
pub enum BatteryCapability {
    /// Battery state is available; readings arrive on the channel
    Supported(mpsc::Receiver<BatteryReading>),
    /// The device exposes no battery state; no battery alert will ever fire
    Unsupported,
}

impl BatteryCapability {
    pub fn is_supported(&self) -> bool {
        matches!(self, BatteryCapability::Supported(_))
    }
}

/// Device battery boundary
#[async_trait]
pub trait BatterySource: Send + Sync + 'static {
    /// Probe the device and subscribe to level/charging changes.
    async fn subscribe(&self) -> BatteryCapability;
}
