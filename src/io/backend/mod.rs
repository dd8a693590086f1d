//! Persistence backend boundary
//!
//! The hosted backend owns rows for zones, locations and emergency alerts,
//! all scoped by tracked-session id. Session/invite lifecycle and
//! authentication live entirely on that side; this crate only reads and
//! writes the row shapes below.

mod memory;
mod rest;

pub use memory::MemoryBackend;
pub use rest::{RestBackend, RestBackendConfig};

use crate::domain::types::{GeofenceZone, Position, SessionId, ZoneId, ZoneKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Zone row to insert; id and created_at are assigned by the backend.
#[derive(Debug, Clone, Serialize)]
pub struct NewZoneRow {
    pub session_id: SessionId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    #[serde(rename = "type")]
    pub kind: ZoneKind,
    pub active: bool,
}

/// Append-only location row, one per position reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRow {
    pub session_id: SessionId,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LocationRow {
    pub fn from_position(session_id: SessionId, position: &Position) -> Self {
        Self {
            session_id,
            latitude: position.latitude,
            longitude: position.longitude,
            accuracy: position.accuracy,
            altitude: position.altitude,
            heading: position.heading,
            speed: position.speed,
            address: Some(format!(
                "GPS: {:.6}, {:.6}",
                position.latitude, position.longitude
            )),
            created_at: position.timestamp,
        }
    }
}

/// Emergency alert row (panic button)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub session_id: SessionId,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub message: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

/// All errors a backend implementation can return.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request never completed (connect failure, timeout, DNS).
    #[error("backend request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded into the expected row shape.
    #[error("failed to decode backend response: {0}")]
    Decode(String),

    /// No row matched the given id.
    #[error("row not found")]
    NotFound,
}

/// Row-store operations the core depends on.
///
/// Every method is a suspension point; implementations must not retry
/// internally beyond what their transport already does.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Active zones for a session, newest first.
    async fn list_zones(&self, session_id: &SessionId)
        -> Result<Vec<GeofenceZone>, BackendError>;

    /// Insert a zone row. Returns the stored row with server-assigned id
    /// and creation timestamp.
    async fn insert_zone(&self, row: NewZoneRow) -> Result<GeofenceZone, BackendError>;

    /// Delete a zone row by id. Returns false when no row matched (already
    /// deleted), which callers may treat as success.
    async fn delete_zone(&self, zone_id: &ZoneId) -> Result<bool, BackendError>;

    /// Append a location row.
    async fn insert_location(&self, row: LocationRow) -> Result<(), BackendError>;

    /// Insert an emergency alert row. Returns it with the assigned id.
    async fn insert_emergency(&self, row: EmergencyRow) -> Result<EmergencyRow, BackendError>;

    /// Mark an emergency alert resolved.
    async fn resolve_emergency(&self, alert_id: &str) -> Result<(), BackendError>;
}
