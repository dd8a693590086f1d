//! Session-scoped geofence zone management with a cached local view
//!
//! The store is the sole owner and mutator of a session's zone set. Reads
//! hit an in-memory cache primed from the backend; writes go to the
//! backend first and only touch the cache on success, so after a failure
//! the cache still holds the last known-good state. Handles are cheap to
//! clone and share between the UI and the monitor loop.

use crate::domain::types::{GeofenceZone, SessionId, ZoneId, ZoneKind};
use crate::infra::config::GeofenceConfig;
use crate::io::backend::{Backend, BackendError, NewZoneRow};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Caller-facing zone specification. The center is explicit (callers pass
/// their current position), which keeps the store decoupled from any live
/// position feed.
#[derive(Debug, Clone)]
pub struct ZoneSpec {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters
    pub radius: f64,
    pub kind: ZoneKind,
}

/// Zone store failures, reported distinctly from sensor failures so the
/// UI can give actionable guidance.
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    /// The zone name is empty or whitespace
    #[error("zone name must not be empty")]
    EmptyName,

    /// The radius falls outside the configured bounds
    #[error("zone radius {radius} m outside allowed range {min} m ..= {max} m")]
    RadiusOutOfRange { radius: f64, min: f64, max: f64 },

    /// No zone with this id is known locally
    #[error("zone not found: {0}")]
    NotFound(ZoneId),

    /// The backend read/write failed; the local cache is unchanged
    #[error(transparent)]
    Persistence(#[from] BackendError),
}

pub struct ZoneStore<B: Backend> {
    backend: Arc<B>,
    session_id: SessionId,
    min_radius: f64,
    max_radius: f64,
    cache: Arc<Mutex<Option<Vec<GeofenceZone>>>>,
}

impl<B: Backend> Clone for ZoneStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            session_id: self.session_id.clone(),
            min_radius: self.min_radius,
            max_radius: self.max_radius,
            cache: self.cache.clone(),
        }
    }
}

impl<B: Backend> ZoneStore<B> {
    pub fn new(backend: Arc<B>, session_id: SessionId, config: &GeofenceConfig) -> Self {
        Self {
            backend,
            session_id,
            min_radius: config.min_radius_m,
            max_radius: config.max_radius_m,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Zones for the session, newest first. Fetched from the backend once
    /// and served from the cache until invalidated.
    pub async fn list(&self) -> Result<Vec<GeofenceZone>, ZoneError> {
        if let Some(zones) = self.cache.lock().as_ref().cloned() {
            return Ok(zones);
        }
        self.reload().await
    }

    /// Refetch from the backend, replacing the cache.
    pub async fn reload(&self) -> Result<Vec<GeofenceZone>, ZoneError> {
        let zones = self.backend.list_zones(&self.session_id).await?;
        *self.cache.lock() = Some(zones.clone());
        Ok(zones)
    }

    /// Drop the cached view; the next `list` hits the backend.
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }

    /// Explicit copy of the cached zones for iteration. Empty until the
    /// first successful `list`/`reload`.
    pub fn snapshot(&self) -> Vec<GeofenceZone> {
        self.cache.lock().as_ref().cloned().unwrap_or_default()
    }

    /// Create a zone centered at the caller-supplied coordinates. The new
    /// zone is visible to subsequent `list` calls immediately.
    pub async fn create(&self, spec: ZoneSpec) -> Result<GeofenceZone, ZoneError> {
        if spec.name.trim().is_empty() {
            return Err(ZoneError::EmptyName);
        }
        if !(self.min_radius..=self.max_radius).contains(&spec.radius) {
            return Err(ZoneError::RadiusOutOfRange {
                radius: spec.radius,
                min: self.min_radius,
                max: self.max_radius,
            });
        }

        let row = NewZoneRow {
            session_id: self.session_id.clone(),
            name: spec.name,
            latitude: spec.latitude,
            longitude: spec.longitude,
            radius: spec.radius,
            kind: spec.kind,
            active: true,
        };
        let zone = self.backend.insert_zone(row).await?;

        // Read-your-writes: prepend without waiting for a backend round
        // trip. An unprimed cache stays unprimed; the next list() fetches
        // everything, new zone included
        if let Some(zones) = self.cache.lock().as_mut() {
            zones.insert(0, zone.clone());
        }

        info!(
            zone_id = %zone.id,
            name = %zone.name,
            radius_m = zone.radius,
            kind = zone.kind.as_str(),
            "zone_created"
        );
        Ok(zone)
    }

    /// Delete a zone by id. Unknown ids fail with NotFound; a row already
    /// gone on the backend only logs a warning.
    pub async fn delete(&self, zone_id: &ZoneId) -> Result<(), ZoneError> {
        // Prime the cache so "unknown locally" is meaningful on a fresh store
        let known = self.list().await?;
        if !known.iter().any(|z| &z.id == zone_id) {
            return Err(ZoneError::NotFound(zone_id.clone()));
        }

        let existed = self.backend.delete_zone(zone_id).await?;
        if !existed {
            warn!(zone_id = %zone_id, "zone_already_deleted_on_backend");
        }

        if let Some(zones) = self.cache.lock().as_mut() {
            zones.retain(|z| &z.id != zone_id);
        }
        info!(zone_id = %zone_id, "zone_deleted");
        Ok(())
    }
}
