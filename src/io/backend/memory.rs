//! In-process backend for tests and offline use

use super::{Backend, BackendError, EmergencyRow, LocationRow, NewZoneRow};
use crate::domain::types::{GeofenceZone, SessionId, ZoneId};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Stores rows in memory with uuid-v7 ids. Write failures can be injected
/// for exercising callers' error paths.
#[derive(Default)]
pub struct MemoryBackend {
    zones: Mutex<Vec<GeofenceZone>>,
    locations: Mutex<Vec<LocationRow>>,
    emergencies: Mutex<Vec<EmergencyRow>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a request error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    fn check_writable(&self) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(BackendError::Request("injected write failure".to_string()));
        }
        Ok(())
    }

    /// Number of stored location rows
    pub fn location_count(&self) -> usize {
        self.locations.lock().len()
    }

    /// Copy of the stored location rows, in insertion order
    pub fn locations(&self) -> Vec<LocationRow> {
        self.locations.lock().clone()
    }

    /// Copy of the stored emergency rows, in insertion order
    pub fn emergencies(&self) -> Vec<EmergencyRow> {
        self.emergencies.lock().clone()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_zones(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<GeofenceZone>, BackendError> {
        let zones = self.zones.lock();
        let mut result: Vec<GeofenceZone> = zones
            .iter()
            .filter(|z| &z.session_id == session_id && z.active)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn insert_zone(&self, row: NewZoneRow) -> Result<GeofenceZone, BackendError> {
        self.check_writable()?;
        let zone = GeofenceZone {
            id: ZoneId(Uuid::now_v7().to_string()),
            session_id: row.session_id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            radius: row.radius,
            kind: row.kind,
            active: row.active,
            created_at: Utc::now(),
        };
        self.zones.lock().push(zone.clone());
        Ok(zone)
    }

    async fn delete_zone(&self, zone_id: &ZoneId) -> Result<bool, BackendError> {
        self.check_writable()?;
        let mut zones = self.zones.lock();
        let before = zones.len();
        zones.retain(|z| &z.id != zone_id);
        Ok(zones.len() != before)
    }

    async fn insert_location(&self, row: LocationRow) -> Result<(), BackendError> {
        self.check_writable()?;
        self.locations.lock().push(row);
        Ok(())
    }

    async fn insert_emergency(&self, mut row: EmergencyRow) -> Result<EmergencyRow, BackendError> {
        self.check_writable()?;
        row.id = Some(Uuid::now_v7().to_string());
        self.emergencies.lock().push(row.clone());
        Ok(row)
    }

    async fn resolve_emergency(&self, alert_id: &str) -> Result<(), BackendError> {
        self.check_writable()?;
        let mut emergencies = self.emergencies.lock();
        match emergencies.iter_mut().find(|e| e.id.as_deref() == Some(alert_id)) {
            Some(row) => {
                row.resolved = true;
                Ok(())
            }
            None => Err(BackendError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Position, ZoneKind};

    fn new_zone_row(session: &str, name: &str) -> NewZoneRow {
        NewZoneRow {
            session_id: SessionId::from(session),
            name: name.to_string(),
            latitude: -23.55,
            longitude: -46.63,
            radius: 100.0,
            kind: ZoneKind::Safe,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let backend = MemoryBackend::new();
        let zone = backend.insert_zone(new_zone_row("s1", "Casa")).await.unwrap();
        assert!(!zone.id.0.is_empty());
        assert_eq!(zone.name, "Casa");
    }

    #[tokio::test]
    async fn test_list_zones_is_session_scoped_and_newest_first() {
        let backend = MemoryBackend::new();
        backend.insert_zone(new_zone_row("s1", "Casa")).await.unwrap();
        backend.insert_zone(new_zone_row("s2", "Outra")).await.unwrap();
        let newest = backend.insert_zone(new_zone_row("s1", "Escola")).await.unwrap();

        let zones = backend.list_zones(&SessionId::from("s1")).await.unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].id, newest.id);
    }

    #[tokio::test]
    async fn test_list_zones_skips_inactive() {
        let backend = MemoryBackend::new();
        let mut row = new_zone_row("s1", "Antiga");
        row.active = false;
        backend.insert_zone(row).await.unwrap();

        let zones = backend.list_zones(&SessionId::from("s1")).await.unwrap();
        assert!(zones.is_empty());
    }

    #[tokio::test]
    async fn test_delete_zone_reports_missing_row() {
        let backend = MemoryBackend::new();
        let zone = backend.insert_zone(new_zone_row("s1", "Casa")).await.unwrap();

        assert!(backend.delete_zone(&zone.id).await.unwrap());
        assert!(!backend.delete_zone(&zone.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true);
        let result = backend.insert_zone(new_zone_row("s1", "Casa")).await;
        assert!(matches!(result, Err(BackendError::Request(_))));
    }

    #[tokio::test]
    async fn test_emergency_insert_and_resolve() {
        let backend = MemoryBackend::new();
        let position = Position::new(-23.55, -46.63);
        let row = EmergencyRow {
            id: None,
            session_id: SessionId::from("s1"),
            latitude: position.latitude,
            longitude: position.longitude,
            accuracy: None,
            message: "panic button".to_string(),
            resolved: false,
            created_at: position.timestamp,
        };

        let stored = backend.insert_emergency(row).await.unwrap();
        let id = stored.id.clone().unwrap();
        backend.resolve_emergency(&id).await.unwrap();
        assert!(backend.emergencies()[0].resolved);

        let missing = backend.resolve_emergency("nope").await;
        assert!(matches!(missing, Err(BackendError::NotFound)));
    }
}
