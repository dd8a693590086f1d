//! Emergency alert dispatch (panic button)
//!
//! One-shot flow: grab a fresh high-accuracy fix, persist the alert row,
//! hand it back for the UI. A send already in flight rejects further
//! presses instead of stacking requests.

use crate::domain::types::SessionId;
use crate::io::backend::{Backend, BackendError, EmergencyRow};
use crate::io::geolocation::{GeoOptions, LocationSource, PositionError, PositionFeed};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_MESSAGE: &str = "emergency alert activated";

#[derive(Debug, thiserror::Error)]
pub enum EmergencyError {
    /// A previous press is still being processed
    #[error("an emergency alert is already being sent")]
    AlreadySending,

    /// The device could not produce a fix
    #[error(transparent)]
    Sensor(#[from] PositionError),

    /// The backend rejected or never received the row
    #[error(transparent)]
    Persistence(#[from] BackendError),
}

pub struct EmergencyAlerter<B: Backend, S: LocationSource> {
    backend: Arc<B>,
    feed: PositionFeed<S>,
    session_id: SessionId,
    sending: AtomicBool,
}

impl<B: Backend, S: LocationSource> EmergencyAlerter<B, S> {
    pub fn new(backend: Arc<B>, feed: PositionFeed<S>, session_id: SessionId) -> Self {
        Self { backend, feed, session_id, sending: AtomicBool::new(false) }
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    /// Send an alert with a fresh high-accuracy fix (cached positions are
    /// rejected outright).
    pub async fn send(&self, message: Option<&str>) -> Result<EmergencyRow, EmergencyError> {
        if self.sending.swap(true, Ordering::SeqCst) {
            warn!("emergency_send_already_in_flight");
            return Err(EmergencyError::AlreadySending);
        }
        let result = self.send_inner(message).await;
        self.sending.store(false, Ordering::SeqCst);
        result
    }

    async fn send_inner(&self, message: Option<&str>) -> Result<EmergencyRow, EmergencyError> {
        let options = GeoOptions {
            high_accuracy: true,
            max_age: Duration::ZERO,
            ..self.feed.options().clone()
        };
        let position = self.feed.current_with(&options).await?;

        let row = EmergencyRow {
            id: None,
            session_id: self.session_id.clone(),
            latitude: position.latitude,
            longitude: position.longitude,
            accuracy: position.accuracy,
            message: message.unwrap_or(DEFAULT_MESSAGE).to_string(),
            resolved: false,
            created_at: position.timestamp,
        };
        let stored = self.backend.insert_emergency(row).await?;

        info!(
            alert_id = stored.id.as_deref().unwrap_or("-"),
            session_id = %self.session_id,
            "emergency_alert_sent"
        );
        Ok(stored)
    }

    /// Mark a previously sent alert as handled.
    pub async fn resolve(&self, alert_id: &str) -> Result<(), EmergencyError> {
        self.backend.resolve_emergency(alert_id).await?;
        info!(alert_id = %alert_id, "emergency_alert_resolved");
        Ok(())
    }
}
