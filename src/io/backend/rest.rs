//! Row-oriented REST backend (PostgREST-style hosted service)
//!
//! Conventions:
//! - Rows live under `{base_url}/rest/v1/{table}`
//! - Filters are query parameters (`id=eq.<value>`, `active=is.true`)
//! - `Prefer: return=representation` makes writes echo the stored rows

use super::{Backend, BackendError, EmergencyRow, LocationRow, NewZoneRow};
use crate::domain::types::{GeofenceZone, SessionId, ZoneId};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::debug;

const ZONES_TABLE: &str = "geofence_zones";
const LOCATIONS_TABLE: &str = "locations";
const EMERGENCY_TABLE: &str = "emergency_alerts";

#[derive(Debug, Clone)]
pub struct RestBackendConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for RestBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&crate::infra::config::BackendConfig> for RestBackendConfig {
    fn from(config: &crate::infra::config::BackendConfig) -> Self {
        Self {
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
        }
    }
}

pub struct RestBackend {
    config: RestBackendConfig,
    client: reqwest::Client,
}

impl RestBackend {
    pub fn new(config: RestBackendConfig) -> Self {
        // Client construction is infallible with these options; fall back to
        // the default client if the builder ever rejects them
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url.trim_end_matches('/'), table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    async fn send(request: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status: status.as_u16(), body });
        }
        Ok(response)
    }

    async fn decode_rows<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, BackendError> {
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn list_zones(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<GeofenceZone>, BackendError> {
        let request = self.request(Method::GET, ZONES_TABLE).query(&[
            ("select", "*".to_string()),
            ("session_id", format!("eq.{session_id}")),
            ("active", "is.true".to_string()),
            ("order", "created_at.desc".to_string()),
        ]);

        let zones: Vec<GeofenceZone> = Self::decode_rows(Self::send(request).await?).await?;
        debug!(session_id = %session_id, count = zones.len(), "zones_listed");
        Ok(zones)
    }

    async fn insert_zone(&self, row: NewZoneRow) -> Result<GeofenceZone, BackendError> {
        let request = self
            .request(Method::POST, ZONES_TABLE)
            .header("Prefer", "return=representation")
            .json(&[row]);

        let mut rows: Vec<GeofenceZone> = Self::decode_rows(Self::send(request).await?).await?;
        rows.pop()
            .ok_or_else(|| BackendError::Decode("insert returned no row".to_string()))
    }

    async fn delete_zone(&self, zone_id: &ZoneId) -> Result<bool, BackendError> {
        let request = self
            .request(Method::DELETE, ZONES_TABLE)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{zone_id}"))]);

        let deleted: Vec<serde_json::Value> =
            Self::decode_rows(Self::send(request).await?).await?;
        Ok(!deleted.is_empty())
    }

    async fn insert_location(&self, row: LocationRow) -> Result<(), BackendError> {
        let request = self
            .request(Method::POST, LOCATIONS_TABLE)
            .header("Prefer", "return=minimal")
            .json(&[row]);

        Self::send(request).await?;
        Ok(())
    }

    async fn insert_emergency(&self, row: EmergencyRow) -> Result<EmergencyRow, BackendError> {
        let request = self
            .request(Method::POST, EMERGENCY_TABLE)
            .header("Prefer", "return=representation")
            .json(&[row]);

        let mut rows: Vec<EmergencyRow> = Self::decode_rows(Self::send(request).await?).await?;
        rows.pop()
            .ok_or_else(|| BackendError::Decode("insert returned no row".to_string()))
    }

    async fn resolve_emergency(&self, alert_id: &str) -> Result<(), BackendError> {
        let request = self
            .request(Method::PATCH, EMERGENCY_TABLE)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{alert_id}"))])
            .json(&serde_json::json!({ "resolved": true }));

        let response = Self::send(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(BackendError::NotFound);
        }
        let rows: Vec<serde_json::Value> = Self::decode_rows(response).await?;
        if rows.is_empty() {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }
}
