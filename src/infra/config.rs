//! Configuration loading from TOML files
//!
//! Every section has serde defaults, so a missing file section (or a
//! missing file handed to the host application) falls back to the
//! documented behavior. The host passes the parsed `Config` down when it
//! constructs monitors and stores.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct GeofenceConfig {
    /// Minimum allowed zone radius in meters
    #[serde(default = "default_min_radius_m")]
    pub min_radius_m: f64,
    /// Maximum allowed zone radius in meters
    #[serde(default = "default_max_radius_m")]
    pub max_radius_m: f64,
}

fn default_min_radius_m() -> f64 {
    10.0
}

fn default_max_radius_m() -> f64 {
    1000.0
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self { min_radius_m: default_min_radius_m(), max_radius_m: default_max_radius_m() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatteryConfig {
    /// Low-battery threshold as a fraction of full charge
    #[serde(default = "default_battery_low")]
    pub low_threshold: f64,
    /// Critical-battery threshold as a fraction of full charge
    #[serde(default = "default_battery_critical")]
    pub critical_threshold: f64,
}

fn default_battery_low() -> f64 {
    0.20
}

fn default_battery_critical() -> f64 {
    0.10
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            low_threshold: default_battery_low(),
            critical_threshold: default_battery_critical(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeedConfig {
    /// High-speed alert threshold in km/h
    #[serde(default = "default_speed_threshold_kmh")]
    pub threshold_kmh: f64,
    /// Minimum seconds between two high-speed alerts
    #[serde(default = "default_speed_alert_interval_secs")]
    pub alert_interval_secs: u64,
}

fn default_speed_threshold_kmh() -> f64 {
    60.0
}

fn default_speed_alert_interval_secs() -> u64 {
    60
}

impl SpeedConfig {
    pub fn alert_interval(&self) -> Duration {
        Duration::from_secs(self.alert_interval_secs)
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            threshold_kmh: default_speed_threshold_kmh(),
            alert_interval_secs: default_speed_alert_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    /// Trade battery for precision
    #[serde(default = "default_high_accuracy")]
    pub high_accuracy: bool,
    /// Abort threshold for a single fix
    #[serde(default = "default_sensor_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum acceptable age of a cached fix
    #[serde(default = "default_max_position_age_ms")]
    pub max_position_age_ms: u64,
}

fn default_high_accuracy() -> bool {
    true
}

fn default_sensor_timeout_ms() -> u64 {
    10_000
}

fn default_max_position_age_ms() -> u64 {
    5_000
}

impl SensorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn max_position_age(&self) -> Duration {
        Duration::from_millis(self.max_position_age_ms)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            high_accuracy: default_high_accuracy(),
            timeout_ms: default_sensor_timeout_ms(),
            max_position_age_ms: default_max_position_age_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted row store
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// API key sent with every request
    #[serde(default)]
    pub api_key: String,
    /// Per-request timeout
    #[serde(default = "default_backend_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_backend_timeout_ms() -> u64 {
    10_000
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            api_key: String::new(),
            timeout_ms: default_backend_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Rolling alert history kept for UI presentation
    #[serde(default = "default_alert_history_limit")]
    pub history_limit: usize,
}

fn default_alert_history_limit() -> usize {
    20
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { history_limit: default_alert_history_limit() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub geofence: GeofenceConfig,
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub speed: SpeedConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.geofence.min_radius_m, 10.0);
        assert_eq!(config.geofence.max_radius_m, 1000.0);
        assert_eq!(config.battery.low_threshold, 0.20);
        assert_eq!(config.battery.critical_threshold, 0.10);
        assert_eq!(config.speed.threshold_kmh, 60.0);
        assert_eq!(config.speed.alert_interval(), Duration::from_secs(60));
        assert!(config.sensor.high_accuracy);
        assert_eq!(config.sensor.timeout(), Duration::from_secs(10));
        assert_eq!(config.sensor.max_position_age(), Duration::from_secs(5));
        assert_eq!(config.alerts.history_limit, 20);
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let config: Config = toml::from_str(
            r#"
            [speed]
            threshold_kmh = 80.0

            [backend]
            url = "https://example.supabase.co"
            api_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.speed.threshold_kmh, 80.0);
        assert_eq!(config.speed.alert_interval_secs, 60); // default kept
        assert_eq!(config.backend.url, "https://example.supabase.co");
        assert_eq!(config.geofence.max_radius_m, 1000.0);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.battery.low_threshold, 0.20);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[geofence]\nmin_radius_m = 25.0\n\n[sensor]\ntimeout_ms = 8000"
        )
        .unwrap();

        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.geofence.min_radius_m, 25.0);
        assert_eq!(config.sensor.timeout(), Duration::from_secs(8));
    }

    #[test]
    fn test_load_missing_file_fails_with_context() {
        let result = Config::load_from_path("/nonexistent/geoguard.toml");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("geoguard.toml"));
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[").unwrap();
        assert!(Config::load_from_path(file.path()).is_err());
    }
}
