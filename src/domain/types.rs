//! Shared types for location tracking and geofencing

use crate::domain::geo::haversine_distance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Newtype wrapper for tracked-session IDs to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Newtype wrapper for geofence zone IDs to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ZoneId(pub String);

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single device location reading. Immutable once created; passed by value
/// between the feed, the detector and the safety monitors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees, -90..90
    pub latitude: f64,
    /// Longitude in degrees, -180..180
    pub longitude: f64,
    /// Horizontal accuracy in meters, if the device reports it
    pub accuracy: Option<f64>,
    /// Altitude in meters, if reported
    pub altitude: Option<f64>,
    /// Heading in degrees from true north, if reported
    pub heading: Option<f64>,
    /// Ground speed in m/s, if reported
    pub speed: Option<f64>,
    /// Capture time
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            altitude: None,
            heading: None,
            speed: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_speed(mut self, speed_ms: f64) -> Self {
        self.speed = Some(speed_ms);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Great-circle distance to another reading, in meters
    pub fn distance_to(&self, other: &Position) -> f64 {
        haversine_distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Zone classification: a place the tracked person should be, or should not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Safe,
    Restricted,
}

impl ZoneKind {
    pub fn as_str(&self) -> &str {
        match self {
            ZoneKind::Safe => "safe",
            ZoneKind::Restricted => "restricted",
        }
    }
}

/// A named circular region monitored for entry/exit of the tracked point.
///
/// Serializes to the backend row shape (the kind is stored in a `type`
/// column). The zone store is the sole owner and mutator; everyone else
/// receives copies via snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceZone {
    pub id: ZoneId,
    pub session_id: SessionId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters, > 0
    pub radius: f64,
    #[serde(rename = "type")]
    pub kind: ZoneKind,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl GeofenceZone {
    /// Distance from the zone center to a coordinate pair, in meters
    pub fn distance_from(&self, latitude: f64, longitude: f64) -> f64 {
        haversine_distance(self.latitude, self.longitude, latitude, longitude)
    }

    /// Whether a coordinate pair falls within the zone radius
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.distance_from(latitude, longitude) <= self.radius
    }
}

/// Direction of a zone membership flip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Entered,
    Exited,
}

impl TransitionKind {
    pub fn as_str(&self) -> &str {
        match self {
            TransitionKind::Entered => "entered",
            TransitionKind::Exited => "exited",
        }
    }
}

/// A detected zone entry or exit. Produced exactly once per actual
/// membership flip.
#[derive(Debug, Clone)]
pub struct TransitionEvent {
    pub zone: GeofenceZone,
    pub kind: TransitionKind,
    /// The reading that triggered the flip
    pub position: Position,
    pub timestamp: DateTime<Utc>,
}

/// Safety alert classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyAlertKind {
    BatteryLow,
    BatteryCritical,
    HighSpeed,
}

impl SafetyAlertKind {
    pub fn as_str(&self) -> &str {
        match self {
            SafetyAlertKind::BatteryLow => "battery_low",
            SafetyAlertKind::BatteryCritical => "battery_critical",
            SafetyAlertKind::HighSpeed => "high_speed",
        }
    }
}

/// A battery or speed alert. Same single-delivery contract as
/// [`TransitionEvent`].
#[derive(Debug, Clone)]
pub struct SafetyAlert {
    pub kind: SafetyAlertKind,
    /// The measured value that triggered the alert: battery level (0..1)
    /// or speed in km/h
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(radius: f64) -> GeofenceZone {
        GeofenceZone {
            id: ZoneId::from("z1"),
            session_id: SessionId::from("s1"),
            name: "Casa".to_string(),
            latitude: -23.550520,
            longitude: -46.633309,
            radius,
            kind: ZoneKind::Safe,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_zone_contains() {
        let z = zone(100.0);
        assert!(z.contains(-23.5505, -46.6333)); // ~7 m away
        assert!(!z.contains(-23.560, -46.640)); // ~1.2 km away
    }

    #[test]
    fn test_zone_kind_serializes_to_type_column() {
        let json = serde_json::to_value(zone(50.0)).unwrap();
        assert_eq!(json["type"], "safe");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_zone_row_round_trip() {
        let z = zone(250.0);
        let json = serde_json::to_string(&z).unwrap();
        let back: GeofenceZone = serde_json::from_str(&json).unwrap();
        assert_eq!(back, z);
    }

    #[test]
    fn test_position_distance_to() {
        let a = Position::new(-23.550520, -46.633309);
        let b = Position::new(-23.5505, -46.6333);
        assert!(a.distance_to(&b) < 10.0);
        assert_eq!(a.distance_to(&a), 0.0);
    }
}
