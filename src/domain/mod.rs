//! Domain models - core value types and geometry
//!
//! - `types` - Position, GeofenceZone, transition and safety events
//! - `geo` - great-circle distance on a spherical Earth

pub mod geo;
pub mod types;

pub use geo::haversine_distance;
pub use types::{
    GeofenceZone, Position, SafetyAlert, SafetyAlertKind, SessionId, TransitionEvent,
    TransitionKind, ZoneId, ZoneKind,
};
