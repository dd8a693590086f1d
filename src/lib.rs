//! Geoguard - client-side geofencing and location monitoring engine
//!
//! Tracks a moving point against a set of named circular zones, detects
//! enter/exit transitions with great-circle distance, and delivers
//! de-duplicated alerts despite a noisy, intermittent position stream.
//!
//! Module structure:
//! - `domain/` - Core value types (Position, GeofenceZone, events) and geometry
//! - `io/` - External interfaces (persistence backend, geolocation, battery)
//! - `services/` - Business logic (zone store, transition detector, monitors)
//! - `infra/` - Infrastructure (Config)

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
