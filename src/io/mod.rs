//! IO modules - external system interfaces
//!
//! - `backend` - persistence backend boundary (zone, location and alert rows)
//! - `geolocation` - device location capability and the normalized feed
//! - `battery` - optional device battery capability

pub mod backend;
pub mod battery;
pub mod geolocation;

// Re-export commonly used types
pub use backend::{Backend, BackendError, LocationRow, MemoryBackend, RestBackend};
pub use battery::{BatteryCapability, BatteryReading, BatterySource};
pub use geolocation::{GeoOptions, LocationSource, PositionError, PositionFeed, WatchHandle};
