//! Zone membership tracking and enter/exit transition detection
//!
//! Pure computation over in-memory state. For each tracked session the
//! detector keeps a per-zone membership classification plus the last known
//! position. A zone first seen (or a fresh session) starts at Unknown and
//! never produces an event on its first classification, so the very first
//! GPS fix after startup cannot fire a spurious "entered".

use crate::domain::geo::haversine_distance;
use crate::domain::types::{
    GeofenceZone, Position, SessionId, TransitionEvent, TransitionKind, ZoneId,
};
use chrono::Utc;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

/// Membership classification for a (zone, session) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Membership {
    /// No prior classification exists for this zone
    #[default]
    Unknown,
    Inside,
    Outside,
}

#[derive(Debug, Default)]
struct SessionState {
    membership: FxHashMap<ZoneId, Membership>,
    last_position: Option<Position>,
}

/// Detects zone transitions from successive position readings.
///
/// State is keyed by session id so multiple tracked sessions can be
/// monitored concurrently without cross-contamination. Never fails for
/// geometrically valid input; zones with an invalid radius are skipped.
#[derive(Debug, Default)]
pub struct TransitionDetector {
    sessions: FxHashMap<SessionId, SessionState>,
}

impl TransitionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `position` against the zone snapshot and return the
    /// membership flips since the previous reading, at most one per zone.
    ///
    /// The snapshot is the authoritative zone set: membership kept for a
    /// zone no longer present (deleted or deactivated) is discarded, so a
    /// recreated zone restarts at Unknown instead of inheriting state.
    pub fn process(
        &mut self,
        session_id: &SessionId,
        position: &Position,
        zones: &[GeofenceZone],
    ) -> SmallVec<[TransitionEvent; 2]> {
        let state = self.sessions.entry(session_id.clone()).or_default();

        state.membership.retain(|zone_id, _| {
            zones.iter().any(|z| &z.id == zone_id && z.active && z.radius > 0.0)
        });

        let mut events = SmallVec::new();
        for zone in zones {
            if !zone.active {
                continue;
            }
            if zone.radius <= 0.0 {
                warn!(zone_id = %zone.id, radius = zone.radius, "zone_radius_invalid_skipped");
                continue;
            }

            let distance = haversine_distance(
                position.latitude,
                position.longitude,
                zone.latitude,
                zone.longitude,
            );
            let current =
                if distance <= zone.radius { Membership::Inside } else { Membership::Outside };
            let previous =
                state.membership.get(&zone.id).copied().unwrap_or(Membership::Unknown);

            let kind = match (previous, current) {
                (Membership::Outside, Membership::Inside) => Some(TransitionKind::Entered),
                (Membership::Inside, Membership::Outside) => Some(TransitionKind::Exited),
                // First classification, or no change
                _ => None,
            };

            if let Some(kind) = kind {
                debug!(
                    session_id = %session_id,
                    zone = %zone.name,
                    kind = kind.as_str(),
                    distance_m = distance as i64,
                    "zone_transition"
                );
                events.push(TransitionEvent {
                    zone: zone.clone(),
                    kind,
                    position: position.clone(),
                    timestamp: Utc::now(),
                });
            }

            state.membership.insert(zone.id.clone(), current);
        }

        state.last_position = Some(position.clone());
        events
    }

    /// Last reading processed for a session
    pub fn last_position(&self, session_id: &SessionId) -> Option<&Position> {
        self.sessions.get(session_id).and_then(|s| s.last_position.as_ref())
    }

    /// Current classification for a (session, zone) pair
    pub fn membership(&self, session_id: &SessionId, zone_id: &ZoneId) -> Membership {
        self.sessions
            .get(session_id)
            .and_then(|s| s.membership.get(zone_id).copied())
            .unwrap_or(Membership::Unknown)
    }

    /// Drop all state for a session (e.g. when tracking ends)
    pub fn clear_session(&mut self, session_id: &SessionId) {
        self.sessions.remove(session_id);
    }
}
