//! De-duplication policies for alert emission
//!
//! Two disciplines exist: zone and battery alerts fire only on crossing a
//! threshold, speed alerts are periodic reminders during a sustained
//! episode. Both are expressed by one configurable policy type instead of
//! per-call-site timers.

use std::time::{Duration, Instant};

/// How repeated observations of a true condition are de-duplicated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPolicy {
    /// Fire only when the condition flips from false to true
    EdgeTriggered,
    /// Fire whenever the condition holds and at least `min_interval` has
    /// elapsed since the previous firing
    Periodic { min_interval: Duration },
}

/// Per-alert-kind gate state
#[derive(Debug)]
pub struct AlertGate {
    policy: AlertPolicy,
    engaged: bool,
    last_fired: Option<Instant>,
}

impl AlertGate {
    pub fn new(policy: AlertPolicy) -> Self {
        Self { policy, engaged: false, last_fired: None }
    }

    /// Observe the condition at `at`. Returns true when an alert should
    /// fire for this observation.
    pub fn observe(&mut self, condition: bool, at: Instant) -> bool {
        let fire = match self.policy {
            AlertPolicy::EdgeTriggered => condition && !self.engaged,
            AlertPolicy::Periodic { min_interval } => {
                condition
                    && self
                        .last_fired
                        .map_or(true, |last| at.duration_since(last) >= min_interval)
            }
        };
        self.engaged = condition;
        if fire {
            self.last_fired = Some(at);
        }
        fire
    }

    /// Whether the condition held on the most recent observation
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}
