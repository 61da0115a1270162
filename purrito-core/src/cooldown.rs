//! Per-player cooldowns for rate-limited actions.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};

use crate::clock::add_saturating;
use crate::types::normalize_nick;

/// Last-use timestamps for one cooldown-gated action. Held in memory by
/// the owning pet; a restart forgets every entry.
#[derive(Debug, Clone)]
pub struct CooldownTracker {
    duration: TimeDelta,
    used_at: HashMap<String, DateTime<Utc>>,
}

impl CooldownTracker {
    /// A tracker whose entries expire after `duration`.
    #[must_use]
    pub fn new(duration: TimeDelta) -> Self {
        Self {
            duration,
            used_at: HashMap::new(),
        }
    }

    /// Time left before `player` may act again; zero when ready.
    #[must_use]
    pub fn remaining(&self, player: &str, now: DateTime<Utc>) -> TimeDelta {
        self.used_at
            .get(&normalize_nick(player))
            .map_or(TimeDelta::zero(), |last| {
                (add_saturating(*last, self.duration) - now).max(TimeDelta::zero())
            })
    }

    /// Whether `player` is still cooling down.
    #[must_use]
    pub fn is_on_cooldown(&self, player: &str, now: DateTime<Utc>) -> bool {
        self.remaining(player, now) > TimeDelta::zero()
    }

    /// Start the cooldown for `player` at `now`.
    pub fn record(&mut self, player: &str, now: DateTime<Utc>) {
        self.used_at.insert(normalize_nick(player), now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).single().expect("ts")
    }

    #[test]
    fn never_used_is_ready() {
        let tracker = CooldownTracker::new(TimeDelta::hours(24));
        assert!(!tracker.is_on_cooldown("alice", t0()));
        assert_eq!(tracker.remaining("alice", t0()), TimeDelta::zero());
    }

    #[test]
    fn cooldown_expires_after_duration() {
        let mut tracker = CooldownTracker::new(TimeDelta::hours(24));
        tracker.record("Alice", t0());
        assert!(tracker.is_on_cooldown("alice", t0() + TimeDelta::hours(23)));
        assert_eq!(
            tracker.remaining("@alice", t0() + TimeDelta::hours(20)),
            TimeDelta::hours(4)
        );
        assert!(!tracker.is_on_cooldown("alice", t0() + TimeDelta::hours(24)));
    }

    #[test]
    fn players_are_independent() {
        let mut tracker = CooldownTracker::new(TimeDelta::hours(24));
        tracker.record("alice", t0());
        assert!(tracker.is_on_cooldown("alice", t0()));
        assert!(!tracker.is_on_cooldown("bob", t0()));
    }
}
