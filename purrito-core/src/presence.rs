//! Spawn/despawn state machine for the shared pet.
//!
//! The pet is either **present** (`now < present_until`) or **absent**, in
//! which case it may have a pending `next_spawn_at`. Transitions are lazy:
//! [`PresenceScheduler::refresh`] applies whatever is overdue and queues a
//! [`PresenceEvent`] for each, which the owner drains with
//! [`PresenceScheduler::take_events`].

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::clock::{add_saturating, secs};
use crate::config::PresenceConfig;
use crate::dice::Dice;

/// A transition worth announcing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    /// The pet appeared.
    Spawned,
    /// The window ran out with nobody interacting.
    WanderedOff,
}

/// Presence window for one pet.
#[derive(Debug, Clone)]
pub struct PresenceScheduler {
    window: TimeDelta,
    min_respawn_secs: u64,
    max_respawn_secs: u64,
    present_until: Option<DateTime<Utc>>,
    next_spawn_at: Option<DateTime<Utc>>,
    events: Vec<PresenceEvent>,
}

impl PresenceScheduler {
    /// A scheduler whose pet is present for one window starting at `now`.
    #[must_use]
    pub fn new(config: &PresenceConfig, now: DateTime<Utc>) -> Self {
        let window = secs(config.spawn_window_secs);
        Self {
            window,
            min_respawn_secs: config.min_respawn_secs,
            max_respawn_secs: config.max_respawn_secs,
            present_until: Some(add_saturating(now, window)),
            next_spawn_at: None,
            events: vec![PresenceEvent::Spawned],
        }
    }

    /// End of the current appearance, if any.
    #[must_use]
    pub fn present_until(&self) -> Option<DateTime<Utc>> {
        self.present_until
    }

    /// Start of the next appearance, if scheduled.
    #[must_use]
    pub fn next_spawn_at(&self) -> Option<DateTime<Utc>> {
        self.next_spawn_at
    }

    /// Apply any transition that is due at `now`.
    pub fn refresh(&mut self, now: DateTime<Utc>, dice: &mut dyn Dice) {
        if let Some(until) = self.present_until {
            if now >= until {
                self.present_until = None;
                self.schedule_respawn(now, dice);
                self.events.push(PresenceEvent::WanderedOff);
                debug!(next_spawn = ?self.next_spawn_at, "Pet wandered off");
            }
        }

        if self.present_until.is_none() {
            if let Some(spawn_at) = self.next_spawn_at {
                if now >= spawn_at {
                    self.present_until = Some(add_saturating(now, self.window));
                    self.next_spawn_at = None;
                    self.events.push(PresenceEvent::Spawned);
                    debug!(until = ?self.present_until, "Pet spawned");
                }
            }
        }
    }

    /// Whether the pet is present at `now`, after applying due transitions.
    pub fn is_here(&mut self, now: DateTime<Utc>, dice: &mut dyn Dice) -> bool {
        self.refresh(now, dice);
        self.present_until.is_some_and(|until| now < until)
    }

    /// Spend the current appearance on an interaction. The pet leaves
    /// silently and a respawn is scheduled. Returns `false` when absent.
    pub fn consume(&mut self, now: DateTime<Utc>, dice: &mut dyn Dice) -> bool {
        if !self.is_here(now, dice) {
            return false;
        }
        self.present_until = None;
        self.schedule_respawn(now, dice);
        true
    }

    /// Make the pet appear for up to `duration` if it is absent with no
    /// spawn pending. An active window is never extended, and the forced
    /// window never exceeds the configured one.
    pub fn ensure_present(&mut self, now: DateTime<Utc>, duration: TimeDelta, dice: &mut dyn Dice) {
        self.refresh(now, dice);
        if self.present_until.is_some_and(|until| now < until) {
            return;
        }
        if self.next_spawn_at.is_some_and(|spawn_at| now < spawn_at) {
            return;
        }
        let window = if duration <= TimeDelta::zero() || duration > self.window {
            self.window
        } else {
            duration
        };
        self.present_until = Some(add_saturating(now, window));
        self.next_spawn_at = None;
    }

    /// Clear both the window and any pending spawn.
    pub fn force_absent(&mut self) {
        self.present_until = None;
        self.next_spawn_at = None;
    }

    /// Drain queued events, oldest first.
    pub fn take_events(&mut self) -> Vec<PresenceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Time until the current appearance ends; zero when absent.
    #[must_use]
    pub fn leaves_in(&self, now: DateTime<Utc>) -> TimeDelta {
        self.present_until
            .map_or(TimeDelta::zero(), |until| (until - now).max(TimeDelta::zero()))
    }

    /// Time until the next appearance; `None` when none is scheduled.
    #[must_use]
    pub fn back_in(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.next_spawn_at
            .map(|at| (at - now).max(TimeDelta::zero()))
    }

    fn schedule_respawn(&mut self, now: DateTime<Utc>, dice: &mut dyn Dice) {
        let gap = dice.between(self.min_respawn_secs, self.max_respawn_secs);
        self.next_spawn_at = Some(add_saturating(now, secs(gap)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("ts")
    }

    fn scheduler() -> PresenceScheduler {
        PresenceScheduler::new(&PresenceConfig::default(), t0())
    }

    #[test]
    fn starts_present_with_spawn_event() {
        let mut presence = scheduler();
        let mut dice = ScriptedDice::always(0);
        assert!(presence.is_here(t0(), &mut dice));
        assert_eq!(presence.take_events(), [PresenceEvent::Spawned]);
        assert_eq!(presence.leaves_in(t0()), TimeDelta::seconds(180));
    }

    #[test]
    fn consume_allows_one_interaction_per_visit() {
        let mut presence = scheduler();
        let mut dice = ScriptedDice::always(0).with_gaps([900]);
        assert!(presence.consume(t0(), &mut dice));
        assert!(!presence.consume(t0(), &mut dice));
        assert_eq!(presence.back_in(t0()), Some(TimeDelta::seconds(900)));
        presence.take_events();
        assert!(presence.take_events().is_empty());
    }

    #[test]
    fn expiry_wanders_off_exactly_once() {
        let mut presence = scheduler();
        let mut dice = ScriptedDice::always(0).with_gaps([700]);
        presence.take_events();

        let expiry = t0() + TimeDelta::seconds(180);
        assert!(!presence.is_here(expiry, &mut dice));
        assert!(!presence.is_here(expiry + TimeDelta::seconds(5), &mut dice));
        assert_eq!(presence.take_events(), [PresenceEvent::WanderedOff]);
        let next = presence.next_spawn_at().expect("scheduled");
        assert!(next > expiry);
        assert_eq!(next, expiry + TimeDelta::seconds(700));
    }

    #[test]
    fn respawns_when_due() {
        let mut presence = scheduler();
        let mut dice = ScriptedDice::always(0).with_gaps([600]);
        presence.consume(t0(), &mut dice);
        presence.take_events();

        let due = t0() + TimeDelta::seconds(600);
        assert!(presence.is_here(due, &mut dice));
        assert_eq!(presence.take_events(), [PresenceEvent::Spawned]);
        assert!(presence.next_spawn_at().is_none());
    }

    #[test]
    fn ensure_present_respects_window_and_schedule() {
        let mut dice = ScriptedDice::always(0).with_gaps([600]);

        let mut presence = scheduler();
        presence.ensure_present(t0(), TimeDelta::hours(1), &mut dice);
        assert_eq!(presence.present_until(), Some(t0() + TimeDelta::seconds(180)));

        presence.consume(t0(), &mut dice);
        presence.ensure_present(t0(), TimeDelta::seconds(60), &mut dice);
        assert!(presence.present_until().is_none(), "pending spawn wins");

        presence.force_absent();
        presence.ensure_present(t0(), TimeDelta::hours(1), &mut dice);
        assert_eq!(presence.present_until(), Some(t0() + TimeDelta::seconds(180)));

        presence.force_absent();
        presence.ensure_present(t0(), TimeDelta::seconds(30), &mut dice);
        assert_eq!(presence.present_until(), Some(t0() + TimeDelta::seconds(30)));
    }

    #[test]
    fn force_absent_clears_everything() {
        let mut presence = scheduler();
        let mut dice = ScriptedDice::always(0);
        presence.force_absent();
        assert!(!presence.is_here(t0(), &mut dice));
        assert_eq!(presence.back_in(t0()), None);
        assert_eq!(presence.leaves_in(t0()), TimeDelta::zero());
    }
}
