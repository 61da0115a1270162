//! Daily bond rewards for players at 100% affection.
//!
//! A bonded player earns points at most once per *reference day* (calendar
//! day in the configured reference zone, shared by every player). Claiming
//! on consecutive reference days grows a streak; the streak drives a point
//! bonus and, through its lifetime high, gifts and titles.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::clock::TimeSource;
use crate::config::BondConfig;
use crate::error::Result;
use crate::gifts::{gift_unlocks, join_gifts, title_for_highest_streak, GiftUnlock};
use crate::store::RecordStore;
use crate::types::{PlayerRecord, Scope};

/// Result of one bonded interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondAward {
    /// Points granted now; 0 when today was already claimed.
    pub awarded_points: u32,
    /// Lifetime points after this award.
    pub total_points: u32,
    /// Current streak after this award.
    pub streak: u32,
    /// Highest streak after this award.
    pub highest_streak: u32,
    /// Highest streak before this award.
    pub previous_highest: u32,
    /// Gifts whose threshold this award crossed.
    pub gifts_unlocked: Vec<GiftUnlock>,
}

impl BondAward {
    /// Whether this call claimed today's reward.
    #[must_use]
    pub fn is_new_award(&self) -> bool {
        self.awarded_points > 0
    }

    /// Progress suffix appended to a bonded player's action outcome.
    #[must_use]
    pub fn suffix(&self) -> String {
        let mut out = String::new();
        if !self.gifts_unlocked.is_empty() {
            let names: Vec<&str> = self.gifts_unlocked.iter().map(|g| g.name).collect();
            out.push_str(&format!(" :: 😸🎁 {} unlocked", join_gifts(&names)));
        }
        let title = title_for_highest_streak(self.highest_streak);
        if self.is_new_award() {
            out.push_str(&format!(
                " :: Streak: {} day(s) :: +{} BondPoints :: Total: {} :: Title: {title}",
                self.streak, self.awarded_points, self.total_points
            ));
        } else {
            out.push_str(&format!(
                " :: Streak: {} day(s) :: already bonded today :: Total: {} :: Title: {title}",
                self.streak, self.total_points
            ));
        }
        out
    }
}

impl fmt::Display for BondAward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.suffix())
    }
}

/// Points for a day with streak `streak`: base plus one per full milestone,
/// with the bonus capped.
#[must_use]
pub fn points_for_streak(config: &BondConfig, streak: u32) -> u32 {
    let bonus = streak
        .checked_div(config.milestone_days)
        .unwrap_or(0)
        .min(config.max_bonus);
    config.base_points.saturating_add(bonus)
}

/// Ledger of daily bond rewards in one scope.
#[derive(Clone)]
pub struct BondProgression {
    store: Arc<dyn RecordStore>,
    scope: Scope,
    time: TimeSource,
    config: BondConfig,
}

impl fmt::Debug for BondProgression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BondProgression")
            .field("scope", &self.scope)
            .field("reference_zone", &self.time.reference_zone)
            .finish_non_exhaustive()
    }
}

impl BondProgression {
    /// Bond rewards for `scope`.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        scope: Scope,
        time: TimeSource,
        config: BondConfig,
    ) -> Self {
        Self {
            store,
            scope,
            time,
            config,
        }
    }

    /// Claim today's reward for `player`, who the caller has verified is at
    /// 100% affection. Repeat calls on the same reference day award nothing
    /// and report the existing totals.
    ///
    /// # Errors
    /// Propagates store read and write failures.
    pub fn record_bonded_interaction(&self, player: &str) -> Result<BondAward> {
        let now = self.time.reference_now();
        let key = self.scope.key(player);
        let record = self
            .store
            .get(&key)?
            .unwrap_or_else(|| PlayerRecord::new(key.clone()));

        let previous_highest = record.highest_bond_streak;

        if let Some(last) = record.last_bond_award_at {
            if self.time.reference_zone.same_day(last, now) {
                debug!(player = %key, "Bond reward already claimed today");
                return Ok(BondAward {
                    awarded_points: 0,
                    total_points: record.bond_points,
                    streak: record.bond_streak,
                    highest_streak: previous_highest,
                    previous_highest,
                    gifts_unlocked: Vec::new(),
                });
            }
        }

        let streak = self.next_streak(&record, now);
        let awarded_points = points_for_streak(&self.config, streak);
        let highest_streak = previous_highest.max(streak);

        self.store.set_bond_streak(&key, streak)?;
        self.store.add_bond_points(&key, awarded_points)?;
        self.store.set_bond_awarded_at(&key, now)?;
        if highest_streak != previous_highest {
            self.store.set_highest_bond_streak(&key, highest_streak)?;
        }

        let award = BondAward {
            awarded_points,
            total_points: record.bond_points.saturating_add(awarded_points),
            streak,
            highest_streak,
            previous_highest,
            gifts_unlocked: gift_unlocks(previous_highest, highest_streak),
        };

        info!(
            player = %key,
            streak,
            awarded = awarded_points,
            total = award.total_points,
            highest = highest_streak,
            "Bond reward claimed"
        );
        Ok(award)
    }

    fn next_streak(&self, record: &PlayerRecord, now: DateTime<Utc>) -> u32 {
        match record.last_bond_award_at {
            Some(last) if self.time.reference_zone.is_previous_day(last, now) => {
                record.bond_streak.saturating_add(1)
            }
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, DayZone, ManualClock};
    use crate::store::MemoryStore;
    use chrono::{TimeDelta, TimeZone};

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        bond: BondProgression,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        // 15:00 UTC is 10:00 or 11:00 in New York.
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 10, 15, 0, 0).single().expect("ts"),
        ));
        let zone = DayZone::resolve("America/New_York", false).expect("zone");
        let time = TimeSource::new(clock.clone(), DayZone::Local, zone);
        let bond = BondProgression::new(
            store.clone(),
            Scope::new("net", "#chan"),
            time,
            BondConfig::default(),
        );
        Fixture { store, clock, bond }
    }

    #[test]
    fn points_schedule() {
        let config = BondConfig::default();
        assert_eq!(points_for_streak(&config, 1), 2);
        assert_eq!(points_for_streak(&config, 6), 2);
        assert_eq!(points_for_streak(&config, 7), 3);
        assert_eq!(points_for_streak(&config, 34), 6);
        assert_eq!(points_for_streak(&config, 35), 7);
        assert_eq!(points_for_streak(&config, 1_000), 7);
    }

    #[test]
    fn first_award_starts_streak() {
        let f = fixture();
        let award = f.bond.record_bonded_interaction("alice").expect("award");
        assert_eq!(award.awarded_points, 2);
        assert_eq!(award.streak, 1);
        assert_eq!(award.highest_streak, 1);
        assert_eq!(award.total_points, 2);
    }

    #[test]
    fn same_day_is_idempotent() {
        let f = fixture();
        f.bond.record_bonded_interaction("alice").expect("first");
        f.clock.advance(TimeDelta::hours(5));
        let again = f.bond.record_bonded_interaction("alice").expect("second");
        assert_eq!(again.awarded_points, 0);
        assert_eq!(again.total_points, 2);
        assert_eq!(again.streak, 1);
        assert!(again.suffix().contains("already bonded today"));

        let record = f
            .store
            .get(&Scope::new("net", "#chan").key("alice"))
            .expect("get")
            .expect("row");
        assert_eq!(record.bond_points, 2);
    }

    #[test]
    fn consecutive_days_extend_streak_and_gap_resets() {
        let f = fixture();
        f.bond.record_bonded_interaction("alice").expect("day 1");
        f.clock.advance(TimeDelta::days(1));
        let day2 = f.bond.record_bonded_interaction("alice").expect("day 2");
        assert_eq!(day2.streak, 2);

        f.clock.advance(TimeDelta::days(2));
        let after_gap = f.bond.record_bonded_interaction("alice").expect("day 4");
        assert_eq!(after_gap.streak, 1);
        assert_eq!(after_gap.highest_streak, 2);
        assert_eq!(after_gap.previous_highest, 2);
        assert_eq!(after_gap.total_points, 6);
    }

    #[test]
    fn reference_midnight_separates_days() {
        let f = fixture();
        // 04:30 UTC on the 11th is still the 10th in New York.
        f.clock.set(Utc.with_ymd_and_hms(2025, 1, 11, 4, 30, 0).single().expect("ts"));
        f.bond.record_bonded_interaction("alice").expect("late evening");
        // 06:00 UTC on the 11th is 01:00 on the 11th in New York.
        f.clock.set(Utc.with_ymd_and_hms(2025, 1, 11, 6, 0, 0).single().expect("ts"));
        let next = f.bond.record_bonded_interaction("alice").expect("after midnight");
        assert_eq!(next.streak, 2);
        assert!(next.is_new_award());
    }

    #[test]
    fn crossing_seven_unlocks_first_gift() {
        let f = fixture();
        let key = Scope::new("net", "#chan").key("alice");
        f.store.set_bond_streak(&key, 6).expect("streak");
        f.store.set_highest_bond_streak(&key, 6).expect("highest");
        f.store
            .set_bond_awarded_at(&key, f.clock.now() - TimeDelta::days(1))
            .expect("yesterday");

        let award = f.bond.record_bonded_interaction("alice").expect("award");
        assert_eq!(award.streak, 7);
        assert_eq!(award.awarded_points, 3);
        assert_eq!(award.gifts_unlocked.len(), 1);
        assert!(award.suffix().starts_with(" :: 😸🎁 🐹 Tiny Guinea Pig unlocked"));
        assert!(award.suffix().contains("Title: Getting Purrito's Trust 🐱"));
    }
}
