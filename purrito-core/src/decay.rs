//! Daily affection decay for bonded players who stayed away.
//!
//! Days here are **server-local** calendar days, unlike bond streaks which
//! use the reference zone.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::clock::TimeSource;
use crate::error::Result;
use crate::flavor::{fill, PERFECT_BOND_FADING};
use crate::store::RecordStore;
use crate::types::{Scope, MAX_AFFECTION};

/// One decay pass over a scope.
#[derive(Clone)]
pub struct DecayJob {
    store: Arc<dyn RecordStore>,
    scope: Scope,
    time: TimeSource,
    amount: u8,
    pet_display: String,
}

impl fmt::Debug for DecayJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecayJob")
            .field("scope", &self.scope)
            .field("amount", &self.amount)
            .finish_non_exhaustive()
    }
}

impl DecayJob {
    /// A job removing `amount` affection per silent day.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        scope: Scope,
        time: TimeSource,
        amount: u8,
        pet_display: impl Into<String>,
    ) -> Self {
        Self {
            store,
            scope,
            time,
            amount,
            pet_display: pet_display.into(),
        }
    }

    /// Decay every bonded player who neither decayed nor interacted today.
    ///
    /// Returns the one-time announcements for players whose perfect bond
    /// just started to fade.
    ///
    /// # Errors
    /// Any store failure aborts the pass; records already processed keep
    /// their new values.
    pub fn run(&self) -> Result<Vec<String>> {
        let start = Instant::now();
        let now = self.time.now();
        let zone = self.time.local_zone;
        let bonded = self.store.list_at_or_above(&self.scope, MAX_AFFECTION)?;

        let mut announcements = Vec::new();
        let mut decayed = 0_usize;

        for record in bonded {
            if record.last_decay_at.is_some_and(|at| zone.same_day(at, now)) {
                continue;
            }
            if record.last_interacted_at.is_some_and(|at| zone.same_day(at, now)) {
                continue;
            }

            let before = record.affection;
            let after = before.saturating_sub(self.amount);
            let key = &record.key;
            let first_drop = before == MAX_AFFECTION && !record.perfect_drop_warned;

            // Flag before affection: if the flag write fails the record is
            // untouched and the next pass retries both.
            if first_drop {
                self.store.set_perfect_drop_warned(key, true)?;
            }
            self.store.upsert_affection(key, after)?;
            self.store.set_decay_at(key, now)?;
            self.store.set_bond_streak(key, 0)?;
            decayed += 1;
            debug!(player = %key, before, after, "Affection decayed");

            if first_drop {
                announcements.push(fill(
                    PERFECT_BOND_FADING,
                    &[
                        ("pet", &self.pet_display),
                        ("player", &key.name),
                        ("from", &before.to_string()),
                        ("love", &after.to_string()),
                    ],
                ));
            }
        }

        info!(
            scope = %self.scope,
            decayed,
            warned = announcements.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Daily decay pass complete"
        );
        Ok(announcements)
    }
}
