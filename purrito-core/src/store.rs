//! Record store abstraction.
//!
//! The engine never writes a whole [`PlayerRecord`] back. Each mutation is a
//! single-column upsert keyed by [`PlayerKey`], so concurrent writers touching
//! different fields of the same record cannot clobber each other, and a
//! record springs into existence (with zero defaults) on its first write.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::Result;
use crate::types::{GiftMask, PlayerKey, PlayerRecord, Scope};

/// Keyed store of player records.
pub trait RecordStore: Send + Sync {
    /// Fetch one record, `None` if the player was never seen.
    ///
    /// # Errors
    /// Backend failure.
    fn get(&self, key: &PlayerKey) -> Result<Option<PlayerRecord>>;

    /// Every record in `scope`.
    ///
    /// # Errors
    /// Backend failure.
    fn list_in_scope(&self, scope: &Scope) -> Result<Vec<PlayerRecord>>;

    /// Records in `scope` with `affection >= threshold`.
    ///
    /// # Errors
    /// Backend failure.
    fn list_at_or_above(&self, scope: &Scope, threshold: u8) -> Result<Vec<PlayerRecord>>;

    /// Create-or-update the affection value.
    ///
    /// # Errors
    /// Backend failure.
    fn upsert_affection(&self, key: &PlayerKey, affection: u8) -> Result<()>;

    /// Stamp the last caring interaction.
    ///
    /// # Errors
    /// Backend failure.
    fn touch_interaction(&self, key: &PlayerKey, at: DateTime<Utc>) -> Result<()>;

    /// Stamp the last decay.
    ///
    /// # Errors
    /// Backend failure.
    fn set_decay_at(&self, key: &PlayerKey, at: DateTime<Utc>) -> Result<()>;

    /// Overwrite the current bond streak.
    ///
    /// # Errors
    /// Backend failure.
    fn set_bond_streak(&self, key: &PlayerKey, streak: u32) -> Result<()>;

    /// Overwrite the highest bond streak.
    ///
    /// # Errors
    /// Backend failure.
    fn set_highest_bond_streak(&self, key: &PlayerKey, highest: u32) -> Result<()>;

    /// Add to the lifetime bond points.
    ///
    /// # Errors
    /// Backend failure.
    fn add_bond_points(&self, key: &PlayerKey, points: u32) -> Result<()>;

    /// Stamp the last bond award.
    ///
    /// # Errors
    /// Backend failure.
    fn set_bond_awarded_at(&self, key: &PlayerKey, at: DateTime<Utc>) -> Result<()>;

    /// OR `mask` into the unlocked gifts.
    ///
    /// # Errors
    /// Backend failure.
    fn add_gifts_unlocked(&self, key: &PlayerKey, mask: GiftMask) -> Result<()>;

    /// Set the one-time warning flag.
    ///
    /// # Errors
    /// Backend failure.
    fn set_perfect_drop_warned(&self, key: &PlayerKey, warned: bool) -> Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A [`RecordStore`] held entirely in memory. Sharded, so players in
/// different scopes rarely contend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<PlayerKey, PlayerRecord>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert or replace a whole record. Intended for seeding fixtures.
    pub fn insert(&self, record: PlayerRecord) {
        self.records.insert(record.key.clone(), record);
    }

    fn update(&self, key: &PlayerKey, apply: impl FnOnce(&mut PlayerRecord)) {
        let mut entry = self
            .records
            .entry(key.clone())
            .or_insert_with(|| PlayerRecord::new(key.clone()));
        apply(entry.value_mut());
    }

    fn collect(&self, keep: impl Fn(&PlayerRecord) -> bool) -> Vec<PlayerRecord> {
        self.records
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &PlayerKey) -> Result<Option<PlayerRecord>> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    fn list_in_scope(&self, scope: &Scope) -> Result<Vec<PlayerRecord>> {
        Ok(self.collect(|r| &r.key.scope == scope))
    }

    fn list_at_or_above(&self, scope: &Scope, threshold: u8) -> Result<Vec<PlayerRecord>> {
        Ok(self.collect(|r| &r.key.scope == scope && r.affection >= threshold))
    }

    fn upsert_affection(&self, key: &PlayerKey, affection: u8) -> Result<()> {
        self.update(key, |r| r.affection = affection);
        Ok(())
    }

    fn touch_interaction(&self, key: &PlayerKey, at: DateTime<Utc>) -> Result<()> {
        self.update(key, |r| r.last_interacted_at = Some(at));
        Ok(())
    }

    fn set_decay_at(&self, key: &PlayerKey, at: DateTime<Utc>) -> Result<()> {
        self.update(key, |r| r.last_decay_at = Some(at));
        Ok(())
    }

    fn set_bond_streak(&self, key: &PlayerKey, streak: u32) -> Result<()> {
        self.update(key, |r| r.bond_streak = streak);
        Ok(())
    }

    fn set_highest_bond_streak(&self, key: &PlayerKey, highest: u32) -> Result<()> {
        self.update(key, |r| r.highest_bond_streak = highest);
        Ok(())
    }

    fn add_bond_points(&self, key: &PlayerKey, points: u32) -> Result<()> {
        self.update(key, |r| r.bond_points = r.bond_points.saturating_add(points));
        Ok(())
    }

    fn set_bond_awarded_at(&self, key: &PlayerKey, at: DateTime<Utc>) -> Result<()> {
        self.update(key, |r| r.last_bond_award_at = Some(at));
        Ok(())
    }

    fn add_gifts_unlocked(&self, key: &PlayerKey, mask: GiftMask) -> Result<()> {
        self.update(key, |r| r.gifts_unlocked |= mask);
        Ok(())
    }

    fn set_perfect_drop_warned(&self, key: &PlayerKey, warned: bool) -> Result<()> {
        self.update(key, |r| r.perfect_drop_warned = warned);
        Ok(())
    }
}
