//! SQLite record store.
//!
//! One row per player per scope:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS cat_players (
//!     id                  TEXT PRIMARY KEY,
//!     name                TEXT NOT NULL,
//!     network             TEXT NOT NULL,
//!     channel             TEXT NOT NULL,
//!     affection           INTEGER NOT NULL DEFAULT 0,
//!     last_interacted_at  TEXT,
//!     last_decay_at       TEXT,
//!     bond_streak         INTEGER NOT NULL DEFAULT 0,
//!     highest_bond_streak INTEGER NOT NULL DEFAULT 0,
//!     last_bond_award_at  TEXT,
//!     bond_points         INTEGER NOT NULL DEFAULT 0,
//!     perfect_drop_warned INTEGER NOT NULL DEFAULT 0,
//!     gifts_unlocked      INTEGER NOT NULL DEFAULT 0,
//!     created_at          TEXT NOT NULL,
//!     updated_at          TEXT NOT NULL,
//!     UNIQUE (name, network, channel)
//! );
//! ```
//!
//! Every setter is a single-column `INSERT .. ON CONFLICT DO UPDATE`, so a
//! write never touches columns it does not own. Timestamps are RFC 3339 text.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, ToSql};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PersistenceConfig;
use crate::error::{PurritoError, Result};
use crate::store::{MemoryStore, RecordStore};
use crate::types::{GiftMask, PlayerKey, PlayerRecord, Scope};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cat_players (
    id                  TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    network             TEXT NOT NULL,
    channel             TEXT NOT NULL,
    affection           INTEGER NOT NULL DEFAULT 0,
    last_interacted_at  TEXT,
    last_decay_at       TEXT,
    bond_streak         INTEGER NOT NULL DEFAULT 0,
    highest_bond_streak INTEGER NOT NULL DEFAULT 0,
    last_bond_award_at  TEXT,
    bond_points         INTEGER NOT NULL DEFAULT 0,
    perfect_drop_warned INTEGER NOT NULL DEFAULT 0,
    gifts_unlocked      INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,
    UNIQUE (name, network, channel)
);
CREATE INDEX IF NOT EXISTS idx_cat_players_scope
    ON cat_players (network, channel, affection);";

const SELECT_COLUMNS: &str = "name, network, channel, affection, last_interacted_at, \
     last_decay_at, bond_streak, highest_bond_streak, last_bond_award_at, bond_points, \
     perfect_drop_warned, gifts_unlocked";

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// [`RecordStore`] backed by an SQLite database.
///
/// ```no_run
/// # use purrito_core::persistence::SqliteStore;
/// # use purrito_core::config::PersistenceConfig;
/// # use purrito_core::store::RecordStore;
/// # use purrito_core::types::Scope;
/// let store = SqliteStore::open("purrito.db", &PersistenceConfig::default())?;
/// let key = Scope::new("libera", "#cats").key("alice");
/// store.upsert_affection(&key, 42)?;
/// assert_eq!(store.get(&key)?.map(|r| r.affection), Some(42));
/// # Ok::<(), purrito_core::PurritoError>(())
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema.
    ///
    /// # Errors
    ///
    /// Returns [`PurritoError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "Purrito record store opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`PurritoError::Database`] on SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Path of the underlying database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Create-or-update one row, applying `update` on conflict.
    ///
    /// `column` receives `value` on insert; `update` is the `SET` clause used
    /// when the row already exists and may refer to `excluded.<column>`.
    fn upsert(&self, key: &PlayerKey, column: &str, update: &str, value: &dyn ToSql) -> Result<()> {
        let start = Instant::now();
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "INSERT INTO cat_players (id, name, network, channel, {column}, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(name, network, channel) DO UPDATE SET
                {update},
                updated_at = excluded.updated_at"
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.execute(params![
            Uuid::new_v4().to_string(),
            key.name,
            key.scope.network,
            key.scope.channel,
            value,
            now,
        ])?;

        debug!(
            player = %key,
            column,
            elapsed_us = start.elapsed().as_micros(),
            "Upserted player column"
        );
        Ok(())
    }

    fn set_column(&self, key: &PlayerKey, column: &str, value: &dyn ToSql) -> Result<()> {
        self.upsert(key, column, &format!("{column} = excluded.{column}"), value)
    }

    fn query(&self, sql: &str, args: &[&dyn ToSql]) -> Result<Vec<PlayerRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt.query_map(args, RawRow::from_row)?;

        let mut raw = Vec::new();
        for row in rows {
            raw.push(row?);
        }
        drop(stmt);
        drop(conn);

        raw.into_iter().map(RawRow::into_record).collect()
    }
}

/// Open the backend named by `config.backend`: `"sqlite"` at
/// `config.path`, or `"memory"` for a store that lives as long as the
/// process.
///
/// # Errors
///
/// Returns [`PurritoError::Config`] for an unknown backend and
/// [`PurritoError::Database`] when SQLite cannot open the file.
pub fn open_store(config: &PersistenceConfig) -> Result<Arc<dyn RecordStore>> {
    match config.backend.trim().to_lowercase().as_str() {
        "sqlite" => Ok(Arc::new(SqliteStore::open(&config.path, config)?)),
        "memory" => {
            info!("In-memory record store opened, records will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => Err(PurritoError::Config(format!(
            "unknown persistence backend '{other}', expected \"sqlite\" or \"memory\""
        ))),
    }
}

impl RecordStore for SqliteStore {
    fn get(&self, key: &PlayerKey) -> Result<Option<PlayerRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM cat_players
             WHERE name = ?1 AND network = ?2 AND channel = ?3"
        );
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql)?;
        let raw = stmt
            .query_row(
                params![key.name, key.scope.network, key.scope.channel],
                RawRow::from_row,
            )
            .optional()?;
        drop(stmt);
        drop(conn);

        raw.map(RawRow::into_record).transpose()
    }

    fn list_in_scope(&self, scope: &Scope) -> Result<Vec<PlayerRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM cat_players
             WHERE network = ?1 AND channel = ?2"
        );
        self.query(&sql, params![scope.network, scope.channel])
    }

    fn list_at_or_above(&self, scope: &Scope, threshold: u8) -> Result<Vec<PlayerRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM cat_players
             WHERE network = ?1 AND channel = ?2 AND affection >= ?3"
        );
        self.query(&sql, params![scope.network, scope.channel, threshold])
    }

    fn upsert_affection(&self, key: &PlayerKey, affection: u8) -> Result<()> {
        self.set_column(key, "affection", &affection)
    }

    fn touch_interaction(&self, key: &PlayerKey, at: DateTime<Utc>) -> Result<()> {
        self.set_column(key, "last_interacted_at", &at.to_rfc3339())
    }

    fn set_decay_at(&self, key: &PlayerKey, at: DateTime<Utc>) -> Result<()> {
        self.set_column(key, "last_decay_at", &at.to_rfc3339())
    }

    fn set_bond_streak(&self, key: &PlayerKey, streak: u32) -> Result<()> {
        self.set_column(key, "bond_streak", &streak)
    }

    fn set_highest_bond_streak(&self, key: &PlayerKey, highest: u32) -> Result<()> {
        self.set_column(key, "highest_bond_streak", &highest)
    }

    fn add_bond_points(&self, key: &PlayerKey, points: u32) -> Result<()> {
        self.upsert(
            key,
            "bond_points",
            "bond_points = bond_points + excluded.bond_points",
            &points,
        )
    }

    fn set_bond_awarded_at(&self, key: &PlayerKey, at: DateTime<Utc>) -> Result<()> {
        self.set_column(key, "last_bond_award_at", &at.to_rfc3339())
    }

    fn add_gifts_unlocked(&self, key: &PlayerKey, mask: GiftMask) -> Result<()> {
        self.upsert(
            key,
            "gifts_unlocked",
            "gifts_unlocked = gifts_unlocked | excluded.gifts_unlocked",
            &mask.0,
        )
    }

    fn set_perfect_drop_warned(&self, key: &PlayerKey, warned: bool) -> Result<()> {
        self.set_column(key, "perfect_drop_warned", &warned)
    }
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

/// A row as SQLite hands it back, before timestamps are parsed.
struct RawRow {
    name: String,
    network: String,
    channel: String,
    affection: u8,
    last_interacted_at: Option<String>,
    last_decay_at: Option<String>,
    bond_streak: u32,
    highest_bond_streak: u32,
    last_bond_award_at: Option<String>,
    bond_points: u32,
    perfect_drop_warned: bool,
    gifts_unlocked: u32,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            network: row.get(1)?,
            channel: row.get(2)?,
            affection: row.get(3)?,
            last_interacted_at: row.get(4)?,
            last_decay_at: row.get(5)?,
            bond_streak: row.get(6)?,
            highest_bond_streak: row.get(7)?,
            last_bond_award_at: row.get(8)?,
            bond_points: row.get(9)?,
            perfect_drop_warned: row.get(10)?,
            gifts_unlocked: row.get(11)?,
        })
    }

    fn into_record(self) -> Result<PlayerRecord> {
        Ok(PlayerRecord {
            key: PlayerKey {
                name: self.name,
                scope: Scope {
                    network: self.network,
                    channel: self.channel,
                },
            },
            affection: self.affection.min(crate::types::MAX_AFFECTION),
            last_interacted_at: parse_timestamp(self.last_interacted_at)?,
            last_decay_at: parse_timestamp(self.last_decay_at)?,
            bond_streak: self.bond_streak,
            highest_bond_streak: self.highest_bond_streak,
            last_bond_award_at: parse_timestamp(self.last_bond_award_at)?,
            bond_points: self.bond_points,
            perfect_drop_warned: self.perfect_drop_warned,
            gifts_unlocked: GiftMask(self.gifts_unlocked),
        })
    }
}

fn parse_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|text| {
            DateTime::parse_from_rfc3339(&text)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| PurritoError::InvalidTimestamp {
                    value: text.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extension trait to make `query_row` return `Option`.
trait OptionalExt<T> {
    /// Convert `QueryReturnedNoRows` into `Ok(None)`.
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scope() -> Scope {
        Scope::new("libera", "#Cats")
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).single().expect("ts")
    }

    #[test]
    fn open_store_follows_configured_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sqlite = PersistenceConfig {
            path: dir.path().join("cats.db").display().to_string(),
            ..PersistenceConfig::default()
        };
        let store = open_store(&sqlite).expect("sqlite");
        store.upsert_affection(&scope().key("ann"), 12).expect("write");
        assert!(dir.path().join("cats.db").exists());

        let memory = PersistenceConfig {
            backend: "Memory".to_string(),
            ..PersistenceConfig::default()
        };
        let store = open_store(&memory).expect("memory");
        assert!(store.get(&scope().key("ann")).expect("get").is_none());

        let bogus = PersistenceConfig {
            backend: "postgres".to_string(),
            ..PersistenceConfig::default()
        };
        assert!(matches!(open_store(&bogus), Err(PurritoError::Config(_))));
    }

    #[test]
    fn missing_player_is_none() {
        let store = SqliteStore::open_in_memory().expect("open");
        assert!(store.get(&scope().key("ghost")).expect("get").is_none());
    }

    #[test]
    fn first_write_creates_row_with_defaults() {
        let store = SqliteStore::open_in_memory().expect("open");
        let key = scope().key("@Alice");
        store.set_bond_streak(&key, 3).expect("streak");

        let record = store.get(&key).expect("get").expect("row");
        assert_eq!(record.key.name, "alice");
        assert_eq!(record.key.scope.channel, "#cats");
        assert_eq!(record.bond_streak, 3);
        assert_eq!(record.affection, 0);
        assert!(record.last_interacted_at.is_none());
        assert!(!record.perfect_drop_warned);
    }

    #[test]
    fn column_upserts_preserve_other_columns() {
        let store = SqliteStore::open_in_memory().expect("open");
        let key = scope().key("bob");
        store.upsert_affection(&key, 100).expect("affection");
        store.touch_interaction(&key, at(9)).expect("touch");
        store.set_bond_awarded_at(&key, at(10)).expect("award");
        store.set_perfect_drop_warned(&key, true).expect("warned");
        store.upsert_affection(&key, 95).expect("affection again");

        let record = store.get(&key).expect("get").expect("row");
        assert_eq!(record.affection, 95);
        assert_eq!(record.last_interacted_at, Some(at(9)));
        assert_eq!(record.last_bond_award_at, Some(at(10)));
        assert!(record.perfect_drop_warned);
    }

    #[test]
    fn points_accumulate_and_gifts_or() {
        let store = SqliteStore::open_in_memory().expect("open");
        let key = scope().key("carol");
        store.add_bond_points(&key, 2).expect("p1");
        store.add_bond_points(&key, 5).expect("p2");
        store.add_gifts_unlocked(&key, GiftMask(1)).expect("g1");
        store.add_gifts_unlocked(&key, GiftMask(4)).expect("g2");
        store.add_gifts_unlocked(&key, GiftMask(1)).expect("g3");

        let record = store.get(&key).expect("get").expect("row");
        assert_eq!(record.bond_points, 7);
        assert_eq!(record.gifts_unlocked, GiftMask(5));
    }

    #[test]
    fn listing_filters_by_scope_and_threshold() {
        let store = SqliteStore::open_in_memory().expect("open");
        let elsewhere = Scope::new("libera", "#dogs");
        store.upsert_affection(&scope().key("a"), 100).expect("a");
        store.upsert_affection(&scope().key("b"), 99).expect("b");
        store.upsert_affection(&elsewhere.key("c"), 100).expect("c");

        assert_eq!(store.list_in_scope(&scope()).expect("list").len(), 2);
        let bonded = store.list_at_or_above(&scope(), 100).expect("list");
        assert_eq!(bonded.len(), 1);
        assert_eq!(bonded[0].key.name, "a");
    }

    #[test]
    fn on_disk_database_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("purrito.db");
        let key = scope().key("dave");
        {
            let store = SqliteStore::open(&path, &PersistenceConfig::default()).expect("open");
            store.upsert_affection(&key, 64).expect("write");
            store.set_decay_at(&key, at(3)).expect("decay");
        }
        let store = SqliteStore::open(&path, &PersistenceConfig::default()).expect("reopen");
        let record = store.get(&key).expect("get").expect("row");
        assert_eq!(record.affection, 64);
        assert_eq!(record.last_decay_at, Some(at(3)));
    }

    #[test]
    fn corrupt_timestamp_is_reported() {
        let store = SqliteStore::open_in_memory().expect("open");
        let key = scope().key("eve");
        store.set_column(&key, "last_decay_at", &"yesterday-ish").expect("write");
        let err = store.get(&key).expect_err("bad timestamp");
        assert!(matches!(err, PurritoError::InvalidTimestamp { .. }));
    }
}
