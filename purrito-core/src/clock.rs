//! Time sources and calendar-day projection.
//!
//! The engine compares instants by calendar day in two different zones:
//!
//! - the **server-local** zone, for daily decay ("did they show up today?")
//! - a fixed **reference** zone, for bond streaks, so every player shares the
//!   same midnight regardless of where the server runs
//!
//! [`TimeSource`] bundles a clock and a zone for each, and every piece can be
//! swapped independently in tests.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use tracing::warn;

use crate::error::{PurritoError, Result};

/// A source of "now".
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used by tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Start the clock at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }

    /// Move forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

// ---------------------------------------------------------------------------
// Day zones
// ---------------------------------------------------------------------------

/// The zone used to project an instant onto a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayZone {
    /// Whatever the host system reports as local time.
    Local,
    /// A named IANA zone (DST-aware).
    Named(Tz),
    /// A fixed UTC offset.
    Fixed(FixedOffset),
}

impl DayZone {
    /// Resolve an IANA zone name.
    ///
    /// When the name is unknown and `allow_local_fallback` is set, the
    /// server-local zone is used instead and the substitution is logged at
    /// warn level, since it moves every player's day boundary.
    ///
    /// # Errors
    /// Returns [`PurritoError::Config`] for an unknown zone without fallback.
    pub fn resolve(name: &str, allow_local_fallback: bool) -> Result<Self> {
        match name.parse::<Tz>() {
            Ok(tz) => Ok(Self::Named(tz)),
            Err(_) if allow_local_fallback => {
                warn!(
                    zone = %name,
                    "Unknown reference timezone, falling back to server-local days"
                );
                Ok(Self::Local)
            }
            Err(_) => Err(PurritoError::Config(format!(
                "unknown reference timezone '{name}'"
            ))),
        }
    }

    /// Calendar date of `instant` in this zone.
    #[must_use]
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => instant.with_timezone(&Local).date_naive(),
            Self::Named(tz) => instant.with_timezone(tz).date_naive(),
            Self::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }

    /// Whether two instants fall on the same calendar day in this zone.
    #[must_use]
    pub fn same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.date_of(a) == self.date_of(b)
    }

    /// Whether `earlier` falls on the calendar day immediately before `now`.
    #[must_use]
    pub fn is_previous_day(&self, earlier: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.date_of(now).pred_opt() == Some(self.date_of(earlier))
    }
}

// ---------------------------------------------------------------------------
// TimeSource
// ---------------------------------------------------------------------------

/// Clocks and day zones the engine reads time from.
#[derive(Clone)]
pub struct TimeSource {
    server_clock: Arc<dyn Clock>,
    reference_clock: Arc<dyn Clock>,
    /// Zone for server-local calendar days (decay).
    pub local_zone: DayZone,
    /// Zone for reference calendar days (bond streaks).
    pub reference_zone: DayZone,
}

impl std::fmt::Debug for TimeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeSource")
            .field("local_zone", &self.local_zone)
            .field("reference_zone", &self.reference_zone)
            .finish_non_exhaustive()
    }
}

impl TimeSource {
    /// One clock shared by both views of time.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, local_zone: DayZone, reference_zone: DayZone) -> Self {
        Self {
            server_clock: Arc::clone(&clock),
            reference_clock: clock,
            local_zone,
            reference_zone,
        }
    }

    /// Wall clock, host-local days, and the given reference zone.
    #[must_use]
    pub fn system(reference_zone: DayZone) -> Self {
        Self::new(Arc::new(SystemClock), DayZone::Local, reference_zone)
    }

    /// Replace the clock used for reference-day decisions.
    #[must_use]
    pub fn with_reference_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.reference_clock = clock;
        self
    }

    /// Server "now": presence, cooldowns, decay.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.server_clock.now()
    }

    /// Reference "now": bond streak bookkeeping.
    #[must_use]
    pub fn reference_now(&self) -> DateTime<Utc> {
        self.reference_clock.now()
    }
}

/// Seconds to a [`TimeDelta`], saturating instead of panicking.
#[must_use]
pub fn secs(seconds: u64) -> TimeDelta {
    i64::try_from(seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

/// `at + delta`, pinned to the latest representable instant on overflow.
#[must_use]
pub fn add_saturating(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Render a wait as `42s`, `3m 12s` or `5h 7m`.
#[must_use]
pub fn format_wait(delta: TimeDelta) -> String {
    let total = delta.num_seconds().max(0);
    if total < 60 {
        return format!("{total}s");
    }
    let (minutes, seconds) = (total / 60, total % 60);
    if minutes < 60 {
        return format!("{minutes}m {seconds}s");
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}
