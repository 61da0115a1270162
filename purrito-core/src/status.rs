//! Read-only views: per-player status and the scope leaderboard.

use std::cmp::Reverse;
use std::fmt;

use serde::Serialize;

use crate::affection::{render_bar, Mood};
use crate::clock::format_wait;
use crate::gifts::{gift_names, join_gifts, title_for_highest_streak};
use crate::types::PlayerRecord;

/// Default number of leaderboard rows.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 5;
/// Largest leaderboard a caller may request.
pub const MAX_LEADERBOARD_LIMIT: usize = 20;

/// Where the pet is right now, from one player's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PresenceView {
    /// Present; leaves after `leaves_in_secs`.
    Here {
        /// Seconds until the window closes.
        leaves_in_secs: i64,
    },
    /// Absent; back after `back_in_secs`, `None` when nothing is scheduled.
    Away {
        /// Seconds until the next appearance.
        back_in_secs: Option<i64>,
    },
}

/// Whether today's bond reward can still be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BondToday {
    /// Affection below 100%.
    Locked,
    /// Bonded and not yet claimed today.
    Ready,
    /// Already claimed this reference day.
    AlreadyAwarded,
}

/// Bond progression part of a status view; absent for unknown players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BondView {
    /// Highest streak ever.
    pub highest_streak: u32,
    /// Title for that streak.
    pub title: &'static str,
    /// Lifetime points.
    pub points: u32,
    /// Current streak.
    pub streak: u32,
    /// Today's claim state.
    pub today: BondToday,
    /// Unlocked gift names.
    pub gifts: Vec<&'static str>,
}

impl BondView {
    /// Build from a stored record.
    #[must_use]
    pub fn from_record(record: &PlayerRecord, claimed_today: bool) -> Self {
        let today = if !record.is_bonded() {
            BondToday::Locked
        } else if claimed_today {
            BondToday::AlreadyAwarded
        } else {
            BondToday::Ready
        };
        Self {
            highest_streak: record.highest_bond_streak,
            title: title_for_highest_streak(record.highest_bond_streak),
            points: record.bond_points,
            streak: record.bond_streak,
            today,
            gifts: gift_names(record.gifts_unlocked),
        }
    }
}

/// Everything `status` reports about one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    /// Pet display name.
    pub pet: String,
    /// Player as asked about.
    pub player: String,
    /// Affection, `0..=100`.
    pub affection: u8,
    /// Mood label.
    pub mood: &'static str,
    /// Love bar.
    pub bar: String,
    /// Pet presence.
    pub presence: PresenceView,
    /// Seconds of catnip cooldown left; 0 when ready.
    pub catnip_remaining_secs: i64,
    /// Bond progression, `None` when the player has no record.
    pub bond: Option<BondView>,
}

impl StatusView {
    /// Assemble a view from the player's affection and optional record.
    #[must_use]
    pub fn new(
        pet: &str,
        player: &str,
        affection: u8,
        presence: PresenceView,
        catnip_remaining_secs: i64,
        bond: Option<BondView>,
    ) -> Self {
        Self {
            pet: pet.to_string(),
            player: player.to_string(),
            affection,
            mood: Mood::from_affection(affection).label(),
            bar: render_bar(affection),
            presence,
            catnip_remaining_secs,
            bond,
        }
    }

    fn lines(&self) -> Vec<String> {
        let presence = match self.presence {
            PresenceView::Here { leaves_in_secs } => format!(
                "🐾 Presence: HERE (leaves in {})",
                format_wait(chrono::TimeDelta::seconds(leaves_in_secs))
            ),
            PresenceView::Away {
                back_in_secs: Some(back_in_secs),
            } => format!(
                "🐾 Presence: AWAY (back in {})",
                format_wait(chrono::TimeDelta::seconds(back_in_secs))
            ),
            PresenceView::Away { back_in_secs: None } => "🐾 Presence: AWAY".to_string(),
        };
        let catnip = if self.catnip_remaining_secs > 0 {
            format!(
                "🌿 Catnip: USED ({} left)",
                format_wait(chrono::TimeDelta::seconds(self.catnip_remaining_secs))
            )
        } else {
            "🌿 Catnip: READY".to_string()
        };

        let mut lines = vec![
            format!("😺 {} Status for: {}", self.pet, self.player),
            format!(
                "Love meter: {}%  Mood: {} {}",
                self.affection, self.mood, self.bar
            ),
            presence,
            catnip,
        ];

        if let Some(bond) = &self.bond {
            let today = match bond.today {
                BondToday::Locked => "LOCKED (need 100% love)",
                BondToday::Ready => "READY",
                BondToday::AlreadyAwarded => "ALREADY AWARDED TODAY",
            };
            lines.push(format!(
                "Highest streak: {} | Title: {}",
                bond.highest_streak, bond.title
            ));
            lines.push(format!(
                "BondPoints: {} | Streak: {}",
                bond.points, bond.streak
            ));
            lines.push(format!("BondPoints Today: {today}"));
            lines.push(format!("Gifts: {}", join_gifts(&bond.gifts)));
        }
        lines
    }
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join(" | "))
    }
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// Clamp a requested leaderboard size into `1..=20`.
#[must_use]
pub fn clamp_leaderboard_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LEADERBOARD_LIMIT)
}

/// Top `limit` records: affection descending, then bond points descending,
/// then name ascending.
#[must_use]
pub fn rank_players(mut records: Vec<PlayerRecord>, limit: usize) -> Vec<PlayerRecord> {
    records.sort_by(|a, b| {
        (Reverse(a.affection), Reverse(a.bond_points), &a.key.name).cmp(&(
            Reverse(b.affection),
            Reverse(b.bond_points),
            &b.key.name,
        ))
    });
    records.truncate(clamp_leaderboard_limit(limit));
    records
}

/// One-line leaderboard, or a hint when nobody has played yet.
#[must_use]
pub fn render_leaderboard(pet: &str, ranked: &[PlayerRecord]) -> String {
    if ranked.is_empty() {
        return format!("No love data yet. Try petting {pet} first! 😺");
    }
    let entries: Vec<String> = ranked
        .iter()
        .enumerate()
        .map(|(i, r)| format!("#{} {} (♥ {})", i + 1, r.key.name, r.affection))
        .collect();
    format!(
        "💖 Top Lovers (Top {}): {}",
        ranked.len(),
        entries.join("  •  ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GiftMask, Scope};

    fn record(name: &str, affection: u8, points: u32) -> PlayerRecord {
        let mut record = PlayerRecord::new(Scope::new("n", "#c").key(name));
        record.affection = affection;
        record.bond_points = points;
        record
    }

    #[test]
    fn unknown_player_status_has_four_lines() {
        let view = StatusView::new(
            "Purrito",
            "ann",
            0,
            PresenceView::Away { back_in_secs: None },
            0,
            None,
        );
        let text = view.to_string();
        assert_eq!(text.split(" | ").count(), 4);
        assert!(text.contains("Presence: AWAY |"));
        assert!(!text.contains("back in"));
        assert!(text.contains("Catnip: READY"));
    }

    #[test]
    fn bonded_status_shows_progression() {
        let mut rec = record("bob", 100, 40);
        rec.highest_bond_streak = 14;
        rec.bond_streak = 3;
        rec.gifts_unlocked = GiftMask(0b11);
        let view = StatusView::new(
            "Purrito",
            "bob",
            100,
            PresenceView::Here { leaves_in_secs: 75 },
            3_600,
            Some(BondView::from_record(&rec, false)),
        );
        let text = view.to_string();
        assert!(text.contains("HERE (leaves in 1m 15s)"));
        assert!(text.contains("Catnip: USED (1h 0m left)"));
        assert!(text.contains("Title: Warm Purr Companion 🐾"));
        assert!(text.contains("BondPoints Today: READY"));
        assert!(text.contains("Gifts: 🐹 Tiny Guinea Pig, 🐍 Cute Python"));
    }

    #[test]
    fn bond_today_states() {
        let below = record("c", 99, 0);
        assert_eq!(BondView::from_record(&below, false).today, BondToday::Locked);
        let bonded = record("c", 100, 0);
        assert_eq!(
            BondView::from_record(&bonded, true).today,
            BondToday::AlreadyAwarded
        );
    }

    #[test]
    fn leaderboard_order_and_format() {
        let ranked = rank_players(
            vec![
                record("zed", 90, 1),
                record("amy", 90, 1),
                record("bob", 90, 9),
                record("cat", 100, 0),
            ],
            3,
        );
        let names: Vec<_> = ranked.iter().map(|r| r.key.name.as_str()).collect();
        assert_eq!(names, ["cat", "bob", "amy"]);
        assert_eq!(
            render_leaderboard("Purrito", &ranked),
            "💖 Top Lovers (Top 3): #1 cat (♥ 100)  •  #2 bob (♥ 90)  •  #3 amy (♥ 90)"
        );
    }

    #[test]
    fn leaderboard_limits_and_empty_hint() {
        assert_eq!(clamp_leaderboard_limit(0), 1);
        assert_eq!(clamp_leaderboard_limit(500), 20);
        assert!(render_leaderboard("Purrito", &[]).starts_with("No love data yet"));
    }
}
