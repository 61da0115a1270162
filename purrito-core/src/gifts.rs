//! Gift catalog and bond titles.
//!
//! Pure lookups keyed on the highest bond streak a player has ever reached.
//! Crossing a gift threshold unlocks that gift exactly once; the caller ORs
//! the returned masks into the player's record.

use crate::types::GiftMask;

/// One unlockable gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gift {
    /// Highest-streak value that unlocks it.
    pub threshold: u32,
    /// Bit in the persisted mask.
    pub mask: GiftMask,
    /// Display name with emoji.
    pub name: &'static str,
}

/// Every gift, in ascending threshold order.
pub const GIFTS: [Gift; 6] = [
    Gift { threshold: 7, mask: GiftMask(1 << 0), name: "🐹 Tiny Guinea Pig" },
    Gift { threshold: 14, mask: GiftMask(1 << 1), name: "🐍 Cute Python" },
    Gift { threshold: 21, mask: GiftMask(1 << 2), name: "🦜 Noisy Parrot" },
    Gift { threshold: 30, mask: GiftMask(1 << 3), name: "🐠 Colorful Fish" },
    Gift { threshold: 45, mask: GiftMask(1 << 4), name: "🐱 Friendly Kitten" },
    Gift { threshold: 100, mask: GiftMask(1 << 5), name: "🎁 Secret Gift (Forever Human)" },
];

/// Titles by highest-streak threshold, ascending.
const TITLES: [(u32, &str); 6] = [
    (0, "Just Met Purrito 🐾"),
    (7, "Getting Purrito's Trust 🐱"),
    (14, "Warm Purr Companion 🐾"),
    (30, "Deeply Bonded Friend 😽"),
    (60, "Purrito's Trusted Companion 🐱"),
    (100, "Purrito's Forever Human 🐾❤️"),
];

/// A gift newly unlocked by a streak crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GiftUnlock {
    /// Bit to OR into the record.
    pub mask: GiftMask,
    /// Display name.
    pub name: &'static str,
}

/// Title earned by a highest streak of `highest`.
#[must_use]
pub fn title_for_highest_streak(highest: u32) -> &'static str {
    TITLES
        .iter()
        .rev()
        .find(|(threshold, _)| highest >= *threshold)
        .map_or(TITLES[0].1, |(_, title)| title)
}

/// Gifts whose threshold lies in `(old_highest, new_highest]`.
#[must_use]
pub fn gift_unlocks(old_highest: u32, new_highest: u32) -> Vec<GiftUnlock> {
    GIFTS
        .iter()
        .filter(|g| old_highest < g.threshold && g.threshold <= new_highest)
        .map(|g| GiftUnlock {
            mask: g.mask,
            name: g.name,
        })
        .collect()
}

/// Combined mask of a set of unlocks.
#[must_use]
pub fn combined_mask(unlocks: &[GiftUnlock]) -> GiftMask {
    unlocks
        .iter()
        .fold(GiftMask::EMPTY, |acc, unlock| acc | unlock.mask)
}

/// Display names of every gift in `mask`, in catalog order.
#[must_use]
pub fn gift_names(mask: GiftMask) -> Vec<&'static str> {
    GIFTS
        .iter()
        .filter(|g| mask.contains(g.mask))
        .map(|g| g.name)
        .collect()
}

/// Comma-join gift names, or `None` when there are none.
#[must_use]
pub fn join_gifts(names: &[&str]) -> String {
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_by_threshold() {
        assert_eq!(title_for_highest_streak(0), "Just Met Purrito 🐾");
        assert_eq!(title_for_highest_streak(6), "Just Met Purrito 🐾");
        assert_eq!(title_for_highest_streak(7), "Getting Purrito's Trust 🐱");
        assert_eq!(title_for_highest_streak(29), "Warm Purr Companion 🐾");
        assert_eq!(title_for_highest_streak(30), "Deeply Bonded Friend 😽");
        assert_eq!(title_for_highest_streak(99), "Purrito's Trusted Companion 🐱");
        assert_eq!(title_for_highest_streak(500), "Purrito's Forever Human 🐾❤️");
    }

    #[test]
    fn unlocks_are_exact_on_crossing() {
        let unlocks = gift_unlocks(6, 7);
        assert_eq!(unlocks.len(), 1);
        assert_eq!(unlocks[0].name, "🐹 Tiny Guinea Pig");

        assert!(gift_unlocks(7, 7).is_empty());
        assert!(gift_unlocks(7, 13).is_empty());
        assert!(gift_unlocks(45, 99).is_empty());
    }

    #[test]
    fn one_jump_can_cross_several_thresholds() {
        let unlocks = gift_unlocks(0, 30);
        let names: Vec<_> = unlocks.iter().map(|u| u.name).collect();
        assert_eq!(
            names,
            ["🐹 Tiny Guinea Pig", "🐍 Cute Python", "🦜 Noisy Parrot", "🐠 Colorful Fish"]
        );
        assert_eq!(combined_mask(&unlocks), GiftMask(0b1111));
    }

    #[test]
    fn secret_gift_at_one_hundred() {
        let unlocks = gift_unlocks(99, 100);
        assert_eq!(unlocks.len(), 1);
        assert_eq!(unlocks[0].mask, GiftMask(1 << 5));
    }

    #[test]
    fn names_follow_catalog_order() {
        let names = gift_names(GiftMask((1 << 4) | (1 << 0)));
        assert_eq!(names, ["🐹 Tiny Guinea Pig", "🐱 Friendly Kitten"]);
        assert_eq!(join_gifts(&names), "🐹 Tiny Guinea Pig, 🐱 Friendly Kitten");
        assert_eq!(join_gifts(&gift_names(GiftMask::EMPTY)), "None");
    }
}
