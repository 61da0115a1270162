//! Flavor text.
//!
//! Templates use `{placeholder}` slots filled by [`fill`]:
//! `{pet}` display name, `{name}` command name, `{player}`, `{target}`,
//! `{action}`, `{verb}`, `{food}`, `{emote}`, `{love}`, `{mood}`, `{bar}`,
//! `{wait}`.

use crate::dice::Dice;

/// Idle emotes, shown on spawn and as standalone idle lines.
pub const EMOTES: &[&str] = &[
    "meows happily (=^･^=)",
    "rubs against your leg (=^-ω-^=)",
    "purrs warmly (^^=^^)",
    "nuzzles gently (=^･o･^=)ﾉ",
    "flicks its tail playfully (=^･ｪ･^=)",
    "stretches and yawns (=^･ω･^=)ﾉﾞ",
    "rolls over for belly rubs (≧◡≦)ﾉ",
    "gives a soft chirp (=^･ｪ･^=)っ",
    "blinks slowly (=^-ᆺ-^=)",
    "curls up beside you (｡♥‿♥｡)",
    "gives a gentle headbutt (=^･ω･^)つ",
    "chases a sunbeam (^ↀᴥↀ^)",
    "pounces playfully (=^･ω･^=)つ",
    "gives a soft trill (=^-ω-^=)",
];

/// Moods shown when a pet / love is refused.
pub const REJECTS: &[&str] = &[
    "hisses and moves away (╬ Ò﹏Ó)",
    "growls softly, not in the mood (≖︿≖ )",
    "turns its back (￣︿￣)",
    "gives a disdainful look (¬_¬ )",
    "flicks its tail in annoyance (ಠ_ಠ)",
    "stiffens and walks away ( =①ω①=)",
    "swats the air and moves away (╬ΦᆺΦ)",
    "ignores you completely (－‸ლ)",
];

/// Things a player may feed the pet.
pub const FOODS: &[&str] = &[
    "salmon", "tuna", "sardines", "chicken", "kibble", "milk", "fish snacks", "cream",
    "shrimp", "turkey", "cat treats",
];

/// Accepted pet / love.
pub const PET_ACCEPT: &[&str] =
    &["{pet} {emote} at {player} and your love meter is now {love}% and {pet} is now {mood} {bar}"];

/// Refused pet / love.
pub const PET_REJECT: &[&str] =
    &["{pet} {emote} at {player} and your love meter is now {love}% and {pet} is now {mood} {bar}"];

/// Accepted feed.
pub const FEED_ACCEPT: &[&str] = &[
    "😺 {pet} happily munches the {food} you gave, {player}! Your love meter is now {love}% and {pet} is now {mood} {bar}",
    "😻 {pet} devours the {food} and purrs loudly at {player}. Your love meter is now {love}% and {pet} is now {mood} {bar}",
    "😸 {pet} licks its lips after eating the {food} from {player}! Your love meter is now {love}% and {pet} is now {mood} {bar}",
];

/// Refused feed.
pub const FEED_REJECT: &[&str] = &[
    "😼 {pet} sniffs the {food} from {player} and turns away... your love meter is now {love}% and {pet} is now {mood} {bar}",
    "😾 {pet} refuses the {food}. {player}, this is a picky cat. Your love meter is now {love}% and {pet} is now {mood} {bar}",
    "🙀 {pet} looks offended by the {food} from {player}. Your love meter is now {love}% and {pet} is now {mood} {bar}",
];

/// Accepted laser play.
pub const LASER_ACCEPT: &[&str] = &[
    "🔦⚡️ The laser flickers! {pet} darts after it, paws flying everywhere! Your love meter is now {love}% and {pet} is now {mood} {bar}",
    "🔦⚡️ {pet} spots the laser and wiggles... then pounces! Your love meter is now {love}% and {pet} is now {mood} {bar}",
    "🔦⚡️ {pet} dives at the laser, misses, then looks proud anyway. Your love meter is now {love}% and {pet} is now {mood} {bar}",
];

/// Refused laser play.
pub const LASER_REJECT: &[&str] = &[
    "🔦😾 {pet} narrows its eyes... not impressed by the laser right now. Your love meter is now {love}% and {pet} is now {mood} {bar}",
    "🔦🙄 {pet} ignores the dot and grooms a paw instead. Your love meter is now {love}% and {pet} is now {mood} {bar}",
    "🔦😿 {pet} flops down... too tired to chase today. Your love meter is now {love}% and {pet} is now {mood} {bar}",
];

/// Catnip that went well.
pub const CATNIP_GOOD: &[&str] = &[
    "🌿😺 {pet} sniffs the catnip and flops over, rolling around happily at {player}... your love meter is now {love}% and {pet} is now {mood} {bar}",
    "🌿😻 {pet} licks the catnip and goes into hyper-purr mode around {player}... your love meter is now {love}% and {pet} is now {mood} {bar}",
    "🌿🐾 {pet} cuddles into the catnip near {player} and purrs loudly... your love meter is now {love}% and {pet} is now {mood} {bar}",
];

/// Catnip that went badly.
pub const CATNIP_BAD: &[&str] = &[
    "🌿🙀 {pet} gets overwhelmed by the catnip from {player} and needs space. your love meter decreased to {love}% and {pet} is now {mood} {bar}",
    "🌿😾 {pet} sneezes and backs away from {player}'s catnip... too strong! your love meter decreased to {love}% and {pet} is now {mood} {bar}",
    "🌿😿 {pet} looks displeased with the catnip from {player} and walks off... your love meter decreased to {love}% and {pet} is now {mood} {bar}",
];

/// First slap / kick from a player.
pub const SLAP_WARNING: &[&str] = &[
    "😾 {pet} flattens its ears at {player}... This is your warning... do not do that again...",
    "⚠️ {pet} stares at {player} with shocked eyes... that was not nice...",
    "😿 {pet} backs away from {player}... please be gentle",
    "⚠️ {pet} watches {player} carefully... one more and it will be upset",
];

/// Every later slap / kick.
pub const SLAP_PUNISH: &[&str] = &[
    "😾 {pet} swats back at {player} and looks hurt. your love meter decreased to {love}% and {pet} is now {mood} {bar}",
    "😿 {pet} lowers its ears... {player} made it sad. your love meter decreased to {love}% and {pet} is now {mood} {bar}",
    "😿 {pet} looks betrayed by {player}. your love meter decreased to {love}% and {pet} is now {mood} {bar}",
];

/// Retaliation when someone slaps a target other than the pet.
pub const MISUSE_SLAP: &[&str] = &[
    "😾 scratches {player}'s face... Why did you slap {target}?",
    "😼 hisses and swats {player}... Don't slap {target}",
    "😿 bites {player} lightly... Why would you slap {target}?",
];

/// Retaliation when someone kicks a target other than the pet.
pub const MISUSE_KICK: &[&str] = &[
    "😾 lunges at {player}... Don't kick {target}!",
    "🐾 scratches {player}'s leg... Kicking {target} is not okay :(",
    "😼 hisses at {player}... Why would you kick {target}?",
];

/// Laser pointed at the wrong target.
pub const MISUSE_LASER: &[&str] = &[
    "😼 Why are you using the laser on {target}? ... you have to -> !laser {name}",
    "🐾 Wrong target, {player}... You have to -> !laser {name}",
    "😿 You seem confused... You have to -> !laser {name}",
];

/// Any other action pointed at the wrong target.
pub const MISUSE_GENERIC: &[&str] = &[
    "😼 {target} blinks at you... You are {verb} {target}, but {target} is not me.",
    "🐾 {target} tilts its head in confusion... Why are you {verb} {target}?",
    "😿 {target} looks awkward... I think you meant to do that to {pet}.",
];

/// Leave lines for a window that expired with no interaction.
pub const WANDERED_OFF: &[&str] = &[
    "(=^‥^=)っ ...looks around... no one came. {pet} quietly walks away...",
    "(=^‥^=)っ ...stretches, yawns, and wanders off...",
    "(=^‥^=)っ ...blinks slowly... then disappears into the night...",
    "(=^‥^=)っ ...waits patiently... then gives up and leaves...",
    "(=^‥^=)っ ...hops onto a fence and vanishes...",
];

/// Pet is absent.
pub const NOT_HERE: &str = "🐾 {pet} is not here right now... back in {wait}...";

/// Pet is absent and no return is scheduled.
pub const NOT_HERE_UNSCHEDULED: &str = "🐾 {pet} is not here right now...";

/// The store could not take an affection update.
pub const DISTRACTED: &str =
    "😿 {pet} got distracted by something shiny... try again in a moment 🐾";

/// Catnip still cooling down.
pub const CATNIP_COOLDOWN: &str =
    "aww {player}, you already used catnip today. Try again in {wait}";

/// Unknown action.
pub const CONFUSED: &str = "{pet} tilts its head, don't know what you mean 🐾";

/// First decay of a perfect bond.
pub const PERFECT_BOND_FADING: &str =
    "😿 {pet} is waiting but {player} did not come today, the perfect bond has begun to fade ({from}% → {love}%) 🐾";

/// Pick one entry of a non-empty pool.
pub fn pick<'a>(dice: &mut dyn Dice, pool: &[&'a str]) -> &'a str {
    pool.get(dice.index(pool.len())).copied().unwrap_or_default()
}

/// Replace every `{key}` in `template` with its value in one pass.
///
/// Substituted values are never rescanned, so a nick such as `{love}` is
/// printed as-is. Unknown keys are left in place.
#[must_use]
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[open..=open + 1 + close]),
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Capitalised display form of the pet's configured name.
#[must_use]
pub fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Gerund used in generic misuse lines.
#[must_use]
pub fn misuse_verb(action: &str) -> String {
    match action {
        "pet" => "petting".to_string(),
        "love" => "loving".to_string(),
        "feed" => "feeding".to_string(),
        "laser" => "using the laser on".to_string(),
        "catnip" => "giving catnip to".to_string(),
        "" => "poking".to_string(),
        other => format!("{other}ing"),
    }
}

/// Retaliation or hint for an action aimed at someone other than the pet.
pub fn misuse_line(
    dice: &mut dyn Dice,
    pet: &str,
    name: &str,
    action: &str,
    player: &str,
    target: &str,
) -> String {
    let target = display_name(target);
    let pool = match action {
        "slap" => MISUSE_SLAP,
        "kick" => MISUSE_KICK,
        "laser" => MISUSE_LASER,
        _ => MISUSE_GENERIC,
    };
    let verb = misuse_verb(action);
    fill(
        pick(dice, pool),
        &[
            ("pet", pet),
            ("name", name),
            ("player", player),
            ("target", &target),
            ("verb", &verb),
        ],
    )
}
