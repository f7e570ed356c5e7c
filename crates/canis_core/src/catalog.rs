//! The static behavior catalog.
//!
//! Every behavior the agent can invoke is declared here with its own name
//! key, a display label, a default duration in seconds, and its effect. The
//! name key is what the asset collaborator receives when the behavior starts.

use crate::state::{Attribute, AttributeDelta, BehaviorKind};
use serde::Serialize;

use Attribute::{Boredom, Fatigue, Happiness};

/// Grouping used in prompts and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Physiological,
    Social,
    Exploration,
    Emotional,
    Training,
    Special,
    Control,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Physiological => "physiological",
            Category::Social => "social",
            Category::Exploration => "exploration",
            Category::Emotional => "emotional",
            Category::Training => "training",
            Category::Special => "special",
            Category::Control => "control",
        }
    }
}

/// What invoking a behavior does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorEffect {
    /// Apply fixed deltas once; may be empty.
    Instant(&'static [AttributeDelta]),
    /// Occupy the behavior slot.
    LongTerm(BehaviorKind),
    /// Stop whatever long-term behavior is running.
    Interrupt,
}

/// A single catalog entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorSpec {
    /// Tool name and asset key.
    pub name: &'static str,
    /// Short display label, e.g. "drinking water".
    pub label: &'static str,
    /// One-line description for the agent.
    pub summary: &'static str,
    /// Text logged when the behavior actually executes.
    pub flavor: &'static str,
    pub category: Category,
    pub default_secs: u32,
    /// Suggested duration range in seconds (advisory).
    pub range_secs: (u32, u32),
    pub effect: BehaviorEffect,
}

impl BehaviorSpec {
    pub fn is_long_term(&self) -> bool {
        matches!(self.effect, BehaviorEffect::LongTerm(_))
    }

    pub fn deltas(&self) -> &'static [AttributeDelta] {
        match self.effect {
            BehaviorEffect::Instant(d) => d,
            _ => &[],
        }
    }
}

macro_rules! d {
    ($attribute:ident, $amount:expr) => {
        AttributeDelta {
            attribute: $attribute,
            amount: $amount,
        }
    };
}

macro_rules! instant {
    (
        $name:literal,
        $label:literal,
        $summary:literal,
        $flavor:literal,
        $cat:ident,
        $secs:literal,
        ($lo:literal, $hi:literal),
        [$($delta:expr),* $(,)?]
    ) => {
        BehaviorSpec {
            name: $name,
            label: $label,
            summary: $summary,
            flavor: $flavor,
            category: Category::$cat,
            default_secs: $secs,
            range_secs: ($lo, $hi),
            effect: BehaviorEffect::Instant(&[$($delta),*]),
        }
    };
}

macro_rules! long_term {
    (
        $name:literal,
        $label:literal,
        $summary:literal,
        $flavor:literal,
        $kind:ident,
        $secs:literal,
        ($lo:literal, $hi:literal)
    ) => {
        BehaviorSpec {
            name: $name,
            label: $label,
            summary: $summary,
            flavor: $flavor,
            category: Category::Physiological,
            default_secs: $secs,
            range_secs: ($lo, $hi),
            effect: BehaviorEffect::LongTerm(BehaviorKind::$kind),
        }
    };
}

/// Name of the control behavior that interrupts the slot.
pub const INTERRUPT: &str = "interrupt_current_behavior";

pub static CATALOG: &[BehaviorSpec] = &[
    // Physiological
    instant!(
        "stretch",
        "stretching",
        "Dog stretches its body",
        "stretches the front legs forward... feels much better!",
        Physiological,
        5,
        (3, 10),
        [d!(Fatigue, -3.0), d!(Happiness, 2.0)]
    ),
    instant!(
        "yawn",
        "yawning",
        "Dog yawns",
        "opens wide... yaaawn~",
        Physiological,
        3,
        (2, 5),
        [d!(Fatigue, -2.0)]
    ),
    long_term!(
        "drink_water",
        "drinking water",
        "Dog drinks water (long-term behavior). Very thirsty (>80): 600s, thirsty (>50): 480s, slightly thirsty: 300s",
        "walks to the water bowl and starts drinking...",
        Drinking,
        480,
        (300, 600)
    ),
    long_term!(
        "eat_food",
        "eating",
        "Dog eats food (long-term behavior). Very hungry (>80): 900s, hungry (>50): 720s, slightly hungry: 420s",
        "walks to the food bowl and starts eating...",
        Eating,
        720,
        (300, 900)
    ),
    instant!(
        "lick_fur",
        "grooming fur",
        "Dog licks and grooms its fur",
        "licks a paw and grooms... staying clean!",
        Physiological,
        30,
        (10, 60),
        [d!(Happiness, 3.0), d!(Boredom, -2.0)]
    ),
    long_term!(
        "sleep",
        "sleeping",
        "Dog sleeps (long-term behavior). Exhausted (>80): 10800-14400s, tired (>50): 7200s, slightly tired: 1800-3600s, just resting: 900-1800s",
        "curls up... closes its eyes... zzz...",
        Sleeping,
        7200,
        (1800, 14400)
    ),
    // Social
    instant!(
        "wag_tail",
        "wagging tail",
        "Dog wags its tail happily",
        "tail wagging wildly! so happy!",
        Social,
        5,
        (2, 10),
        [d!(Happiness, 5.0)]
    ),
    instant!(
        "nuzzle_owner",
        "nuzzling owner",
        "Dog nuzzles against the owner",
        "rubs its head against the owner's leg... asking for attention!",
        Social,
        10,
        (5, 20),
        [d!(Happiness, 8.0), d!(Boredom, -5.0)]
    ),
    instant!(
        "lick_hand",
        "licking hand",
        "Dog licks the owner's hand",
        "licks the owner's hand affectionately!",
        Social,
        8,
        (3, 15),
        [d!(Happiness, 7.0), d!(Boredom, -3.0)]
    ),
    instant!(
        "follow_owner",
        "following owner",
        "Dog follows the owner around",
        "follows the owner closely... staying by their side!",
        Social,
        15,
        (5, 30),
        [d!(Happiness, 5.0), d!(Boredom, -5.0)]
    ),
    instant!(
        "look_up_at_owner",
        "looking up at owner",
        "Dog looks up at the owner",
        "looks up with big eyes... waiting for attention!",
        Social,
        3,
        (2, 10),
        [d!(Happiness, 3.0)]
    ),
    // Exploration
    instant!(
        "sniff_ground",
        "sniffing the ground",
        "Dog sniffs the ground",
        "nose to the floor... sniffing around... investigating!",
        Exploration,
        10,
        (5, 30),
        [d!(Boredom, -8.0), d!(Fatigue, 2.0)]
    ),
    instant!(
        "walk_in_circles",
        "walking in circles",
        "Dog walks in circles",
        "walks in circles... exploring the space!",
        Exploration,
        20,
        (10, 60),
        [d!(Boredom, -5.0), d!(Fatigue, 3.0)]
    ),
    instant!(
        "paw_at_object",
        "pawing at something",
        "Dog paws at objects",
        "paws at something interesting... investigating!",
        Exploration,
        15,
        (5, 30),
        [d!(Boredom, -10.0), d!(Happiness, 5.0)]
    ),
    instant!(
        "look_out_window",
        "looking out the window",
        "Dog looks out the window",
        "gazes out the window... watching the world outside!",
        Exploration,
        60,
        (30, 300),
        [d!(Boredom, -12.0), d!(Happiness, 5.0)]
    ),
    instant!(
        "chase_light",
        "chasing a light spot",
        "Dog chases light reflections",
        "chases the light spot! running around excitedly!",
        Exploration,
        45,
        (20, 120),
        [d!(Boredom, -15.0), d!(Fatigue, 8.0), d!(Happiness, 10.0)]
    ),
    // Emotional
    instant!(
        "bark",
        "barking",
        "Dog barks",
        "woof! woof!",
        Emotional,
        5,
        (2, 15),
        [d!(Boredom, -5.0)]
    ),
    instant!(
        "growl",
        "growling",
        "Dog growls softly",
        "grrr... (low growl)",
        Emotional,
        8,
        (3, 20),
        [d!(Happiness, -5.0)]
    ),
    instant!(
        "pin_ears_back",
        "pinning ears back",
        "Dog pins its ears back (nervous or submissive)",
        "ears flatten back... feeling uneasy",
        Emotional,
        5,
        (2, 15),
        [d!(Happiness, -3.0)]
    ),
    instant!(
        "tuck_tail",
        "tucking tail",
        "Dog tucks its tail between its legs (scared or submissive)",
        "tail tucked between the legs... scared or submissive",
        Emotional,
        10,
        (5, 30),
        [d!(Happiness, -5.0)]
    ),
    instant!(
        "jump_excitedly",
        "jumping",
        "Dog jumps up and down excitedly",
        "jumping up and down! so excited!",
        Emotional,
        15,
        (5, 30),
        [d!(Happiness, 8.0), d!(Boredom, -10.0), d!(Fatigue, 5.0)]
    ),
    // Training
    instant!(
        "sit",
        "sitting",
        "Dog sits down",
        "sits down nicely... tail wagging!",
        Training,
        30,
        (10, 120),
        [d!(Happiness, 5.0), d!(Fatigue, -3.0)]
    ),
    instant!(
        "lie_down",
        "lying down",
        "Dog lies down",
        "lies flat on the floor... resting!",
        Training,
        60,
        (30, 300),
        [d!(Fatigue, -5.0), d!(Happiness, 3.0)]
    ),
    instant!(
        "shake_paw",
        "shaking paw",
        "Dog offers its paw to shake",
        "raises a paw to shake... good dog trick!",
        Training,
        5,
        (3, 10),
        [d!(Happiness, 8.0), d!(Boredom, -5.0)]
    ),
    instant!(
        "roll_over",
        "rolling over",
        "Dog rolls over",
        "rolls over and shows its belly!",
        Training,
        8,
        (5, 15),
        [d!(Happiness, 10.0), d!(Boredom, -8.0), d!(Fatigue, 3.0)]
    ),
    instant!(
        "play_dead",
        "playing dead",
        "Dog plays dead",
        "drops dramatically... playing dead! (tongue out)",
        Training,
        10,
        (5, 30),
        [d!(Happiness, 7.0), d!(Boredom, -6.0)]
    ),
    instant!(
        "fetch_object",
        "fetching",
        "Dog fetches an object",
        "runs off and brings it back! perfect fetch!",
        Training,
        60,
        (30, 180),
        [d!(Happiness, 12.0), d!(Boredom, -15.0), d!(Fatigue, 10.0)]
    ),
    // Special
    instant!(
        "scratch_itch",
        "scratching an itch",
        "Dog scratches an itch",
        "scratches with a hind leg... ahh, much better!",
        Special,
        10,
        (5, 20),
        [d!(Happiness, 3.0)]
    ),
    instant!(
        "sneeze",
        "sneezing",
        "Dog sneezes",
        "achoo!",
        Special,
        2,
        (1, 3),
        []
    ),
    instant!(
        "shake_body",
        "shaking off",
        "Dog shakes its whole body",
        "shakes its whole body... fur flying everywhere!",
        Special,
        5,
        (3, 8),
        [d!(Happiness, 3.0)]
    ),
    instant!(
        "snore",
        "snoring",
        "Dog snores while sleeping",
        "hrr... hrr... (soft snoring)",
        Special,
        60,
        (30, 300),
        []
    ),
    instant!(
        "dream_twitch",
        "twitching in a dream",
        "Dog twitches while dreaming",
        "legs twitching... paws moving... (dreaming of running!)",
        Special,
        30,
        (10, 120),
        []
    ),
    // Control
    BehaviorSpec {
        name: INTERRUPT,
        label: "interrupting current behavior",
        summary:
            "Interrupt the dog's current long-term behavior (when the owner needs its attention)",
        flavor: "",
        category: Category::Control,
        default_secs: 0,
        range_secs: (0, 0),
        effect: BehaviorEffect::Interrupt,
    },
];

/// Look up a behavior by its name key.
pub fn lookup(name: &str) -> Option<&'static BehaviorSpec> {
    CATALOG.iter().find(|b| b.name == name)
}

/// Behaviors that occupy the slot.
pub fn long_term_behaviors() -> impl Iterator<Item = &'static BehaviorSpec> {
    CATALOG.iter().filter(|b| b.is_long_term())
}

/// Behaviors that apply their deltas once.
pub fn quick_behaviors() -> impl Iterator<Item = &'static BehaviorSpec> {
    CATALOG
        .iter()
        .filter(|b| matches!(b.effect, BehaviorEffect::Instant(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_size_and_unique_names() {
        assert_eq!(CATALOG.len(), 33);
        let names: HashSet<_> = CATALOG.iter().map(|b| b.name).collect();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn test_partitions() {
        assert_eq!(long_term_behaviors().count(), 3);
        assert_eq!(quick_behaviors().count(), 29);
    }

    #[test]
    fn test_long_term_mapping() {
        assert_eq!(
            lookup("drink_water").unwrap().effect,
            BehaviorEffect::LongTerm(BehaviorKind::Drinking)
        );
        assert_eq!(lookup("drink_water").unwrap().default_secs, 480);
        assert_eq!(lookup("eat_food").unwrap().default_secs, 720);
        assert_eq!(lookup("sleep").unwrap().default_secs, 7200);
        assert_eq!(lookup(INTERRUPT).unwrap().effect, BehaviorEffect::Interrupt);
    }

    enum Expected {
        Quick(u32, &'static [(Attribute, f64)]),
        Long(BehaviorKind, u32),
        Control,
    }

    use Attribute::Hunger;
    use Expected::{Control, Long, Quick};

    /// Every entry with its exact default and effect.
    const EXPECTED: &[(&str, Expected)] = &[
        ("stretch", Quick(5, &[(Fatigue, -3.0), (Happiness, 2.0)])),
        ("yawn", Quick(3, &[(Fatigue, -2.0)])),
        ("drink_water", Long(BehaviorKind::Drinking, 480)),
        ("eat_food", Long(BehaviorKind::Eating, 720)),
        ("lick_fur", Quick(30, &[(Happiness, 3.0), (Boredom, -2.0)])),
        ("sleep", Long(BehaviorKind::Sleeping, 7200)),
        ("wag_tail", Quick(5, &[(Happiness, 5.0)])),
        ("nuzzle_owner", Quick(10, &[(Happiness, 8.0), (Boredom, -5.0)])),
        ("lick_hand", Quick(8, &[(Happiness, 7.0), (Boredom, -3.0)])),
        ("follow_owner", Quick(15, &[(Happiness, 5.0), (Boredom, -5.0)])),
        ("look_up_at_owner", Quick(3, &[(Happiness, 3.0)])),
        ("sniff_ground", Quick(10, &[(Boredom, -8.0), (Fatigue, 2.0)])),
        ("walk_in_circles", Quick(20, &[(Boredom, -5.0), (Fatigue, 3.0)])),
        ("paw_at_object", Quick(15, &[(Boredom, -10.0), (Happiness, 5.0)])),
        ("look_out_window", Quick(60, &[(Boredom, -12.0), (Happiness, 5.0)])),
        (
            "chase_light",
            Quick(45, &[(Boredom, -15.0), (Fatigue, 8.0), (Happiness, 10.0)]),
        ),
        ("bark", Quick(5, &[(Boredom, -5.0)])),
        ("growl", Quick(8, &[(Happiness, -5.0)])),
        ("pin_ears_back", Quick(5, &[(Happiness, -3.0)])),
        ("tuck_tail", Quick(10, &[(Happiness, -5.0)])),
        (
            "jump_excitedly",
            Quick(15, &[(Happiness, 8.0), (Boredom, -10.0), (Fatigue, 5.0)]),
        ),
        ("sit", Quick(30, &[(Happiness, 5.0), (Fatigue, -3.0)])),
        ("lie_down", Quick(60, &[(Fatigue, -5.0), (Happiness, 3.0)])),
        ("shake_paw", Quick(5, &[(Happiness, 8.0), (Boredom, -5.0)])),
        (
            "roll_over",
            Quick(8, &[(Happiness, 10.0), (Boredom, -8.0), (Fatigue, 3.0)]),
        ),
        ("play_dead", Quick(10, &[(Happiness, 7.0), (Boredom, -6.0)])),
        (
            "fetch_object",
            Quick(60, &[(Happiness, 12.0), (Boredom, -15.0), (Fatigue, 10.0)]),
        ),
        ("scratch_itch", Quick(10, &[(Happiness, 3.0)])),
        ("sneeze", Quick(2, &[])),
        ("shake_body", Quick(5, &[(Happiness, 3.0)])),
        ("snore", Quick(60, &[])),
        ("dream_twitch", Quick(30, &[])),
        (INTERRUPT, Control),
    ];

    fn sorted(deltas: impl Iterator<Item = (Attribute, f64)>) -> Vec<(&'static str, f64)> {
        let mut out: Vec<_> = deltas.map(|(a, amount)| (a.as_str(), amount)).collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    #[test]
    fn test_every_entry_matches_table() {
        assert_eq!(EXPECTED.len(), CATALOG.len());
        for (spec, (name, expected)) in CATALOG.iter().zip(EXPECTED) {
            assert_eq!(spec.name, *name, "catalog order");
            match expected {
                Quick(secs, deltas) => {
                    assert!(
                        matches!(spec.effect, BehaviorEffect::Instant(_)),
                        "{name} should be quick"
                    );
                    assert_eq!(spec.default_secs, *secs, "{name} default");
                    assert_eq!(
                        sorted(spec.deltas().iter().map(|d| (d.attribute, d.amount))),
                        sorted(deltas.iter().copied()),
                        "{name} deltas"
                    );
                }
                Long(kind, secs) => {
                    assert_eq!(spec.effect, BehaviorEffect::LongTerm(*kind), "{name} kind");
                    assert_eq!(spec.default_secs, *secs, "{name} default");
                    assert!(spec.deltas().is_empty());
                }
                Control => assert_eq!(spec.effect, BehaviorEffect::Interrupt),
            }
        }
    }

    #[test]
    fn test_no_quick_behavior_touches_hunger() {
        assert!(quick_behaviors().all(|b| b.deltas().iter().all(|d| d.attribute != Hunger)));
    }

    #[test]
    fn test_unknown_behavior() {
        assert!(lookup("moonwalk").is_none());
    }
}
