//! The dog's internal state.
//!
//! Five need attributes live on a 0-100 scale and are clamped after every
//! mutation. At most one long-term behavior (sleeping, eating, drinking) is
//! active at a time; its bookkeeping is grouped in [`ActiveBehavior`] so that
//! the start time, duration and initial-value snapshot exist only while the
//! behavior does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of every attribute.
pub const ATTRIBUTE_MIN: f64 = 0.0;
/// Upper bound of every attribute.
pub const ATTRIBUTE_MAX: f64 = 100.0;

/// Guard against NaN and Infinity in attribute values.
/// If the value is NaN or Inf, replace with the provided fallback (the attribute default).
#[inline]
fn sanitize_f64(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in pet state, resetting to fallback {}", fallback);
        fallback
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// One of the five need attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Hunger,
    Thirst,
    Fatigue,
    Boredom,
    Happiness,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::Hunger,
        Attribute::Thirst,
        Attribute::Fatigue,
        Attribute::Boredom,
        Attribute::Happiness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Hunger => "hunger",
            Attribute::Thirst => "thirst",
            Attribute::Fatigue => "fatigue",
            Attribute::Boredom => "boredom",
            Attribute::Happiness => "happiness",
        }
    }

    /// Value a fresh dog starts with.
    pub fn default_value(&self) -> f64 {
        match self {
            Attribute::Hunger => 20.0,
            Attribute::Thirst => 20.0,
            Attribute::Fatigue => 20.0,
            Attribute::Boredom => 30.0,
            Attribute::Happiness => 70.0,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signed change applied to a single attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeDelta {
    pub attribute: Attribute,
    pub amount: f64,
}

impl AttributeDelta {
    pub const fn new(attribute: Attribute, amount: f64) -> Self {
        Self { attribute, amount }
    }
}

// =============================================================================
// Long-term behaviors
// =============================================================================

/// The long-running behaviors that occupy the behavior slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    Sleeping,
    Eating,
    Drinking,
}

impl BehaviorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorKind::Sleeping => "sleeping",
            BehaviorKind::Eating => "eating",
            BehaviorKind::Drinking => "drinking",
        }
    }

    /// The attribute this behavior drives to zero on completion.
    pub fn relieves(&self) -> Attribute {
        match self {
            BehaviorKind::Sleeping => Attribute::Fatigue,
            BehaviorKind::Eating => Attribute::Hunger,
            BehaviorKind::Drinking => Attribute::Thirst,
        }
    }

    /// Happiness bonus granted once when the behavior runs to completion.
    pub fn completion_bonus(&self) -> f64 {
        match self {
            BehaviorKind::Sleeping => 10.0,
            BehaviorKind::Eating => 15.0,
            BehaviorKind::Drinking => 10.0,
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping for the long-term behavior currently in the slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveBehavior {
    pub kind: BehaviorKind,
    pub started_at: DateTime<Utc>,
    /// Declared duration in virtual minutes (always > 0).
    pub duration_minutes: f64,
    pub description: String,
    /// Hunger at the moment eating started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_hunger: Option<f64>,
    /// Thirst at the moment drinking started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_thirst: Option<f64>,
}

/// Progress report for the active behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProgress {
    pub kind: BehaviorKind,
    pub description: String,
    pub elapsed_minutes: f64,
    pub remaining_minutes: f64,
    pub total_minutes: f64,
    pub percent: f64,
}

// =============================================================================
// PetState
// =============================================================================

/// Complete persisted state of the dog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetState {
    pub hunger: f64,
    pub thirst: f64,
    pub fatigue: f64,
    pub boredom: f64,
    pub happiness: f64,

    /// Anchor for decay integration.
    pub last_update: DateTime<Utc>,

    /// The long-term behavior in progress, if any.
    #[serde(default)]
    pub activity: Option<ActiveBehavior>,

    /// Set when a long-term behavior completes naturally; cleared by one read.
    #[serde(default)]
    pub just_completed: bool,
}

impl Default for PetState {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl PetState {
    /// A fresh dog anchored at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            hunger: Attribute::Hunger.default_value(),
            thirst: Attribute::Thirst.default_value(),
            fatigue: Attribute::Fatigue.default_value(),
            boredom: Attribute::Boredom.default_value(),
            happiness: Attribute::Happiness.default_value(),
            last_update: now,
            activity: None,
            just_completed: false,
        }
    }

    pub fn get(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Hunger => self.hunger,
            Attribute::Thirst => self.thirst,
            Attribute::Fatigue => self.fatigue,
            Attribute::Boredom => self.boredom,
            Attribute::Happiness => self.happiness,
        }
    }

    /// Set an attribute, clamping it into range.
    pub fn set(&mut self, attribute: Attribute, value: f64) {
        let value =
            sanitize_f64(value, attribute.default_value()).clamp(ATTRIBUTE_MIN, ATTRIBUTE_MAX);
        *self.slot_mut(attribute) = value;
    }

    /// Add a signed amount to an attribute, clamping the result.
    pub fn add(&mut self, attribute: Attribute, amount: f64) {
        self.set(attribute, self.get(attribute) + amount);
    }

    fn slot_mut(&mut self, attribute: Attribute) -> &mut f64 {
        match attribute {
            Attribute::Hunger => &mut self.hunger,
            Attribute::Thirst => &mut self.thirst,
            Attribute::Fatigue => &mut self.fatigue,
            Attribute::Boredom => &mut self.boredom,
            Attribute::Happiness => &mut self.happiness,
        }
    }

    /// Clamp all values to the valid range.
    pub fn normalize(&mut self) {
        for attribute in Attribute::ALL {
            self.set(attribute, self.get(attribute));
        }
        if let Some(activity) = &self.activity {
            if !(activity.duration_minutes.is_finite() && activity.duration_minutes > 0.0) {
                tracing::warn!(
                    "Dropping {} with invalid duration {}",
                    activity.kind,
                    activity.duration_minutes
                );
                self.activity = None;
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.activity.is_some()
    }

    pub fn current_kind(&self) -> Option<BehaviorKind> {
        self.activity.as_ref().map(|a| a.kind)
    }

    /// Readable status block for the terminal.
    pub fn status_text(&self) -> String {
        let warn = |v: f64, label: &str| {
            if v > 70.0 {
                format!(" ⚠️  ({label}!)")
            } else {
                String::new()
            }
        };
        let mood = if self.happiness > 70.0 {
            "😊"
        } else if self.happiness > 30.0 {
            "😐"
        } else {
            "😞"
        };
        format!(
            concat!(
                "🐕 Dog status:\n",
                "  hunger:    {:5.1}/100{}\n",
                "  thirst:    {:5.1}/100{}\n",
                "  fatigue:   {:5.1}/100{}\n",
                "  boredom:   {:5.1}/100{}\n",
                "  happiness: {:5.1}/100 {}",
            ),
            self.hunger,
            warn(self.hunger, "hungry"),
            self.thirst,
            warn(self.thirst, "thirsty"),
            self.fatigue,
            warn(self.fatigue, "tired"),
            self.boredom,
            warn(self.boredom, "bored"),
            self.happiness,
            mood,
        )
    }

    /// Natural-language needs summary, e.g. "very hungry, a bit bored".
    pub fn needs_summary(&self) -> String {
        let mut needs = Vec::new();

        if self.hunger > 70.0 {
            needs.push("very hungry");
        } else if self.hunger > 40.0 {
            needs.push("a bit hungry");
        }

        if self.thirst > 70.0 {
            needs.push("very thirsty");
        } else if self.thirst > 40.0 {
            needs.push("a bit thirsty");
        }

        if self.fatigue > 80.0 {
            needs.push("exhausted");
        } else if self.fatigue > 50.0 {
            needs.push("tired");
        }

        if self.boredom > 70.0 {
            needs.push("very bored");
        } else if self.boredom > 40.0 {
            needs.push("a bit bored");
        }

        if needs.is_empty() {
            "content".to_string()
        } else {
            needs.join(", ")
        }
    }

    /// Generate the state description injected into the agent prompt.
    ///
    /// `progress` is the report for the active behavior, when one is still
    /// running; the caller computes it against the current clock.
    pub fn describe_for_context(&self, progress: Option<&BehaviorProgress>) -> String {
        if let Some(p) = progress {
            return format!(
                "Current state: {}\n\
                 - elapsed: {:.1} minutes\n\
                 - remaining: {:.1} minutes\n\
                 - progress: {:.1}%\n\n\
                 Note: the dog is busy and cannot start another long behavior. \
                 Quick behaviors such as wagging its tail or barking are still possible, \
                 or the owner can interrupt the current behavior.",
                p.description, p.elapsed_minutes, p.remaining_minutes, p.percent
            );
        }

        format!(
            "Current internal state:\n\
             - hunger: {:.1}/100\n\
             - thirst: {:.1}/100\n\
             - fatigue: {:.1}/100\n\
             - boredom: {:.1}/100\n\
             - happiness: {:.1}/100\n\
             - overall feeling: {}",
            self.hunger,
            self.thirst,
            self.fatigue,
            self.boredom,
            self.happiness,
            self.needs_summary()
        )
    }
}
