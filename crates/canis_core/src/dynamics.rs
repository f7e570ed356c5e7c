//! Need dynamics: how the attributes drift while time passes.
//!
//! Decay is linear in virtual minutes. Sleeping suspends the growth of the
//! four needs; unmet hunger or thirst erodes happiness regardless.

use crate::state::{Attribute, AttributeDelta, PetState};
use serde::{Deserialize, Serialize};

/// Linear decay rates, per virtual minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedDynamics {
    pub hunger_rate: f64,
    pub thirst_rate: f64,
    pub fatigue_rate: f64,
    pub boredom_rate: f64,
    /// Happiness lost per minute while hunger or thirst is above `need_threshold`.
    pub unhappiness_rate: f64,
    pub need_threshold: f64,
}

impl Default for NeedDynamics {
    fn default() -> Self {
        Self {
            hunger_rate: 2.0,
            thirst_rate: 1.5,
            fatigue_rate: 1.0,
            boredom_rate: 1.5,
            unhappiness_rate: 0.5,
            need_threshold: 70.0,
        }
    }
}

impl NeedDynamics {
    /// Integrate `minutes` of virtual time into `state`.
    ///
    /// `sleeping` suppresses the growth of hunger, thirst, fatigue and
    /// boredom. Negative or non-finite spans are ignored.
    pub fn apply_decay(&self, state: &mut PetState, minutes: f64, sleeping: bool) {
        if !(minutes.is_finite() && minutes > 0.0) {
            return;
        }

        if !sleeping {
            state.add(Attribute::Hunger, minutes * self.hunger_rate);
            state.add(Attribute::Thirst, minutes * self.thirst_rate);
            state.add(Attribute::Fatigue, minutes * self.fatigue_rate);
            state.add(Attribute::Boredom, minutes * self.boredom_rate);
        }

        if state.hunger > self.need_threshold || state.thirst > self.need_threshold {
            state.add(Attribute::Happiness, -minutes * self.unhappiness_rate);
        }
    }

    /// Apply a set of signed deltas, clamping each attribute.
    pub fn apply_delta(&self, state: &mut PetState, deltas: &[AttributeDelta]) {
        for delta in deltas {
            state.add(delta.attribute, delta.amount);
        }
    }
}
