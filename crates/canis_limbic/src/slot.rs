//! Single-slot state machine for long-term behaviors.
//!
//! The slot is `Idle` when `PetState::activity` is `None` and `Active`
//! otherwise. These functions are pure over a `PetState` plus the current
//! time and scale; locking and persistence belong to the
//! [`StateManager`](crate::StateManager).

use canis_core::state::{ActiveBehavior, Attribute, BehaviorKind, BehaviorProgress, PetState};
use canis_core::{PetError, PetResult, TimeScale};
use chrono::{DateTime, Utc};

/// Snapshot used when a behavior has no recorded initial value.
pub const FALLBACK_INITIAL: f64 = 80.0;

/// Result of advancing the slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotTick {
    Idle,
    /// Still running at the given fraction in `[0, 1)`.
    InProgress(f64),
    Completed(BehaviorKind),
}

/// Virtual minutes the active behavior has been running.
pub fn elapsed_minutes(activity: &ActiveBehavior, now: DateTime<Utc>, scale: TimeScale) -> f64 {
    scale.minutes_between(activity.started_at, now)
}

/// Occupy the slot.
///
/// Fails with `Busy` when something is already running and with
/// `InvalidDuration` for non-positive or non-finite durations. Neither
/// failure touches `state`.
pub fn start(
    state: &mut PetState,
    kind: BehaviorKind,
    duration_minutes: f64,
    description: &str,
    now: DateTime<Utc>,
) -> PetResult<()> {
    if let Some(active) = &state.activity {
        return Err(PetError::Busy {
            description: active.description.clone(),
        });
    }
    if !(duration_minutes.is_finite() && duration_minutes > 0.0) {
        return Err(PetError::InvalidDuration(duration_minutes));
    }

    let (initial_hunger, initial_thirst) = match kind {
        BehaviorKind::Eating => (Some(state.hunger), None),
        BehaviorKind::Drinking => (None, Some(state.thirst)),
        BehaviorKind::Sleeping => (None, None),
    };

    state.activity = Some(ActiveBehavior {
        kind,
        started_at: now,
        duration_minutes,
        description: description.to_string(),
        initial_hunger,
        initial_thirst,
    });
    Ok(())
}

/// Advance the active behavior to `now`.
///
/// While running, the relieved attributes are overwritten by a linear
/// interpolation on progress. Reaching the declared duration completes the
/// behavior.
pub fn tick(state: &mut PetState, now: DateTime<Utc>, scale: TimeScale) -> SlotTick {
    let Some(activity) = &state.activity else {
        return SlotTick::Idle;
    };

    let progress = elapsed_minutes(activity, now, scale) / activity.duration_minutes;
    let kind = activity.kind;
    let initial_hunger = activity.initial_hunger.unwrap_or(FALLBACK_INITIAL);
    let initial_thirst = activity.initial_thirst.unwrap_or(FALLBACK_INITIAL);

    if progress >= 1.0 {
        return match complete(state) {
            Some(kind) => SlotTick::Completed(kind),
            None => SlotTick::Idle,
        };
    }

    let p = progress.max(0.0);
    match kind {
        BehaviorKind::Sleeping => {
            state.set(Attribute::Fatigue, (80.0 * (1.0 - p)).max(0.0));
            state.set(Attribute::Boredom, (50.0 * (1.0 - 0.5 * p)).max(0.0));
        }
        BehaviorKind::Eating => {
            state.set(Attribute::Hunger, (initial_hunger * (1.0 - p)).max(0.0));
        }
        BehaviorKind::Drinking => {
            state.set(Attribute::Thirst, (initial_thirst * (1.0 - p)).max(0.0));
        }
    }
    SlotTick::InProgress(p)
}

/// Finish the active behavior: zero what it relieves, grant the happiness
/// bonus, raise the completion flag.
pub fn complete(state: &mut PetState) -> Option<BehaviorKind> {
    let activity = state.activity.take()?;
    let kind = activity.kind;
    state.set(kind.relieves(), 0.0);
    state.add(Attribute::Happiness, kind.completion_bonus());
    state.just_completed = true;
    tracing::info!("{} finished", activity.description);
    Some(kind)
}

/// Stop the active behavior early, without bonus or zeroing.
pub fn interrupt(state: &mut PetState, reason: &str) -> PetResult<String> {
    let activity = state.activity.take().ok_or(PetError::NothingToInterrupt)?;
    let message = if reason.is_empty() {
        format!("Interrupted {}", activity.description)
    } else {
        format!("Interrupted {} ({})", activity.description, reason)
    };
    tracing::info!("{}", message);
    Ok(message)
}

/// True iff a behavior is in the slot and its duration has not elapsed.
pub fn is_busy(state: &PetState, now: DateTime<Utc>, scale: TimeScale) -> bool {
    state
        .activity
        .as_ref()
        .is_some_and(|a| elapsed_minutes(a, now, scale) < a.duration_minutes)
}

/// Progress of the active behavior, `None` when idle.
pub fn progress(
    state: &PetState,
    now: DateTime<Utc>,
    scale: TimeScale,
) -> Option<BehaviorProgress> {
    let activity = state.activity.as_ref()?;
    let total = activity.duration_minutes;
    let elapsed = elapsed_minutes(activity, now, scale);
    Some(BehaviorProgress {
        kind: activity.kind,
        description: activity.description.clone(),
        elapsed_minutes: elapsed,
        remaining_minutes: (total - elapsed).max(0.0),
        total_minutes: total,
        percent: (elapsed / total * 100.0).min(100.0),
    })
}
