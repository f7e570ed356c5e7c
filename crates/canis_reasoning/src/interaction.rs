use canis_core::Clock;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Time since the owner last interacted, measured on the shared clock.
///
/// Reset by owner input and by completion of interactive-origin tasks; the
/// orchestrator only acts autonomously once it has been quiet long enough.
#[derive(Debug)]
pub struct InteractionTimer {
    clock: Arc<dyn Clock>,
    last: Mutex<DateTime<Utc>>,
}

impl InteractionTimer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            clock,
            last: Mutex::new(now),
        }
    }

    pub fn reset(&self) {
        let now = self.clock.now();
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Real time since the last reset. Zero if the clock went backwards.
    pub fn elapsed(&self) -> Duration {
        let last = *self.last.lock().unwrap_or_else(|e| e.into_inner());
        (self.clock.now() - last).to_std().unwrap_or(Duration::ZERO)
    }
}
