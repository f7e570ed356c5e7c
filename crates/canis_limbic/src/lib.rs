//! # Canis Limbic
//!
//! Owns the dog's state over time. [`slot`] is the long-term behavior state
//! machine; [`StateManager`] wraps it together with need decay, the time
//! scale and persistence behind a single lock.

pub mod slot;
mod system;

pub use slot::SlotTick;
pub use system::StateManager;
