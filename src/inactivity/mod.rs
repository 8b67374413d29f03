//! Inactivity state machine
//!
//! This module contains the countdown core, its serializable snapshot and the
//! optional duration override shared between regions.

pub(crate) mod timer_core;
pub mod shared;
pub mod snapshot;

// Re-export main types
pub use timer_core::ActionCallback;
pub(crate) use timer_core::TimerCore;
pub use shared::SharedDuration;
pub use snapshot::InactivitySnapshot;
