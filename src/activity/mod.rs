//! Activity signal sources
//!
//! Touch gestures and keyboard visibility changes are translated into timer
//! resets here. Neither channel consumes the underlying event.

pub mod gesture;
pub mod keyboard;

use std::fmt;
use serde::Serialize;

pub use gesture::{GestureRequest, PassThroughResponder};
pub use keyboard::{KeyboardEvent, KeyboardNotifier, KeyboardSubscription};

/// What caused the most recent timer restart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    Mount,
    Touch(GestureRequest),
    Keyboard(KeyboardEvent),
    /// Keyboard transitions the listener fell behind on, counted as one activity
    KeyboardLagged { missed: u64 },
    Control,
    IsActiveProp,
    Reconfigure,
}

impl fmt::Display for ActivitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mount => write!(f, "mount"),
            Self::Touch(request) => write!(f, "touch ({})", request),
            Self::Keyboard(event) => write!(f, "keyboard ({})", event),
            Self::KeyboardLagged { missed } => write!(f, "keyboard ({} missed)", missed),
            Self::Control => write!(f, "control handle"),
            Self::IsActiveProp => write!(f, "is_active input"),
            Self::Reconfigure => write!(f, "reconfiguration"),
        }
    }
}
