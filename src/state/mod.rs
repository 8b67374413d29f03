//! Host state management module
//!
//! This module holds the state the HTTP host keeps around its mounted region.

pub mod app_state;
pub mod transitions;

// Re-export main types
pub use app_state::AppState;
pub use transitions::{Transition, TransitionLog};
