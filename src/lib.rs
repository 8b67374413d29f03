//! User Inactivity - edge-triggered inactivity detection for an interactive region
//!
//! A region wraps some content, observes touches and keyboard visibility
//! changes without consuming them, and reports through a callback whenever
//! it turns inactive (no activity for the configured time) or active again.

pub mod activity;
pub mod api;
pub mod config;
pub mod control;
pub mod error;
pub mod inactivity;
pub mod region;
pub mod state;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use activity::{GestureRequest, KeyboardEvent, KeyboardNotifier};
pub use config::{Config, InactivityConfig};
pub use control::ControlHandle;
pub use error::InactivityError;
pub use inactivity::{InactivitySnapshot, SharedDuration};
pub use region::{InactivityRegion, InactivityRegionBuilder};
pub use timer::{BackgroundTimeoutHandler, TimeoutHandler, TokioTimeoutHandler};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
