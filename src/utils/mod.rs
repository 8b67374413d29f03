//! Host utilities
//!
//! Process-level helpers for the HTTP host binary.

pub mod signals;

pub use signals::shutdown_signal;
