//! Pluggable delay primitives used by the inactivity countdown
//!
//! The core never sleeps by itself: it asks a [`TimeoutHandler`] to run a
//! callback later and to cancel it when activity arrives first.

pub mod background;
pub mod tokio_timer;

use std::{fmt, time::Duration};

use crate::error::Result;

pub use background::BackgroundTimeoutHandler;
pub use tokio_timer::TokioTimeoutHandler;

/// Callback run once a countdown elapses
pub type TimeoutCallback = Box<dyn FnOnce() + Send + 'static>;

/// Identifies a scheduled countdown so it can be cancelled later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// A start/cancel capability for single-shot delayed callbacks.
///
/// Implementations must not invoke `callback` synchronously from
/// `schedule`: the core holds its state lock while scheduling.
pub trait TimeoutHandler: Send + Sync {
    /// Run `callback` once after `delay`
    fn schedule(&self, callback: TimeoutCallback, delay: Duration) -> Result<TimerToken>;

    /// Stop a countdown before it fires. Unknown or finished tokens are ignored.
    fn cancel(&self, token: TimerToken);
}
