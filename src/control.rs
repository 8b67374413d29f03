//! Control surface handed to code outside the wrapped content

use std::{
    sync::{Arc, Weak},
    time::Duration,
};
use tracing::debug;

use crate::{activity::ActivitySource, inactivity::TimerCore};

/// Drives a region's timer directly, for contexts where touches are not
/// reported through the gesture system.
///
/// The handle does not keep the region alive; once it is unmounted every
/// call is a no-op.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    core: Weak<TimerCore>,
}

impl ControlHandle {
    pub(crate) fn new(core: &Arc<TimerCore>) -> Self {
        Self {
            core: Arc::downgrade(core),
        }
    }

    fn with_core(&self, op: &str, f: impl FnOnce(&Arc<TimerCore>)) {
        match self.core.upgrade() {
            Some(core) => f(&core),
            None => debug!("Control {} ignored, region is gone", op),
        }
    }

    /// Report activity: restarts the countdown and marks the region active
    pub fn reset_timer_due_to_activity(&self) {
        self.with_core("reset", |core| core.reset(ActivitySource::Control));
    }

    /// Change the countdown length; also restarts the countdown
    pub fn change_time_for_inactivity(&self, duration: Duration) {
        self.with_core("reconfigure", |core| {
            core.reconfigure(duration, ActivitySource::Control)
        });
    }

    /// Whether the region behind this handle is still mounted
    pub fn is_mounted(&self) -> bool {
        self.core.upgrade().is_some_and(|core| core.is_mounted())
    }
}
