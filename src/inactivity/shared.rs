//! Duration override shared explicitly between regions

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

/// A duration that outlives any single region.
///
/// Regions mounted with the same `SharedDuration` start from the last value
/// any of them was reconfigured to, and write their own reconfigurations back.
#[derive(Debug, Clone, Default)]
pub struct SharedDuration(Arc<Mutex<Option<Duration>>>);

impl SharedDuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Duration> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, duration: Duration) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(duration);
    }
}
