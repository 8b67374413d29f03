//! Point-in-time view of an inactivity region

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::activity::ActivitySource;

/// Serializable state of the inactivity timer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InactivitySnapshot {
    pub active: bool,
    pub duration_ms: u64,
    /// Incremented by every reset; only the latest epoch may expire
    pub epoch: u64,
    pub countdown_pending: bool,
    pub mounted: bool,
    pub last_activity: Option<DateTime<Utc>>,
    pub last_source: Option<ActivitySource>,
}

impl InactivitySnapshot {
    /// Whether the countdown can still flip the region to inactive
    pub fn can_expire(&self) -> bool {
        self.mounted && self.active && self.countdown_pending
    }
}
