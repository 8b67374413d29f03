//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{inactivity::InactivitySnapshot, state::Transition};

/// API response structure for activity endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Set by the touch endpoint: whether the region claimed the gesture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed: Option<bool>,
    pub region: InactivitySnapshot,
}

impl ApiResponse {
    /// Create a response whose status follows the region state
    pub fn new(message: String, region: InactivitySnapshot) -> Self {
        Self {
            status: if region.active { "active" } else { "inactive" }.to_string(),
            message,
            timestamp: Utc::now(),
            claimed: None,
            region,
        }
    }

    pub fn with_claimed(mut self, claimed: bool) -> Self {
        self.claimed = Some(claimed);
        self
    }
}

/// Body of POST /inactivity-time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InactivityTimeRequest {
    pub duration_ms: u64,
}

/// Body of POST /is-active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsActiveRequest {
    pub active: bool,
}

/// Error body for rejected requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Status response with region and transition information
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub region: InactivitySnapshot,
    /// Whether the running countdown can still flip the region to inactive
    pub can_expire: bool,
    pub last_transition: Option<Transition>,
    pub transitions: Vec<Transition>,
    pub keyboard_listeners: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
