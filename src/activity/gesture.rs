//! Pass-through gesture observation

use std::{fmt, sync::Weak};
use serde::{Deserialize, Serialize};

use super::ActivitySource;
use crate::inactivity::TimerCore;

/// Capture requests raised by the host's gesture system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureRequest {
    StartCapture,
    MoveCapture,
    TerminationRequest,
}

impl GestureRequest {
    /// Parse the short phase names used by hosts (`start`, `move`, `terminate`)
    pub fn from_phase(phase: &str) -> Option<Self> {
        match phase {
            "start" => Some(Self::StartCapture),
            "move" => Some(Self::MoveCapture),
            "terminate" => Some(Self::TerminationRequest),
            _ => None,
        }
    }
}

impl fmt::Display for GestureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartCapture => "start",
            Self::MoveCapture => "move",
            Self::TerminationRequest => "terminate",
        };
        f.write_str(name)
    }
}

/// Observes gestures for their side effect and never claims them, so the
/// wrapped content still receives every touch
#[derive(Debug, Clone)]
pub struct PassThroughResponder {
    core: Weak<TimerCore>,
}

impl PassThroughResponder {
    pub(crate) fn new(core: Weak<TimerCore>) -> Self {
        Self { core }
    }

    /// Reset the inactivity timer and decline the gesture
    pub fn should_claim(&self, request: GestureRequest) -> bool {
        if let Some(core) = self.core.upgrade() {
            core.reset(ActivitySource::Touch(request));
        }
        false
    }

    pub fn on_start_should_set_capture(&self) -> bool {
        self.should_claim(GestureRequest::StartCapture)
    }

    pub fn on_move_should_set_capture(&self) -> bool {
        self.should_claim(GestureRequest::MoveCapture)
    }

    pub fn on_termination_request(&self) -> bool {
        self.should_claim(GestureRequest::TerminationRequest)
    }
}
