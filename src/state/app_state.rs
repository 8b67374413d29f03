//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::{Transition, TransitionLog};
use crate::{
    activity::{GestureRequest, KeyboardEvent, KeyboardNotifier},
    config::InactivityConfig,
    control::ControlHandle,
    error::InactivityError,
    inactivity::InactivitySnapshot,
    region::InactivityRegion,
    timer::TimeoutHandler,
};

/// Label of the single region served by the host
const REGION_NAME: &str = "main";

/// Host state: the mounted region plus what the HTTP layer reports about it
pub struct AppState {
    /// Mounted region; `None` once the host has shut it down
    pub region: Mutex<Option<InactivityRegion<String>>>,
    /// Control surface delivered by the region at mount
    pub control: ControlHandle,
    /// Bus the keyboard endpoints publish on
    pub keyboard: KeyboardNotifier,
    /// Transitions announced by the region
    pub transitions: Arc<Mutex<TransitionLog>>,
    /// Channel for transition notifications
    pub transition_tx: broadcast::Sender<Transition>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Mount the region and wire its action callback into the transition log
    pub fn mount(
        port: u16,
        host: String,
        config: InactivityConfig,
        handler: Option<Arc<dyn TimeoutHandler>>,
    ) -> Result<Self, InactivityError> {
        let keyboard = KeyboardNotifier::default();
        let transitions = Arc::new(Mutex::new(TransitionLog::default()));
        let (transition_tx, _) = broadcast::channel(100);

        let log = Arc::clone(&transitions);
        let tx = transition_tx.clone();
        let mut builder = InactivityRegion::builder(REGION_NAME.to_string())
            .config(config)
            .keyboard(&keyboard)
            .on_action(move |active| {
                let transition = Transition::now(active);
                match log.lock() {
                    Ok(mut log) => log.push(transition.clone()),
                    Err(e) => warn!("Failed to lock transition log: {}", e),
                }
                // No subscribers is fine
                let _ = tx.send(transition);
            });
        if let Some(handler) = handler {
            builder = builder.timeout_handler(handler);
        }

        let region = builder.mount()?;
        let control = region.control();

        Ok(Self {
            region: Mutex::new(Some(region)),
            control,
            keyboard,
            transitions,
            transition_tx,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        })
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Run `f` against the mounted region
    fn with_region<R>(&self, f: impl FnOnce(&mut InactivityRegion<String>) -> R) -> Result<R, String> {
        let mut region = self.region.lock()
            .map_err(|e| format!("Failed to lock region: {}", e))?;

        region
            .as_mut()
            .map(f)
            .ok_or_else(|| "Region is not mounted".to_string())
    }

    /// Forward a touch to the region; returns whether it was claimed
    pub fn touch(&self, request: GestureRequest) -> Result<bool, String> {
        let claimed = self.with_region(|region| region.on_touch(request))?;
        self.record_action(&format!("touch-{}", request));
        Ok(claimed)
    }

    /// Publish a keyboard transition; returns the number of listeners reached
    pub fn keyboard(&self, event: KeyboardEvent) -> usize {
        self.record_action(&format!("keyboard-{}", event));
        self.keyboard.publish(event)
    }

    /// Report activity through the control handle
    pub fn reset_timer(&self) {
        self.record_action("activity");
        self.control.reset_timer_due_to_activity();
    }

    /// Change the inactivity time through the control handle
    pub fn change_time_for_inactivity(&self, duration: Duration) {
        info!("Changing inactivity time to {}ms", duration.as_millis());
        self.record_action("inactivity-time");
        self.control.change_time_for_inactivity(duration);
    }

    /// Update the region's `is_active` input
    pub fn set_is_active(&self, active: bool) -> Result<(), String> {
        self.with_region(|region| region.set_is_active(active))?;
        self.record_action(if active { "is-active-on" } else { "is-active-off" });
        Ok(())
    }

    /// Get the current region snapshot
    pub fn snapshot(&self) -> Result<InactivitySnapshot, String> {
        self.with_region(|region| region.snapshot())
    }

    /// Get the recorded transitions, oldest first
    pub fn get_transitions(&self) -> Result<Vec<Transition>, String> {
        self.transitions.lock()
            .map(|log| log.to_vec())
            .map_err(|e| format!("Failed to lock transition log: {}", e))
    }

    /// Most recent transition, if any was announced yet
    pub fn get_last_transition(&self) -> Result<Option<Transition>, String> {
        self.transitions.lock()
            .map(|log| log.latest().cloned())
            .map_err(|e| format!("Failed to lock transition log: {}", e))
    }

    /// Unmount the region; later calls report it as not mounted
    pub fn unmount(&self) -> Result<(), String> {
        let region = self.region.lock()
            .map_err(|e| format!("Failed to lock region: {}", e))?
            .take();

        if let Some(region) = region {
            region.unmount();
            info!("Region unmounted");
        }
        Ok(())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
