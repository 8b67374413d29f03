//! Inactivity region: wraps content and ties the signal sources, the timer
//! core and the control surface together for one mount

use std::{sync::Arc, time::Duration};
use tokio::runtime::Handle;
use tracing::debug;

use crate::{
    activity::{ActivitySource, GestureRequest, KeyboardNotifier, KeyboardSubscription, PassThroughResponder},
    config::InactivityConfig,
    control::ControlHandle,
    error::{InactivityError, Result},
    inactivity::{ActionCallback, InactivitySnapshot, SharedDuration, TimerCore},
    timer::{TimeoutHandler, TokioTimeoutHandler},
};

type RegisterCallback = Box<dyn FnOnce(ControlHandle) + Send>;

/// A mounted region tracking user inactivity around `content`.
///
/// Dropping the region unmounts it: the pending countdown is cancelled, the
/// keyboard listener is released and no further callback is delivered.
pub struct InactivityRegion<T> {
    content: T,
    core: Arc<TimerCore>,
    control: ControlHandle,
    responder: PassThroughResponder,
    _keyboard: Option<KeyboardSubscription>,
    is_active_input: bool,
}

impl<T> InactivityRegion<T> {
    pub fn builder(content: T) -> InactivityRegionBuilder<T> {
        InactivityRegionBuilder::new(content)
    }

    pub fn content(&self) -> &T {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut T {
        &mut self.content
    }

    /// The control surface created at mount
    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    /// Gesture observer to install on the host's capture hooks
    pub fn responder(&self) -> &PassThroughResponder {
        &self.responder
    }

    /// Forward a gesture request; always answers "do not capture"
    pub fn on_touch(&self, request: GestureRequest) -> bool {
        self.responder.should_claim(request)
    }

    /// Update the `is_active` input. Only a change to `true` restarts the
    /// timer; switching to `false` never forces inactivity.
    pub fn set_is_active(&mut self, is_active: bool) {
        let previous = std::mem::replace(&mut self.is_active_input, is_active);
        if is_active && !previous {
            self.core.reset(ActivitySource::IsActiveProp);
        } else if !is_active && previous {
            debug!("is_active input cleared; state left to the countdown");
        }
    }

    /// Update the configured countdown length after mount
    pub fn set_time_for_inactivity(&self, duration: Duration) {
        if duration != self.core.duration() {
            self.core.reconfigure(duration, ActivitySource::Reconfigure);
        }
    }

    pub fn is_active(&self) -> bool {
        self.core.is_active()
    }

    pub fn duration(&self) -> Duration {
        self.core.duration()
    }

    pub fn snapshot(&self) -> InactivitySnapshot {
        self.core.snapshot()
    }

    /// Tear the region down explicitly. Returns once no action callback is
    /// still running on another thread; the keyboard listener is released when
    /// `self` drops at the end of this call.
    pub fn unmount(self) {
        self.core.unmount();
    }
}

impl<T> Drop for InactivityRegion<T> {
    fn drop(&mut self) {
        self.core.unmount();
    }
}

/// Collects the inputs of a region before mounting it
pub struct InactivityRegionBuilder<T> {
    content: T,
    config: InactivityConfig,
    handler: Option<Arc<dyn TimeoutHandler>>,
    keyboard: Option<KeyboardNotifier>,
    shared_duration: Option<SharedDuration>,
    on_action: Option<ActionCallback>,
    on_register: Option<RegisterCallback>,
}

impl<T> InactivityRegionBuilder<T> {
    fn new(content: T) -> Self {
        Self {
            content,
            config: InactivityConfig::default(),
            handler: None,
            keyboard: None,
            shared_duration: None,
            on_action: None,
            on_register: None,
        }
    }

    pub fn config(mut self, config: InactivityConfig) -> Self {
        self.config = config;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = duration;
        self
    }

    pub fn initial_active(mut self, active: bool) -> Self {
        self.config.initial_active = active;
        self
    }

    pub fn suppress_keyboard_reset(mut self, suppress: bool) -> Self {
        self.config.suppress_keyboard_reset = suppress;
        self
    }

    /// Replace the default tokio countdown backend
    pub fn timeout_handler(mut self, handler: Arc<dyn TimeoutHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Listen for keyboard transitions published on `notifier`
    pub fn keyboard(mut self, notifier: &KeyboardNotifier) -> Self {
        self.keyboard = Some(notifier.clone());
        self
    }

    pub fn shared_duration(mut self, shared: SharedDuration) -> Self {
        self.shared_duration = Some(shared);
        self
    }

    /// Called with `true`/`false` whenever the region changes state
    pub fn on_action<F>(mut self, callback: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.on_action = Some(Arc::new(callback));
        self
    }

    /// Called once, during mount, with the region's control handle
    pub fn on_register<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(ControlHandle) + Send + 'static,
    {
        self.on_register = Some(Box::new(callback));
        self
    }

    /// Mount the region and start the first countdown
    pub fn mount(self) -> Result<InactivityRegion<T>> {
        let on_action = self.on_action.ok_or(InactivityError::MissingActionCallback)?;

        let keyboard = match self.keyboard {
            Some(notifier) if !self.config.suppress_keyboard_reset => Some((Handle::try_current()?, notifier)),
            Some(_) => {
                debug!("Keyboard resets suppressed for this region");
                None
            }
            None => None,
        };

        let handler: Arc<dyn TimeoutHandler> = match self.handler {
            Some(handler) => handler,
            None => Arc::new(TokioTimeoutHandler::new()?),
        };

        let core = TimerCore::mount(&self.config, handler, on_action, self.shared_duration);
        let keyboard = keyboard.map(|(runtime, notifier)| {
            KeyboardSubscription::spawn(&runtime, &notifier, Arc::downgrade(&core))
        });

        let control = ControlHandle::new(&core);
        if let Some(register) = self.on_register {
            register(control.clone());
        }

        Ok(InactivityRegion {
            content: self.content,
            responder: PassThroughResponder::new(Arc::downgrade(&core)),
            core,
            control,
            _keyboard: keyboard,
            is_active_input: self.config.initial_active,
        })
    }
}
