//! Inactivity timer core: epoch-tagged countdown and edge-triggered state

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, ThreadId},
    time::Duration,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::{InactivitySnapshot, SharedDuration};
use crate::{
    activity::ActivitySource,
    config::InactivityConfig,
    timer::{TimeoutHandler, TimerToken},
};

/// Consumer callback receiving the new active flag on each transition
pub type ActionCallback = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Debug)]
struct CoreState {
    active: bool,
    /// Value carried by the last announcement (or assumed at mount)
    last_announced: bool,
    epoch: u64,
    duration: Duration,
    pending: Option<TimerToken>,
    mounted: bool,
    last_activity: Option<DateTime<Utc>>,
    last_source: Option<ActivitySource>,
    /// Announcements decided but not yet handed to the consumer, oldest first
    outbox: VecDeque<bool>,
    /// Thread currently draining `outbox`
    delivering: Option<ThreadId>,
}

impl CoreState {
    /// Write the active flag and queue an announcement if it changed
    fn write_active(&mut self, active: bool) {
        self.active = active;
        if active != self.last_announced {
            self.last_announced = active;
            self.outbox.push_back(active);
        }
    }
}

/// Releases the delivery slot if the consumer callback panics
struct Delivery<'a> {
    core: &'a TimerCore,
    finished: bool,
}

impl Drop for Delivery<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.core.lock().delivering = None;
            self.core.delivered.notify_all();
        }
    }
}

/// Owner of the countdown and of the active/inactive state
pub(crate) struct TimerCore {
    state: Mutex<CoreState>,
    /// Signalled whenever a delivery run ends
    delivered: Condvar,
    handler: Arc<dyn TimeoutHandler>,
    on_action: ActionCallback,
    shared_duration: Option<SharedDuration>,
}

impl fmt::Debug for TimerCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerCore")
            .field("state", &self.state)
            .field("shared_duration", &self.shared_duration)
            .finish_non_exhaustive()
    }
}

impl TimerCore {
    /// Create the core and start the first countdown without touching the
    /// initial state
    pub(crate) fn mount(
        config: &InactivityConfig,
        handler: Arc<dyn TimeoutHandler>,
        on_action: ActionCallback,
        shared_duration: Option<SharedDuration>,
    ) -> Arc<Self> {
        let duration = shared_duration
            .as_ref()
            .and_then(SharedDuration::get)
            .unwrap_or(config.duration);

        let core = Arc::new(Self {
            state: Mutex::new(CoreState {
                active: config.initial_active,
                last_announced: config.initial_active,
                epoch: 0,
                duration,
                pending: None,
                mounted: true,
                last_activity: None,
                last_source: Some(ActivitySource::Mount),
                outbox: VecDeque::new(),
                delivering: None,
            }),
            delivered: Condvar::new(),
            handler,
            on_action,
            shared_duration,
        });

        {
            let mut state = core.lock();
            core.schedule_locked(&mut state);
        }

        info!(
            "Inactivity region mounted: active={}, duration={}ms",
            config.initial_active,
            duration.as_millis()
        );
        core
    }

    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a countdown tagged with the current epoch
    fn schedule_locked(self: &Arc<Self>, state: &mut CoreState) {
        let epoch = state.epoch;
        let core = Arc::downgrade(self);
        let expire = Box::new(move || {
            if let Some(core) = core.upgrade() {
                core.on_expire(epoch);
            }
        });

        match self.handler.schedule(expire, state.duration) {
            Ok(token) => state.pending = Some(token),
            Err(e) => {
                // Without a countdown the region simply stays in its current state.
                error!("Failed to schedule inactivity countdown: {}", e);
                state.pending = None;
            }
        }
    }

    /// Supersede any pending countdown and mark the region active
    fn restart_locked(self: &Arc<Self>, state: &mut CoreState, source: ActivitySource) {
        if let Some(token) = state.pending.take() {
            self.handler.cancel(token);
        }

        state.epoch = state.epoch.wrapping_add(1);
        state.last_activity = Some(Utc::now());
        debug!("Activity from {}, starting epoch {}", source, state.epoch);
        state.last_source = Some(source);

        self.schedule_locked(state);
        state.write_active(true);
    }

    /// Hand queued announcements to the consumer in the order they were
    /// decided. One thread drains at a time; entries queued meanwhile by other
    /// threads (or re-entrantly by the callback) are delivered by that thread.
    fn deliver(&self) {
        {
            let mut state = self.lock();
            if state.delivering.is_some() || state.outbox.is_empty() {
                return;
            }
            state.delivering = Some(thread::current().id());
        }

        let mut delivery = Delivery { core: self, finished: false };
        loop {
            let active = {
                let mut state = self.lock();
                if !state.mounted {
                    state.outbox.clear();
                }
                match state.outbox.pop_front() {
                    Some(active) => active,
                    None => {
                        state.delivering = None;
                        delivery.finished = true;
                        self.delivered.notify_all();
                        return;
                    }
                }
            };

            info!("User is now {}", if active { "active" } else { "inactive" });
            (self.on_action)(active);
        }
    }

    pub(crate) fn reset(self: &Arc<Self>, source: ActivitySource) {
        {
            let mut state = self.lock();
            if !state.mounted {
                debug!("Ignoring {} after unmount", source);
                return;
            }
            self.restart_locked(&mut state, source);
        }
        self.deliver();
    }

    pub(crate) fn reconfigure(self: &Arc<Self>, duration: Duration, source: ActivitySource) {
        {
            let mut state = self.lock();
            if !state.mounted {
                debug!("Ignoring reconfiguration after unmount");
                return;
            }

            info!(
                "Inactivity duration changed from {}ms to {}ms",
                state.duration.as_millis(),
                duration.as_millis()
            );
            state.duration = duration;
            if let Some(shared) = &self.shared_duration {
                shared.set(duration);
            }

            self.restart_locked(&mut state, source);
        }
        self.deliver();
    }

    fn on_expire(&self, epoch: u64) {
        {
            let mut state = self.lock();
            if !state.mounted || epoch != state.epoch {
                debug!("Discarding stale countdown for epoch {} (current {})", epoch, state.epoch);
                return;
            }
            state.pending = None;
            debug!("Countdown for epoch {} expired", epoch);
            state.write_active(false);
        }
        self.deliver();
    }

    /// Cancel the pending countdown, drop undelivered announcements and
    /// refuse any further work. Returns once no other thread is inside the
    /// action callback.
    pub(crate) fn unmount(&self) {
        let mut state = self.lock();
        if state.mounted {
            state.mounted = false;
            state.outbox.clear();
            if let Some(token) = state.pending.take() {
                self.handler.cancel(token);
            }
            info!("Inactivity region unmounted at epoch {}", state.epoch);
        }

        let current = thread::current().id();
        while state.delivering.is_some_and(|id| id != current) {
            state = self.delivered.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub(crate) fn duration(&self) -> Duration {
        self.lock().duration
    }

    pub(crate) fn is_active(&self) -> bool {
        self.lock().active
    }

    pub(crate) fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    pub(crate) fn snapshot(&self) -> InactivitySnapshot {
        let state = self.lock();
        InactivitySnapshot {
            active: state.active,
            duration_ms: u64::try_from(state.duration.as_millis()).unwrap_or(u64::MAX),
            epoch: state.epoch,
            countdown_pending: state.pending.is_some(),
            mounted: state.mounted,
            last_activity: state.last_activity,
            last_source: state.last_source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Result, timer::TimeoutCallback};
    use std::{
        panic::{catch_unwind, AssertUnwindSafe},
        sync::{
            atomic::{AtomicBool, Ordering},
            Barrier, Mutex as StdMutex,
        },
        thread,
    };

    /// Records callbacks so tests can fire them by hand, in any order
    #[derive(Default)]
    struct ManualHandler {
        scheduled: StdMutex<Vec<(TimerToken, Option<TimeoutCallback>)>>,
        cancelled: StdMutex<Vec<TimerToken>>,
    }

    impl ManualHandler {
        fn fire(&self, index: usize) {
            let callback = self.scheduled.lock().unwrap()[index].1.take();
            if let Some(callback) = callback {
                callback();
            }
        }

        fn scheduled_count(&self) -> usize {
            self.scheduled.lock().unwrap().len()
        }
    }

    impl TimeoutHandler for ManualHandler {
        fn schedule(&self, callback: TimeoutCallback, _delay: Duration) -> Result<TimerToken> {
            let mut scheduled = self.scheduled.lock().unwrap();
            let token = TimerToken(scheduled.len() as u64);
            scheduled.push((token, Some(callback)));
            Ok(token)
        }

        fn cancel(&self, token: TimerToken) {
            self.cancelled.lock().unwrap().push(token);
        }
    }

    /// Parks the first announcement of one value until the test lets it go
    struct Gate {
        value: bool,
        armed: AtomicBool,
        entered: Barrier,
        release: Barrier,
    }

    impl Gate {
        fn on(value: bool) -> Arc<Self> {
            Arc::new(Self {
                value,
                armed: AtomicBool::new(true),
                entered: Barrier::new(2),
                release: Barrier::new(2),
            })
        }

        /// Action callback recording into `calls` after passing the gate
        fn callback(self: &Arc<Self>, calls: &Arc<StdMutex<Vec<bool>>>) -> ActionCallback {
            let gate = Arc::clone(self);
            let sink = Arc::clone(calls);
            Arc::new(move |active| {
                if active == gate.value && gate.armed.swap(false, Ordering::SeqCst) {
                    gate.entered.wait();
                    gate.release.wait();
                }
                sink.lock().unwrap().push(active);
            })
        }
    }

    fn mount_with(initial_active: bool, on_action: ActionCallback) -> (Arc<TimerCore>, Arc<ManualHandler>) {
        let handler = Arc::new(ManualHandler::default());
        let config = InactivityConfig {
            initial_active,
            ..InactivityConfig::default()
        };
        let core = TimerCore::mount(&config, handler.clone(), on_action, None);
        (core, handler)
    }

    fn mount(initial_active: bool) -> (Arc<TimerCore>, Arc<ManualHandler>, Arc<StdMutex<Vec<bool>>>) {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let (core, handler) = mount_with(initial_active, Arc::new(move |active| sink.lock().unwrap().push(active)));
        (core, handler, calls)
    }

    fn wait_until_unmounted(core: &TimerCore) {
        while core.is_mounted() {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn mount_schedules_without_announcing() {
        let (core, handler, calls) = mount(true);
        assert_eq!(handler.scheduled_count(), 1);
        assert!(core.is_active());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn stale_expiry_is_ignored_even_if_not_cancelled() {
        let (core, handler, calls) = mount(true);
        core.reset(ActivitySource::Control);

        // The first countdown belongs to epoch 0 and must be a no-op.
        handler.fire(0);
        assert!(core.is_active());
        assert!(calls.lock().unwrap().is_empty());

        handler.fire(1);
        assert!(!core.is_active());
        assert_eq!(*calls.lock().unwrap(), vec![false]);
    }

    #[test]
    fn reset_cancels_previous_token() {
        let (core, handler, _) = mount(true);
        core.reset(ActivitySource::Control);
        core.reset(ActivitySource::Control);
        assert_eq!(*handler.cancelled.lock().unwrap(), vec![TimerToken(0), TimerToken(1)]);
    }

    #[test]
    fn repeated_resets_announce_once() {
        let (core, handler, calls) = mount(true);
        handler.fire(0);
        for _ in 0..3 {
            core.reset(ActivitySource::Control);
        }
        assert_eq!(*calls.lock().unwrap(), vec![false, true]);
    }

    #[test]
    fn initially_inactive_expiry_is_silent() {
        let (core, handler, calls) = mount(false);
        handler.fire(0);
        assert!(!core.is_active());
        assert!(calls.lock().unwrap().is_empty());

        core.reset(ActivitySource::Control);
        assert_eq!(*calls.lock().unwrap(), vec![true]);
    }

    #[test]
    fn expiry_after_unmount_is_ignored() {
        let (core, handler, calls) = mount(true);
        core.unmount();
        handler.fire(0);
        core.reset(ActivitySource::Control);

        assert!(calls.lock().unwrap().is_empty());
        assert!(!core.is_mounted());
        assert_eq!(handler.scheduled_count(), 1);
    }

    #[test]
    fn reconfigure_updates_duration_and_shared_value() {
        let handler = Arc::new(ManualHandler::default());
        let shared = SharedDuration::new();
        let core = TimerCore::mount(
            &InactivityConfig::default(),
            handler,
            Arc::new(|_: bool| {}),
            Some(shared.clone()),
        );

        core.reconfigure(Duration::from_millis(2500), ActivitySource::Reconfigure);
        assert_eq!(core.duration(), Duration::from_millis(2500));
        assert_eq!(shared.get(), Some(Duration::from_millis(2500)));

        let snapshot = core.snapshot();
        assert_eq!(snapshot.duration_ms, 2500);
        assert_eq!(snapshot.epoch, 1);
        assert_eq!(snapshot.last_source, Some(ActivitySource::Reconfigure));
    }

    #[test]
    fn reset_during_slow_expiry_announcement_is_delivered_after_it() {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let gate = Gate::on(false);
        let (core, handler) = mount_with(true, gate.callback(&calls));

        let expiry = {
            let handler = Arc::clone(&handler);
            thread::spawn(move || handler.fire(0))
        };
        gate.entered.wait();

        // The expiry thread is inside the callback; this reset only queues.
        core.reset(ActivitySource::Control);
        assert!(core.is_active());
        assert!(calls.lock().unwrap().is_empty());

        gate.release.wait();
        expiry.join().unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![false, true]);
        assert!(core.is_active());

        handler.fire(1);
        assert_eq!(*calls.lock().unwrap(), vec![false, true, false]);
    }

    #[test]
    fn unmount_waits_for_announcement_in_progress() {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let gate = Gate::on(false);
        let (core, handler) = mount_with(true, gate.callback(&calls));

        let expiry = {
            let handler = Arc::clone(&handler);
            thread::spawn(move || handler.fire(0))
        };
        gate.entered.wait();

        let teardown = {
            let core = Arc::clone(&core);
            thread::spawn(move || core.unmount())
        };
        wait_until_unmounted(&core);
        thread::sleep(Duration::from_millis(20));
        assert!(!teardown.is_finished());

        gate.release.wait();
        expiry.join().unwrap();
        teardown.join().unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![false]);

        core.reset(ActivitySource::Control);
        assert_eq!(*calls.lock().unwrap(), vec![false]);
        assert_eq!(handler.scheduled_count(), 1);
    }

    #[test]
    fn queued_announcement_is_dropped_by_unmount() {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let gate = Gate::on(true);
        let (core, handler) = mount_with(false, gate.callback(&calls));

        let activity = {
            let core = Arc::clone(&core);
            thread::spawn(move || core.reset(ActivitySource::Control))
        };
        gate.entered.wait();

        // Expiry of the new epoch queues `false` behind the blocked `true`.
        handler.fire(1);
        assert!(!core.is_active());

        let teardown = {
            let core = Arc::clone(&core);
            thread::spawn(move || core.unmount())
        };
        wait_until_unmounted(&core);

        gate.release.wait();
        activity.join().unwrap();
        teardown.join().unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![true]);
    }

    #[test]
    fn unmount_from_inside_callback_does_not_block() {
        let slot: Arc<StdMutex<Option<Arc<TimerCore>>>> = Arc::new(StdMutex::new(None));
        let inner = Arc::clone(&slot);
        let (core, handler) = mount_with(
            true,
            Arc::new(move |_: bool| {
                if let Some(core) = inner.lock().unwrap().take() {
                    core.unmount();
                }
            }),
        );
        *slot.lock().unwrap() = Some(Arc::clone(&core));

        handler.fire(0);
        assert!(!core.is_mounted());
    }

    #[test]
    fn panicking_callback_releases_delivery() {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let (core, handler) = mount_with(
            true,
            Arc::new(move |active| {
                if !active {
                    panic!("consumer failed");
                }
                sink.lock().unwrap().push(active);
            }),
        );

        assert!(catch_unwind(AssertUnwindSafe(|| handler.fire(0))).is_err());

        core.reset(ActivitySource::Control);
        assert_eq!(*calls.lock().unwrap(), vec![true]);
    }
}
