//! Keyboard visibility notifications

use std::{fmt, sync::Weak};
use serde::{Deserialize, Serialize};
use tokio::{
    runtime::Handle,
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, warn};

use super::ActivitySource;
use crate::inactivity::TimerCore;

/// Keyboard visibility transitions reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardEvent {
    DidShow,
    DidHide,
}

impl fmt::Display for KeyboardEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DidShow => f.write_str("shown"),
            Self::DidHide => f.write_str("hidden"),
        }
    }
}

/// In-process bus the host publishes keyboard transitions on
#[derive(Debug, Clone)]
pub struct KeyboardNotifier {
    tx: broadcast::Sender<KeyboardEvent>,
}

impl KeyboardNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a transition, returning how many listeners received it
    pub fn publish(&self, event: KeyboardEvent) -> usize {
        match self.tx.send(event) {
            Ok(listeners) => listeners,
            Err(_) => {
                debug!("Keyboard {} with no listeners", event);
                0
            }
        }
    }

    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KeyboardEvent> {
        self.tx.subscribe()
    }
}

impl Default for KeyboardNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Listener resetting a region on keyboard transitions; stops when dropped
#[derive(Debug)]
pub struct KeyboardSubscription {
    listener: JoinHandle<()>,
}

impl KeyboardSubscription {
    pub(crate) fn spawn(runtime: &Handle, notifier: &KeyboardNotifier, core: Weak<TimerCore>) -> Self {
        let mut events = notifier.subscribe();

        let listener = runtime.spawn(async move {
            while let Some(source) = activity_from(events.recv().await) {
                match core.upgrade() {
                    Some(core) => core.reset(source),
                    None => break,
                }
            }
        });

        Self { listener }
    }
}

/// Map one receive on the bus to the activity it stands for; `None` once the
/// bus is closed
fn activity_from(received: Result<KeyboardEvent, RecvError>) -> Option<ActivitySource> {
    match received {
        Ok(event) => Some(ActivitySource::Keyboard(event)),
        Err(RecvError::Lagged(missed)) => {
            warn!("Keyboard listener lagged, {} events skipped", missed);
            Some(ActivitySource::KeyboardLagged { missed })
        }
        Err(RecvError::Closed) => {
            debug!("Keyboard notifier closed");
            None
        }
    }
}

impl Drop for KeyboardSubscription {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::{
        config::InactivityConfig,
        timer::TokioTimeoutHandler,
    };

    #[test]
    fn publish_without_listeners_reaches_nobody() {
        let notifier = KeyboardNotifier::default();
        assert_eq!(notifier.publish(KeyboardEvent::DidShow), 0);
    }

    #[tokio::test]
    async fn dropping_subscription_releases_listener() {
        let notifier = KeyboardNotifier::default();
        let subscription = KeyboardSubscription::spawn(&Handle::current(), &notifier, Weak::new());
        assert_eq!(notifier.listeners(), 1);

        drop(subscription);
        // Abort is processed on the next scheduler turn.
        for _ in 0..10 {
            if notifier.listeners() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(notifier.listeners(), 0);
    }

    #[test]
    fn lag_is_reported_as_its_own_source() {
        assert_eq!(
            activity_from(Err(RecvError::Lagged(3))),
            Some(ActivitySource::KeyboardLagged { missed: 3 })
        );
        assert_eq!(
            activity_from(Ok(KeyboardEvent::DidHide)),
            Some(ActivitySource::Keyboard(KeyboardEvent::DidHide))
        );
        assert_eq!(activity_from(Err(RecvError::Closed)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn lagged_listener_resets_once_for_missed_events() {
        let notifier = KeyboardNotifier::new(1);
        let core = TimerCore::mount(
            &InactivityConfig::default(),
            Arc::new(TokioTimeoutHandler::new().unwrap()),
            Arc::new(|_: bool| {}),
            None,
        );
        let _subscription = KeyboardSubscription::spawn(&Handle::current(), &notifier, Arc::downgrade(&core));

        // The listener has not run yet, so only the last event stays buffered.
        notifier.publish(KeyboardEvent::DidShow);
        notifier.publish(KeyboardEvent::DidHide);
        notifier.publish(KeyboardEvent::DidHide);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let snapshot = core.snapshot();
        assert_eq!(snapshot.epoch, 2);
        assert_eq!(snapshot.last_source, Some(ActivitySource::Keyboard(KeyboardEvent::DidHide)));
    }
}
