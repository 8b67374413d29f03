//! Default countdown backend running on the tokio runtime

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, PoisonError,
    },
    time::Duration,
};
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::debug;

use super::{TimeoutCallback, TimeoutHandler, TimerToken};
use crate::error::Result;

/// Spawns one task per countdown and aborts it on cancel
#[derive(Debug)]
pub struct TokioTimeoutHandler {
    runtime: Handle,
    next_token: AtomicU64,
    tasks: Mutex<HashMap<TimerToken, JoinHandle<()>>>,
}

impl TokioTimeoutHandler {
    /// Bind to the runtime of the calling context
    pub fn new() -> Result<Self> {
        Ok(Self::with_handle(Handle::try_current()?))
    }

    /// Bind to an explicit runtime handle
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            next_token: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Number of countdowns that have neither fired nor been cancelled
    #[cfg(test)]
    fn pending(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }
}

impl TimeoutHandler for TokioTimeoutHandler {
    fn schedule(&self, callback: TimeoutCallback, delay: Duration) -> Result<TimerToken> {
        let token = TimerToken(self.next_token.fetch_add(1, Ordering::Relaxed));

        // Deadline is fixed now, not when the task is first polled.
        let deadline = Instant::now() + delay;
        let task = self.runtime.spawn(async move {
            sleep_until(deadline).await;
            callback();
        });

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|_, task| !task.is_finished());
        tasks.insert(token, task);

        debug!("Scheduled {} in {}ms", token, delay.as_millis());
        Ok(token)
    }

    fn cancel(&self, token: TimerToken) {
        let task = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&token);

        if let Some(task) = task {
            task.abort();
            debug!("Cancelled {}", token);
        }
    }
}
