//! Countdown backend that runs on its own OS thread
//!
//! Useful when the countdown must keep going regardless of whether an async
//! runtime is being polled. Like a single background timer, it owns one slot:
//! scheduling a new countdown stops the previous one. Every handler drives its
//! slot from one long-lived worker thread, started on first use.

use std::{
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, SendError, Sender},
        Mutex, PoisonError,
    },
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

use super::{TimeoutCallback, TimeoutHandler, TimerToken};
use crate::error::Result;

/// Countdown occupying the slot
struct Armed {
    token: TimerToken,
    callback: TimeoutCallback,
    deadline: Instant,
}

enum Command {
    Start(Armed),
    Stop(TimerToken),
}

/// Single-slot countdown driven by a dedicated worker thread
#[derive(Debug, Default)]
pub struct BackgroundTimeoutHandler {
    next_token: AtomicU64,
    worker: Mutex<Option<Sender<Command>>>,
}

impl BackgroundTimeoutHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn_worker() -> io::Result<Sender<Command>> {
        let (commands, received) = mpsc::channel();
        thread::Builder::new()
            .name("inactivity-timer".to_string())
            .spawn(move || run_worker(received))?;
        debug!("Background countdown worker started");
        Ok(commands)
    }
}

/// Worker loop: sleeps until the armed deadline or the next command.
/// Exits once the owning handler is dropped.
fn run_worker(commands: Receiver<Command>) {
    let mut armed: Option<Armed> = None;

    loop {
        let received = match &armed {
            Some(current) => commands.recv_timeout(current.deadline.saturating_duration_since(Instant::now())),
            None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Command::Start(next)) => {
                if let Some(previous) = armed.replace(next) {
                    debug!("Background {} stopped before expiry", previous.token);
                }
            }
            Ok(Command::Stop(token)) => {
                if armed.as_ref().is_some_and(|current| current.token == token) {
                    armed = None;
                    debug!("Cancelled background {}", token);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if let Some(expired) = armed.take() {
                    (expired.callback)();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("Background countdown worker stopped");
}

impl TimeoutHandler for BackgroundTimeoutHandler {
    fn schedule(&self, callback: TimeoutCallback, delay: Duration) -> Result<TimerToken> {
        let token = TimerToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let mut command = Command::Start(Armed {
            token,
            callback,
            deadline: Instant::now() + delay,
        });

        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(commands) = worker.as_ref() {
            match commands.send(command) {
                Ok(()) => {
                    debug!("Scheduled background {} in {}ms", token, delay.as_millis());
                    return Ok(token);
                }
                // The worker died with a panicking callback.
                Err(SendError(returned)) => {
                    warn!("Background countdown worker exited, restarting");
                    command = returned;
                }
            }
        }

        let commands = Self::spawn_worker()?;
        commands
            .send(command)
            .map_err(|_| io::Error::other("background countdown worker exited on start"))?;
        *worker = Some(commands);

        debug!("Scheduled background {} in {}ms", token, delay.as_millis());
        Ok(token)
    }

    fn cancel(&self, token: TimerToken) {
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(commands) = worker.as_ref() {
            let _ = commands.send(Command::Stop(token));
        }
    }
}
