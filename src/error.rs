//! Error types for mounting and driving an inactivity region

/// Errors surfaced while mounting a region or scheduling a countdown
#[derive(Debug, thiserror::Error)]
pub enum InactivityError {
    /// The region was mounted without an `on_action` callback
    #[error("an on_action callback is required to mount an inactivity region")]
    MissingActionCallback,

    /// A tokio-backed component was created outside of a runtime
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// A background countdown thread could not be started
    #[error("failed to spawn countdown thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// A duration that the host layer refuses to forward to the core
    #[error("invalid inactivity duration: {0}ms")]
    InvalidDuration(u64),
}

pub type Result<T> = std::result::Result<T, InactivityError>;
