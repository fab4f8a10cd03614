//! Error types for reactor and promise operations.

use core_types::{Failure, Value};
use thiserror::Error;

/// Errors reported by the reactor and the promise engine.
///
/// These are programming or environment errors, distinct from the
/// application-level reasons a promise is rejected with.
#[derive(Debug, Error)]
pub enum QError {
    /// `reject` was called with an awaitable value
    #[error("rejection reason must not be a promise")]
    ThenableReason,

    /// `run` was called on a reactor that is already running
    #[error("reactor is already running")]
    AlreadyRunning,

    /// The reactor behind a handle has been dropped
    #[error("reactor has shut down")]
    ReactorGone,

    /// A configuration value is out of range
    #[error("invalid reactor configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be parsed
    #[error("failed to parse reactor configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A background work thread could not be started
    #[error("failed to spawn work thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl From<QError> for Value {
    fn from(err: QError) -> Self {
        let failure = match err {
            QError::ReactorGone | QError::Spawn(_) => Failure::work(err.to_string()),
            _ => Failure::usage(err.to_string()),
        };
        Value::Error(failure)
    }
}

/// Result type for reactor operations
pub type QResult<T> = Result<T, QError>;
