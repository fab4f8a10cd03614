//! Failure payloads carried as rejection reasons.
//!
//! Continuations report failures by returning `Err(Value)`. When the failure
//! originates in Rust code rather than in a deliberate rejection, it is
//! wrapped in a [`Failure`] so downstream handlers can tell what happened.

use std::fmt;
use thiserror::Error;

/// The kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Raised explicitly by user code
    Raised,
    /// A continuation or job panicked
    Panic,
    /// A background work item failed
    Work,
    /// The API was misused, e.g. rejecting with a promise
    Usage,
}

impl FailureKind {
    /// Stable lowercase name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Raised => "raised",
            FailureKind::Panic => "panic",
            FailureKind::Work => "work",
            FailureKind::Usage => "usage",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured failure with a kind and a message.
///
/// # Examples
///
/// ```
/// use core_types::{Failure, FailureKind};
///
/// let failure = Failure::raised("baz");
/// assert_eq!(failure.kind, FailureKind::Raised);
/// assert_eq!(failure.to_string(), "raised: baz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    /// The kind of failure
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
}

impl Failure {
    /// Creates a failure of the given kind.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failure raised by user code.
    pub fn raised(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Raised, message)
    }

    /// Failure recovered from a panic.
    pub fn panic(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Panic, message)
    }

    /// Failure reported by a background job.
    pub fn work(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Work, message)
    }

    /// Failure caused by API misuse.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Usage, message)
    }
}
