//! Deferred: the write side of a promise.

use crate::error::{QError, QResult};
use crate::promise::{Outcome, Promise};
use crate::reactor::ReactorHandle;
use core_types::{Failure, Value};

/// The write-capable handle that settles a promise exactly once.
///
/// Only the first `resolve` or `reject` takes effect; later calls are
/// silently ignored. `notify` may be called any number of times before
/// settlement and is ignored afterwards.
///
/// # Examples
///
/// ```
/// use q_runtime::{PromiseState, Reactor};
/// use core_types::Value;
///
/// let reactor = Reactor::new();
/// let deferred = reactor.defer();
///
/// deferred.resolve(Value::symbol("foo"));
/// deferred.reject(Value::symbol("bar")).unwrap();
///
/// assert_eq!(
///     deferred.promise().state(),
///     PromiseState::Resolved(Value::symbol("foo"))
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Deferred {
    promise: Promise,
}

impl Deferred {
    pub(crate) fn from_handle(reactor: ReactorHandle) -> Self {
        Self {
            promise: Promise::new(reactor),
        }
    }

    /// The promise this deferred settles.
    pub fn promise(&self) -> Promise {
        self.promise.clone()
    }

    /// Resolves the promise.
    ///
    /// If `value` is itself a promise, this deferred follows it instead:
    /// it settles however that promise settles, and its observers receive
    /// that promise's notifications. Resolving a deferred with its own
    /// promise rejects it with a usage failure.
    ///
    /// # Arguments
    ///
    /// * `value` - The value to fulfill the promise with, or a promise to follow
    pub fn resolve(&self, value: impl Into<Value>) {
        self.promise.resolve_with(value.into());
    }

    /// Rejects the promise with `reason`.
    ///
    /// # Arguments
    ///
    /// * `reason` - The rejection reason; must not be a promise
    ///
    /// # Errors
    ///
    /// Returns [`QError::ThenableReason`] if `reason` is a promise, whether
    /// or not the deferred has settled already.
    pub fn reject(&self, reason: impl Into<Value>) -> QResult<()> {
        let reason = reason.into();
        if reason.is_thenable() {
            return Err(QError::ThenableReason);
        }
        self.promise.reject_with(reason);
        Ok(())
    }

    /// Sends a progress update to the observers registered so far.
    pub fn notify(&self, update: impl Into<Value>) {
        self.promise.notify_with(update.into());
    }

    /// Returns true once the promise has resolved or rejected.
    pub fn is_settled(&self) -> bool {
        !self.promise.is_pending()
    }

    /// Rejects with a reason already known not to be a promise.
    pub(crate) fn reject_reason(&self, reason: Value) {
        debug_assert!(!reason.is_thenable());
        self.promise.reject_with(reason);
    }

    /// Feeds a continuation's outcome into this deferred.
    pub(crate) fn settle(&self, outcome: Outcome) {
        match outcome {
            Ok(value) => self.promise.resolve_with(value),
            Err(reason) if reason.is_thenable() => {
                // A continuation cannot reject with an awaitable either.
                self.promise
                    .reject_with(Value::Error(Failure::usage(QError::ThenableReason.to_string())));
            }
            Err(reason) => self.promise.reject_with(reason),
        }
    }
}
