//! Promise combinators.

use crate::error::{QError, QResult};
use crate::promise::Promise;
use crate::reactor::Reactor;
use core_types::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Combines promises into one that resolves with every result, in input
/// order.
///
/// The combined promise rejects with the first rejection reason it sees.
/// Inputs still pending at that point are left alone: there is no
/// cancellation, their later settlements are simply ignored. An empty
/// input resolves with an empty list on the next turn.
///
/// # Arguments
///
/// * `reactor` - The reactor the combined promise is bound to
/// * `promises` - The promises to wait for
///
/// # Returns
///
/// A new Promise resolving with a `Value::List` of the results
///
/// # Examples
///
/// ```
/// use q_runtime::{all, Reactor};
/// use core_types::Value;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let reactor = Reactor::new();
/// let result = Rc::new(RefCell::new(Value::Nil));
///
/// let r = result.clone();
/// reactor
///     .run(move |reactor| {
///         let first = reactor.defer();
///         let second = reactor.defer();
///         all(reactor, [first.promise(), second.promise()]).then(move |v| {
///             *r.borrow_mut() = v;
///             Ok(Value::Nil)
///         });
///         second.resolve(2);
///         first.resolve(1);
///     })
///     .unwrap();
///
/// assert_eq!(*result.borrow(), Value::List(vec![1.into(), 2.into()]));
/// ```
pub fn all<I>(reactor: &Reactor, promises: I) -> Promise
where
    I: IntoIterator<Item = Promise>,
{
    let promises: Vec<Promise> = promises.into_iter().collect();
    let combined = reactor.defer();

    if promises.is_empty() {
        combined.resolve(Value::List(Vec::new()));
        return combined.promise();
    }

    let results = Rc::new(RefCell::new(vec![Value::Nil; promises.len()]));
    let remaining = Rc::new(Cell::new(promises.len()));

    for (index, promise) in promises.iter().enumerate() {
        let results = results.clone();
        let remaining = remaining.clone();
        let on_value = combined.clone();
        let on_reason = combined.clone();
        promise.then_or(
            move |value| {
                results.borrow_mut()[index] = value.clone();
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    let collected = results.take();
                    on_value.resolve(Value::List(collected));
                }
                Ok(value)
            },
            move |reason| {
                on_reason.reject_reason(reason.clone());
                Err(reason)
            },
        );
    }

    combined.promise()
}

/// Returns a promise already rejected with `reason`.
///
/// Continuations attached to it still run on a later turn.
///
/// # Errors
///
/// Returns [`QError::ThenableReason`] if `reason` is a promise.
pub fn reject(reactor: &Reactor, reason: impl Into<Value>) -> QResult<Promise> {
    let reason = reason.into();
    if reason.is_thenable() {
        return Err(QError::ThenableReason);
    }
    let deferred = reactor.defer();
    deferred.reject_reason(reason);
    Ok(deferred.promise())
}

/// Returns a promise resolved with `value`.
///
/// A promise passed as `value` is followed rather than wrapped.
pub fn resolved(reactor: &Reactor, value: impl Into<Value>) -> Promise {
    let deferred = reactor.defer();
    deferred.resolve(value);
    deferred.promise()
}
