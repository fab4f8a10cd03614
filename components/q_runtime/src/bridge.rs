//! Boundary between reactor dispatch and user code.
//!
//! Every callback the reactor hands control to (ticks, completed work,
//! remote calls, the run body) executes as an independent unit through
//! [`resume`]. The unit always runs to completion on the loop thread; a
//! panic is captured here and reported to the reactor's log sink so the
//! dispatch loop keeps going.
//!
//! Continuations whose failure has somewhere to go (a derived promise) use
//! [`guard`] instead, which turns a panic into a rejection reason.

use crate::promise::Outcome;
use crate::reactor::Reactor;
use core_types::{Failure, Value};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Runs `f` to completion, logging a panic under `context`.
///
/// Returns `None` if `f` panicked.
pub(crate) fn resume<F, R>(reactor: &Reactor, context: &str, f: F) -> Option<R>
where
    F: FnOnce() -> R,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => Some(result),
        Err(payload) => {
            let failure = Failure::panic(panic_message(payload.as_ref()));
            reactor.log(&Value::Error(failure), context);
            None
        }
    }
}

/// Runs a continuation, mapping a panic to a `Panic` failure.
pub(crate) fn guard<F>(f: F) -> Outcome
where
    F: FnOnce() -> Outcome,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(Value::Error(Failure::panic(panic_message(payload.as_ref()))))
    })
}

/// Extracts the message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
