//! Log sink for failures that have no rejection path.
//!
//! Failures raised inside progress observers, ticks, remote calls or the run
//! body cannot reach a promise chain. The reactor records them here: each
//! one is emitted as a `tracing` error event and handed to every listener
//! registered with [`Reactor::on_log`](crate::Reactor::on_log).

use crate::bridge::panic_message;
use core_types::Value;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// A failure reported to the reactor's log sink.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Stable label for where the failure happened, e.g. `q_progress_cb`
    pub context: String,
    /// The failure value
    pub error: Value,
}

type Listener = Rc<dyn Fn(&LogRecord)>;

#[derive(Default)]
pub(crate) struct LogSink {
    listeners: RefCell<Vec<Listener>>,
}

impl LogSink {
    pub(crate) fn subscribe(&self, listener: Listener) {
        self.listeners.borrow_mut().push(listener);
    }

    pub(crate) fn emit(&self, record: &LogRecord) {
        tracing::error!(
            context = %record.context,
            error = %record.error,
            "unhandled error in reactor callback"
        );

        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            // never re-logged through the sink
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(record))) {
                tracing::warn!(
                    panic = %panic_message(payload.as_ref()),
                    "log listener panicked"
                );
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.borrow().len()
    }
}
