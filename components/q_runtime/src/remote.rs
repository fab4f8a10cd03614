//! Cross-thread handle to a reactor.

use crate::error::{QError, QResult};
use crate::reactor::{Inbound, Reactor, RunGate};
use crossbeam::channel::Sender;
use std::fmt;
use std::sync::Arc;

/// A `Send + Sync` handle for waking a reactor from another thread.
///
/// Callbacks posted through [`Remote::schedule`] run on the loop thread at
/// the start of the next turn, each as an independent unit: a panic is
/// logged under `performing async callback` and the loop carries on.
///
/// While any clone of a `Remote` is alive the reactor's loop does not treat
/// itself as idle.
///
/// [`Remote::stop`] only affects a run that is in progress when it is called;
/// a stop posted while the loop is not running is dropped.
///
/// # Examples
///
/// ```
/// use q_runtime::Reactor;
/// use std::thread;
///
/// let reactor = Reactor::new();
/// reactor
///     .run(|reactor| {
///         let remote = reactor.remote();
///         thread::spawn(move || {
///             remote.schedule(|reactor| reactor.stop()).unwrap();
///         });
///     })
///     .unwrap();
///
/// assert!(!reactor.is_running());
/// ```
#[derive(Clone)]
pub struct Remote {
    tx: Sender<Inbound>,
    gate: Arc<RunGate>,
}

impl Remote {
    pub(crate) fn new(tx: Sender<Inbound>, gate: Arc<RunGate>) -> Self {
        Self { tx, gate }
    }

    /// Posts `callback` to run on the loop thread.
    ///
    /// # Errors
    ///
    /// Returns [`QError::ReactorGone`] if the reactor has been dropped.
    pub fn schedule<F>(&self, callback: F) -> QResult<()>
    where
        F: FnOnce(&Reactor) + Send + 'static,
    {
        self.tx
            .send(Inbound::Call(Box::new(callback)))
            .map_err(|_| QError::ReactorGone)
    }

    /// Asks the current run to stop, as [`Reactor::stop`] would from inside it.
    ///
    /// No-op when the reactor is not running. A stop that reaches the loop
    /// after the run it was meant for has ended is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`QError::ReactorGone`] if the reactor has been dropped while
    /// running.
    pub fn stop(&self) -> QResult<()> {
        let Some(generation) = self.gate.current() else {
            return Ok(());
        };
        self.tx
            .send(Inbound::Stop { generation })
            .map_err(|_| QError::ReactorGone)
    }
}

impl fmt::Debug for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Remote {{ ... }}")
    }
}
