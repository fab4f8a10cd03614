//! Reactor implementation.
//!
//! The reactor owns the single-threaded run loop that every promise is bound
//! to. Each iteration (turn) of the loop:
//! 1. Applies completions posted by background work and remote handles
//! 2. Runs the ticks that were queued when the turn started
//! 3. Repeats until stopped or idle
//!
//! The loop is idle when no ticks are queued, no background work is
//! outstanding and no [`Remote`] handle is alive.

use crate::bridge;
use crate::config::{ReactorBuilder, ReactorConfig};
use crate::deferred::Deferred;
use crate::error::{QError, QResult};
use crate::log::{LogRecord, LogSink};
use crate::remote::Remote;
use crate::task_queue::{Tick, TickQueue};
use crate::work::{self, Completion, Job, WorkPool};
use core_types::{Failure, Value};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Message posted to the loop from another thread.
pub(crate) enum Inbound {
    /// A background job finished
    Completed { id: u64, outcome: Completion },
    /// A remote handle asked for a callback on the loop thread
    Call(Box<dyn FnOnce(&Reactor) + Send>),
    /// A remote handle asked the given run to stop
    Stop { generation: u64 },
}

/// Run state visible to remote handles.
///
/// Every live [`Remote`] holds a clone, so the strong count is also the
/// number of handles keeping the loop awake.
#[derive(Default)]
pub(crate) struct RunGate {
    running: AtomicBool,
    generation: AtomicU64,
}

impl RunGate {
    /// Generation of the run in progress, `None` while the loop is not running.
    pub(crate) fn current(&self) -> Option<u64> {
        if self.running.load(Ordering::Acquire) {
            Some(self.generation.load(Ordering::Acquire))
        } else {
            None
        }
    }

    fn open(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.running.store(true, Ordering::Release);
    }

    fn close(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current() == Some(generation)
    }
}

struct Inner {
    config: ReactorConfig,
    ticks: RefCell<TickQueue>,
    turn: Cell<u64>,
    running: Cell<bool>,
    stopped: Cell<bool>,
    inbound_tx: Sender<Inbound>,
    inbound_rx: Receiver<Inbound>,
    pending_work: RefCell<HashMap<u64, Deferred>>,
    next_work_id: Cell<u64>,
    gate: Arc<RunGate>,
    log: LogSink,
    pool: WorkPool,
}

/// The single-threaded reactor.
///
/// A `Reactor` is a cheap, clonable handle; clones share the same loop.
/// Promises created through [`Reactor::defer`] schedule their continuations
/// on this reactor's tick queue, so nothing attached to a promise ever runs
/// in the same turn it was triggered from.
///
/// # Examples
///
/// ```
/// use q_runtime::Reactor;
/// use core_types::Value;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let reactor = Reactor::new();
/// let log = Rc::new(RefCell::new(vec![]));
///
/// let l = log.clone();
/// reactor
///     .run(move |reactor| {
///         let deferred = reactor.defer();
///         deferred.promise().then(move |value| {
///             l.borrow_mut().push(value);
///             Ok(Value::Nil)
///         });
///         deferred.resolve(Value::symbol("foo"));
///     })
///     .unwrap();
///
/// assert_eq!(*log.borrow(), vec![Value::symbol("foo")]);
/// ```
#[derive(Clone)]
pub struct Reactor {
    inner: Rc<Inner>,
}

/// Non-owning reference to a reactor held by promises.
#[derive(Clone)]
pub(crate) struct ReactorHandle {
    inner: Weak<Inner>,
}

impl ReactorHandle {
    pub(crate) fn upgrade(&self) -> Option<Reactor> {
        self.inner.upgrade().map(|inner| Reactor { inner })
    }
}

impl Reactor {
    /// Creates a reactor with the default configuration.
    pub fn new() -> Self {
        Self::from_valid_config(ReactorConfig::default())
    }

    /// Creates a reactor from a configuration, validating it first.
    ///
    /// # Errors
    ///
    /// Returns [`QError::InvalidConfig`] if the configuration fails validation.
    pub fn with_config(config: ReactorConfig) -> QResult<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    /// Returns a builder for a customised reactor.
    pub fn builder() -> ReactorBuilder {
        ReactorBuilder::new()
    }

    fn from_valid_config(config: ReactorConfig) -> Self {
        let (inbound_tx, inbound_rx) = channel::unbounded();
        let pool = WorkPool::new(config.work_threads, config.thread_name.clone());
        Self {
            inner: Rc::new(Inner {
                config,
                ticks: RefCell::new(TickQueue::new()),
                turn: Cell::new(0),
                running: Cell::new(false),
                stopped: Cell::new(false),
                inbound_tx,
                inbound_rx,
                pending_work: RefCell::new(HashMap::new()),
                next_work_id: Cell::new(0),
                gate: Arc::new(RunGate::default()),
                log: LogSink::default(),
                pool,
            }),
        }
    }

    /// The configuration this reactor was built with.
    pub fn config(&self) -> &ReactorConfig {
        &self.inner.config
    }

    pub(crate) fn handle(&self) -> ReactorHandle {
        ReactorHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Creates a fresh pending deferred bound to this reactor.
    pub fn defer(&self) -> Deferred {
        Deferred::from_handle(self.handle())
    }

    /// Queues `callback` to run on the next turn, after everything already
    /// queued.
    pub fn next_tick<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.schedule("next_tick", callback);
    }

    pub(crate) fn schedule<F>(&self, label: &'static str, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.inner.ticks.borrow_mut().push(Tick::new(label, callback));
    }

    /// Runs `job` on a background thread.
    ///
    /// The returned deferred is settled on the loop thread once the loop
    /// observes the job's completion: resolved with its value, or rejected
    /// with its failure. A panicking job rejects with a `Panic` failure.
    ///
    /// # Arguments
    ///
    /// * `job` - Closure run on a pool thread, producing a value or a failure
    ///
    /// # Returns
    ///
    /// A Deferred in the Pending state, settled when the job completes
    pub fn work<F, T>(&self, job: F) -> Deferred
    where
        F: FnOnce() -> Result<T, Failure> + Send + 'static,
        T: Into<Value> + Send + 'static,
    {
        let deferred = self.defer();
        let id = self.inner.next_work_id.get();
        self.inner.next_work_id.set(id + 1);

        let tx = self.inner.inbound_tx.clone();
        let task: Job = Box::new(move || {
            let outcome = work::run_job(job);
            if tx.send(Inbound::Completed { id, outcome }).is_err() {
                tracing::debug!(id, "reactor dropped before work completed");
            }
        });

        self.inner
            .pending_work
            .borrow_mut()
            .insert(id, deferred.clone());
        if let Err(err) = self.inner.pool.submit(task) {
            self.inner.pending_work.borrow_mut().remove(&id);
            deferred.reject_reason(Value::from(err));
        }
        deferred
    }

    /// Reports a failure that cannot travel down a promise chain.
    pub fn log(&self, error: &Value, context: &str) {
        self.inner.log.emit(&LogRecord {
            context: context.to_string(),
            error: error.clone(),
        });
    }

    /// Registers a listener for everything passed to [`Reactor::log`].
    pub fn on_log<F>(&self, listener: F)
    where
        F: Fn(&LogRecord) + 'static,
    {
        self.inner.log.subscribe(Rc::new(listener));
    }

    /// Returns a handle that can post callbacks to this loop from any thread.
    ///
    /// The loop keeps running while any clone of the handle is alive.
    pub fn remote(&self) -> Remote {
        Remote::new(self.inner.inbound_tx.clone(), self.inner.gate.clone())
    }

    /// Number of turns completed since the reactor was created.
    pub fn turn(&self) -> u64 {
        self.inner.turn.get()
    }

    /// Returns true while [`Reactor::run`] is executing.
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Runs `body`, then drives the loop until stopped or idle.
    ///
    /// # Errors
    ///
    /// Returns [`QError::AlreadyRunning`] if called from inside a running
    /// loop.
    pub fn run<F>(&self, body: F) -> QResult<()>
    where
        F: FnOnce(&Reactor),
    {
        if self.inner.running.replace(true) {
            return Err(QError::AlreadyRunning);
        }
        self.inner.stopped.set(false);
        self.inner.gate.open();
        tracing::debug!(turn = self.turn(), "reactor started");

        bridge::resume(self, "running reactor", || body(self));

        loop {
            self.drain_inbound();
            if self.inner.ticks.borrow().is_empty() {
                if !self.has_pending_sources() {
                    // a remote may have posted just before it was dropped
                    if self.inner.inbound_rx.is_empty() {
                        break;
                    }
                    continue;
                }
                self.wait_for_inbound();
                continue;
            }
            self.run_turn();
            if self.inner.stopped.get() {
                break;
            }
        }

        self.inner.gate.close();
        self.inner.running.set(false);
        self.inner.stopped.set(false);
        tracing::debug!(turn = self.turn(), "reactor stopped");
        Ok(())
    }

    /// Stops the loop once everything queued so far has run.
    ///
    /// No-op when the reactor is not running.
    pub fn stop(&self) {
        if !self.is_running() {
            return;
        }
        let handle = self.handle();
        self.schedule("stop", move || {
            if let Some(reactor) = handle.upgrade() {
                reactor.inner.stopped.set(true);
            }
        });
    }

    fn run_turn(&self) {
        let batch = self.inner.ticks.borrow_mut().take_batch();
        let turn = self.inner.turn.get() + 1;
        self.inner.turn.set(turn);
        tracing::trace!(turn, ticks = batch.len(), "running turn");

        for tick in batch {
            let label = tick.label();
            bridge::resume(self, label, move || tick.run());
        }
    }

    fn has_pending_sources(&self) -> bool {
        !self.inner.pending_work.borrow().is_empty() || Arc::strong_count(&self.inner.gate) > 1
    }

    fn drain_inbound(&self) {
        while let Ok(message) = self.inner.inbound_rx.try_recv() {
            self.dispatch(message);
        }
    }

    fn wait_for_inbound(&self) {
        match self
            .inner
            .inbound_rx
            .recv_timeout(self.inner.config.poll_interval())
        {
            Ok(message) => self.dispatch(message),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }
    }

    fn dispatch(&self, message: Inbound) {
        match message {
            Inbound::Completed { id, outcome } => {
                let deferred = self.inner.pending_work.borrow_mut().remove(&id);
                let Some(deferred) = deferred else {
                    tracing::warn!(id, "completion for unknown work item");
                    return;
                };
                bridge::resume(self, "completing work", move || match outcome {
                    Ok(convert) => deferred.resolve(convert()),
                    Err(failure) => deferred.reject_reason(Value::Error(failure)),
                });
            }
            Inbound::Call(callback) => {
                bridge::resume(self, "performing async callback", || callback(self));
            }
            Inbound::Stop { generation } => {
                if self.inner.gate.is_current(generation) {
                    self.stop();
                } else {
                    tracing::debug!(generation, "ignoring stop posted to an earlier run");
                }
            }
        }
    }
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Reactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactor")
            .field("turn", &self.inner.turn.get())
            .field("running", &self.inner.running.get())
            .field("queued_ticks", &self.inner.ticks.borrow().len())
            .field("pending_work", &self.inner.pending_work.borrow().len())
            .field("work_pool_started", &self.inner.pool.is_started())
            .field("log_listeners", &self.inner.log.len())
            .finish()
    }
}
