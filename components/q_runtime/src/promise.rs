//! Promise implementation.
//!
//! A [`Promise`] is the read side of a [`Deferred`]: it can be observed but
//! never settled directly. Observers attach continuations with
//! [`Promise::then`], [`Promise::catch`], [`Promise::finally`] and
//! [`Promise::progress`]; each attachment returns a new derived promise that
//! settles with whatever the continuation produces, forming a chain.
//!
//! Every continuation runs on a later turn of the owning reactor, never
//! inside the call that triggered it. That holds for continuations attached
//! to an already-settled promise too.

use crate::bridge;
use crate::deferred::Deferred;
use crate::reactor::{Reactor, ReactorHandle};
use core_types::{Failure, Thenable, Value};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem;
use std::rc::Rc;

/// What a continuation produces.
///
/// `Ok` resolves the derived promise (following it if the value is itself a
/// promise); `Err` rejects it with the given reason.
pub type Outcome = Result<Value, Value>;

type SettleFn = Box<dyn FnOnce(Value) -> Outcome>;
type ProgressFn = Rc<RefCell<dyn FnMut(Value) -> Outcome>>;

/// Snapshot of a promise's settlement state.
///
/// Transitions only from `Pending` to one of the terminal states, exactly
/// once.
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    /// Not settled yet
    Pending,
    /// Settled successfully with a value
    Resolved(Value),
    /// Settled with a rejection reason
    Rejected(Value),
}

/// Continuations for [`Promise::chain`].
///
/// Every handler is optional. A missing fulfilment or rejection handler
/// passes the parent's value or reason straight through to the derived
/// promise; a missing progress handler forwards notifications unchanged.
///
/// # Examples
///
/// ```
/// use q_runtime::{Handlers, Reactor};
/// use core_types::Value;
///
/// let reactor = Reactor::new();
/// let deferred = reactor.defer();
/// let derived = deferred.promise().chain(
///     Handlers::new()
///         .on_fulfilled(|v| Ok(v))
///         .on_progress(|update| Ok(update)),
/// );
/// assert!(derived.is_pending());
/// ```
#[derive(Default)]
pub struct Handlers {
    on_fulfilled: Option<SettleFn>,
    on_rejected: Option<SettleFn>,
    on_progress: Option<ProgressFn>,
}

impl Handlers {
    /// Handlers that pass everything through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler invoked with the resolution value.
    pub fn on_fulfilled<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Value) -> Outcome + 'static,
    {
        self.on_fulfilled = Some(Box::new(f));
        self
    }

    /// Sets the handler invoked with the rejection reason.
    pub fn on_rejected<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Value) -> Outcome + 'static,
    {
        self.on_rejected = Some(Box::new(f));
        self
    }

    /// Sets the observer invoked once per notification.
    ///
    /// `Ok(v)` forwards `v` to the derived promise's observers. `Err` stops
    /// this notification from travelling further down the chain and is
    /// reported to the reactor's log sink as `q_progress_cb`.
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: FnMut(Value) -> Outcome + 'static,
    {
        self.on_progress = Some(Rc::new(RefCell::new(f)));
        self
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("on_fulfilled", &self.on_fulfilled.is_some())
            .field("on_rejected", &self.on_rejected.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// A registered continuation together with the deferred it drives.
struct Subscriber {
    on_fulfilled: Option<SettleFn>,
    on_rejected: Option<SettleFn>,
    on_progress: Option<ProgressFn>,
    derived: Deferred,
}

impl Subscriber {
    fn fulfill(self, value: Value) {
        let outcome = match self.on_fulfilled {
            Some(callback) => bridge::guard(move || callback(value)),
            None => Ok(value),
        };
        self.derived.settle(outcome);
    }

    fn reject(self, reason: Value) {
        let outcome = match self.on_rejected {
            Some(callback) => bridge::guard(move || callback(reason)),
            None => Err(reason),
        };
        self.derived.settle(outcome);
    }

    fn listener(&self) -> Listener {
        Listener {
            on_progress: self.on_progress.clone(),
            derived: self.derived.clone(),
        }
    }
}

/// The progress half of a subscriber, captured when a notification is sent.
struct Listener {
    on_progress: Option<ProgressFn>,
    derived: Deferred,
}

impl Listener {
    fn deliver(&self, reactor: &Reactor, update: Value) {
        let forwarded = match &self.on_progress {
            None => update,
            Some(callback) => {
                let outcome = bridge::guard(|| {
                    let mut observer = callback.borrow_mut();
                    (*observer)(update)
                });
                match outcome {
                    Ok(value) => value,
                    Err(error) => {
                        reactor.log(&error, "q_progress_cb");
                        return;
                    }
                }
            }
        };
        self.derived.notify(forwarded);
    }
}

enum Slot {
    Pending(Vec<Subscriber>),
    /// Resolved with another promise; settles when that one does
    Following(Promise),
    Resolved(Value),
    Rejected(Value),
}

struct Shared {
    reactor: ReactorHandle,
    slot: RefCell<Slot>,
}

impl Drop for Shared {
    // Unlink follow chains iteratively; a promise loop can build chains far
    // deeper than the stack.
    fn drop(&mut self) {
        let mut next = match mem::replace(self.slot.get_mut(), Slot::Pending(Vec::new())) {
            Slot::Following(inner) => inner,
            _ => return,
        };
        loop {
            let Ok(mut shared) = Rc::try_unwrap(next.shared) else {
                return;
            };
            next = match mem::replace(shared.slot.get_mut(), Slot::Pending(Vec::new())) {
                Slot::Following(inner) => inner,
                _ => return,
            };
        }
    }
}

/// The read side of a deferred result.
///
/// Cloning a `Promise` yields another handle to the same settlement; any
/// number of consumers may attach continuations.
///
/// Promises carry no cancellation: a consumer that no longer cares about a
/// result simply drops its derived promise.
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
///         deferred
///             .promise()
///             .then(|_| Ok(Value::symbol("bar")))
///             .then(move |v| {
///                 l.borrow_mut().push(v);
///                 Ok(Value::Nil)
///             });
///         deferred.resolve(Value::symbol("foo"));
///     })
///     .unwrap();
///
/// assert_eq!(*log.borrow(), vec![Value::symbol("bar")]);
/// ```
#[derive(Clone)]
pub struct Promise {
    shared: Rc<Shared>,
}

impl Promise {
    pub(crate) fn new(reactor: ReactorHandle) -> Self {
        Self {
            shared: Rc::new(Shared {
                reactor,
                slot: RefCell::new(Slot::Pending(Vec::new())),
            }),
        }
    }

    /// Recovers a promise stored inside a value.
    ///
    /// Returns `None` for plain values and for thenables that are not
    /// promises of this engine.
    pub fn from_value(value: &Value) -> Option<Promise> {
        value
            .as_thenable()
            .and_then(|thenable| thenable.as_any().downcast_ref::<Promise>())
            .cloned()
    }

    /// Returns true if both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// The reactor this promise is bound to, if it is still alive.
    pub fn reactor(&self) -> Option<Reactor> {
        self.shared.reactor.upgrade()
    }

    /// Returns a snapshot of the settlement state.
    ///
    /// A promise following another promise reports that promise's state.
    pub fn state(&self) -> PromiseState {
        let mut current = self.clone();
        loop {
            let next = match &*current.shared.slot.borrow() {
                Slot::Pending(_) => return PromiseState::Pending,
                Slot::Resolved(value) => return PromiseState::Resolved(value.clone()),
                Slot::Rejected(reason) => return PromiseState::Rejected(reason.clone()),
                Slot::Following(inner) => inner.clone(),
            };
            current = next;
        }
    }

    /// Returns true until the promise has settled.
    pub fn is_pending(&self) -> bool {
        matches!(self.state(), PromiseState::Pending)
    }

    /// Attaches a general set of continuations and returns the derived
    /// promise.
    ///
    /// If this promise is still pending the handlers are registered and run
    /// in registration order once it settles. If it has already settled,
    /// the matching handler is scheduled for the next turn.
    ///
    /// # Arguments
    ///
    /// * `handlers` - Optional fulfilment, rejection and progress handlers
    ///
    /// # Returns
    ///
    /// A new Promise settled by whichever handler runs, or by this
    /// promise's outcome when no matching handler was given
    pub fn chain(&self, handlers: Handlers) -> Promise {
        let derived = Deferred::from_handle(self.shared.reactor.clone());
        self.subscribe(Subscriber {
            on_fulfilled: handlers.on_fulfilled,
            on_rejected: handlers.on_rejected,
            on_progress: handlers.on_progress,
            derived: derived.clone(),
        });
        derived.promise()
    }

    /// Attaches a success continuation.
    ///
    /// A rejection skips `on_fulfilled` and rejects the derived promise with
    /// the same reason.
    pub fn then<F>(&self, on_fulfilled: F) -> Promise
    where
        F: FnOnce(Value) -> Outcome + 'static,
    {
        self.chain(Handlers::new().on_fulfilled(on_fulfilled))
    }

    /// Attaches both a success and an error continuation.
    pub fn then_or<F, R>(&self, on_fulfilled: F, on_rejected: R) -> Promise
    where
        F: FnOnce(Value) -> Outcome + 'static,
        R: FnOnce(Value) -> Outcome + 'static,
    {
        self.chain(
            Handlers::new()
                .on_fulfilled(on_fulfilled)
                .on_rejected(on_rejected),
        )
    }

    /// Attaches an error continuation; values pass through untouched.
    ///
    /// Returning `Ok` from `on_rejected` recovers the chain.
    pub fn catch<R>(&self, on_rejected: R) -> Promise
    where
        R: FnOnce(Value) -> Outcome + 'static,
    {
        self.chain(Handlers::new().on_rejected(on_rejected))
    }

    /// Attaches a continuation that runs on settlement either way.
    ///
    /// The derived promise keeps the original outcome unless `on_settled`
    /// fails, in which case it rejects with the new reason. If `on_settled`
    /// returns a promise, the derived promise waits for it: success keeps
    /// the original outcome, failure rejects with the new reason.
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
    ///         deferred
    ///             .promise()
    ///             .finally(|| Ok(Value::symbol("ignored")))
    ///             .then(move |v| {
    ///                 l.borrow_mut().push(v);
    ///                 Ok(Value::Nil)
    ///             });
    ///         deferred.resolve(Value::symbol("foo"));
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(*log.borrow(), vec![Value::symbol("foo")]);
    /// ```
    pub fn finally<F>(&self, on_settled: F) -> Promise
    where
        F: FnOnce() -> Outcome + 'static,
    {
        let callback = Rc::new(Cell::new(Some(on_settled)));
        let on_rejected = callback.clone();
        self.chain(
            Handlers::new()
                .on_fulfilled(move |value| run_finally(callback.take(), Ok(value)))
                .on_rejected(move |reason| run_finally(on_rejected.take(), Err(reason))),
        )
    }

    /// Attaches a progress observer.
    ///
    /// The observer sees every notification sent while this promise is
    /// pending, each with the value passed to `notify`. What it returns is
    /// forwarded to the derived promise's observers.
    pub fn progress<P>(&self, on_notify: P) -> Promise
    where
        P: FnMut(Value) -> Outcome + 'static,
    {
        self.chain(Handlers::new().on_progress(on_notify))
    }

    fn subscribe(&self, subscriber: Subscriber) {
        enum Settled {
            Fulfilled(Value),
            Rejected(Value),
        }

        let mut target = self.clone();
        let settled = loop {
            let mut slot = target.shared.slot.borrow_mut();
            let followed = match &mut *slot {
                Slot::Pending(subscribers) => {
                    subscribers.push(subscriber);
                    return;
                }
                Slot::Following(inner) => inner.clone(),
                Slot::Resolved(value) => break Settled::Fulfilled(value.clone()),
                Slot::Rejected(reason) => break Settled::Rejected(reason.clone()),
            };
            drop(slot);
            target = followed;
        };

        match settled {
            Settled::Fulfilled(value) => {
                self.schedule("q_resolve", move || subscriber.fulfill(value))
            }
            Settled::Rejected(reason) => {
                self.schedule("q_reject", move || subscriber.reject(reason))
            }
        }
    }

    fn schedule<F>(&self, label: &'static str, callback: F)
    where
        F: FnOnce() + 'static,
    {
        match self.shared.reactor.upgrade() {
            Some(reactor) => reactor.schedule(label, callback),
            None => tracing::debug!(label, "reactor dropped, continuation discarded"),
        }
    }

    /// Leaves `Pending` for `next`, returning the subscribers to run.
    ///
    /// Returns `None` if the promise had already left `Pending`.
    fn transition(&self, next: Slot) -> Option<Vec<Subscriber>> {
        let mut slot = self.shared.slot.borrow_mut();
        if !matches!(*slot, Slot::Pending(_)) {
            return None;
        }
        match mem::replace(&mut *slot, next) {
            Slot::Pending(subscribers) => Some(subscribers),
            _ => None,
        }
    }

    pub(crate) fn resolve_with(&self, value: Value) {
        if let Some(inner) = Promise::from_value(&value) {
            if self.reached_through(&inner) {
                self.reject_with(Value::Error(Failure::usage(
                    "a promise cannot be resolved with itself",
                )));
                return;
            }
            self.follow(inner);
            return;
        }

        let Some(subscribers) = self.transition(Slot::Resolved(value.clone())) else {
            return;
        };
        if subscribers.is_empty() {
            return;
        }
        self.schedule("q_resolve", move || {
            for subscriber in subscribers {
                subscriber.fulfill(value.clone());
            }
        });
    }

    /// True if `other` is this promise or ends up following it.
    fn reached_through(&self, other: &Promise) -> bool {
        let mut current = other.clone();
        loop {
            if current.ptr_eq(self) {
                return true;
            }
            let next = match &*current.shared.slot.borrow() {
                Slot::Following(inner) => inner.clone(),
                _ => return false,
            };
            current = next;
        }
    }

    /// The promise at the end of this promise's follow chain.
    fn last_followed(&self) -> Promise {
        let mut current = self.clone();
        loop {
            let next = match &*current.shared.slot.borrow() {
                Slot::Following(inner) => inner.clone(),
                _ => return current.clone(),
            };
            current = next;
        }
    }

    /// Locks this promise onto the end of `inner`'s follow chain, moving
    /// every subscriber there.
    fn follow(&self, inner: Promise) {
        let target = inner.last_followed();
        let Some(subscribers) = self.transition(Slot::Following(target.clone())) else {
            return;
        };
        for subscriber in subscribers {
            target.subscribe(subscriber);
        }
    }

    /// Rejects without the thenable check; callers guarantee `reason` is
    /// not a promise.
    pub(crate) fn reject_with(&self, reason: Value) {
        let Some(subscribers) = self.transition(Slot::Rejected(reason.clone())) else {
            return;
        };
        if subscribers.is_empty() {
            return;
        }
        self.schedule("q_reject", move || {
            for subscriber in subscribers {
                subscriber.reject(reason.clone());
            }
        });
    }

    pub(crate) fn notify_with(&self, update: Value) {
        // Listeners are captured now: anything registered after this call,
        // in this turn or a later one, does not see this notification.
        let listeners: Vec<Listener> = match &*self.shared.slot.borrow() {
            Slot::Pending(subscribers) => subscribers.iter().map(Subscriber::listener).collect(),
            _ => return,
        };
        if listeners.is_empty() {
            return;
        }

        let handle = self.shared.reactor.clone();
        self.schedule("q_notify", move || {
            let Some(reactor) = handle.upgrade() else {
                return;
            };
            for listener in &listeners {
                listener.deliver(&reactor, update.clone());
            }
        });
    }
}

fn run_finally<F>(callback: Option<F>, original: Outcome) -> Outcome
where
    F: FnOnce() -> Outcome,
{
    let Some(callback) = callback else {
        return original;
    };
    let produced = callback()?;
    match Promise::from_value(&produced) {
        Some(pending) => Ok(pending.then(move |_| original).into()),
        None => original,
    }
}

impl Thenable for Promise {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        let state = match self.state() {
            PromiseState::Pending => "pending",
            PromiseState::Resolved(_) => "resolved",
            PromiseState::Rejected(_) => "rejected",
        };
        format!("Promise({})", state)
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Value::Thenable(Rc::new(promise))
    }
}

impl From<&Promise> for Value {
    fn from(promise: &Promise) -> Self {
        Value::Thenable(Rc::new(promise.clone()))
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.state())
            .finish()
    }
}
