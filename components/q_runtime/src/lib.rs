//! Single-threaded reactor with a deferred/promise engine.
//!
//! This crate provides the asynchronous result composition layer:
//! - A reactor that drains a tick queue once per turn
//! - Deferreds and promises with chaining, recovery and progress
//! - Combinators over collections of promises
//! - A background work pool whose completions are marshalled back onto the
//!   loop thread
//!
//! # Overview
//!
//! - [`Reactor`] - Run loop, deferred factory and log sink
//! - [`Deferred`] - Write side: settles a promise exactly once
//! - [`Promise`] - Read side: `then`, `catch`, `finally`, `progress`
//! - [`all`], [`reject`], [`resolved`] - Combinators and constructors
//! - [`Remote`] - Cross-thread wake-up handle
//!
//! Nothing attached to a promise runs inside the call that triggered it;
//! every continuation is queued for a later turn.
//!
//! # Examples
//!
//! ## Chaining
//!
//! ```
//! use q_runtime::Reactor;
//! use core_types::Value;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let reactor = Reactor::new();
//! let log = Rc::new(RefCell::new(vec![]));
//!
//! let l = log.clone();
//! reactor
//!     .run(move |reactor| {
//!         let deferred = reactor.defer();
//!         deferred
//!             .promise()
//!             .then(|_| Err(Value::error("boom")))
//!             .then(|_| Ok(Value::symbol("skipped")))
//!             .catch(move |reason| {
//!                 l.borrow_mut().push(reason);
//!                 Ok(Value::Nil)
//!             });
//!         deferred.resolve(Value::symbol("foo"));
//!     })
//!     .unwrap();
//!
//! assert_eq!(*log.borrow(), vec![Value::error("boom")]);
//! ```
//!
//! ## Background Work
//!
//! ```
//! use q_runtime::{PromiseState, Reactor};
//! use core_types::Value;
//!
//! let reactor = Reactor::new();
//! let mut promise = None;
//! reactor
//!     .run(|reactor| {
//!         promise = Some(reactor.work(|| Ok(6 * 7)).promise());
//!     })
//!     .unwrap();
//!
//! assert_eq!(
//!     promise.map(|p| p.state()),
//!     Some(PromiseState::Resolved(Value::Integer(42)))
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bridge;
pub mod combinators;
pub mod config;
pub mod deferred;
pub mod error;
pub mod log;
pub mod promise;
pub mod reactor;
pub mod remote;
pub mod task_queue;
mod work;

// Re-export main types at crate root
pub use combinators::{all, reject, resolved};
pub use config::{ReactorBuilder, ReactorConfig};
pub use deferred::Deferred;
pub use error::{QError, QResult};
pub use log::LogRecord;
pub use promise::{Handlers, Outcome, Promise, PromiseState};
pub use reactor::Reactor;
pub use remote::Remote;
pub use task_queue::{Tick, TickQueue};
