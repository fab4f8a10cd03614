//! Background work pool.
//!
//! Jobs run on a small pool of OS threads started on first use. A job never
//! touches promise state: it produces a [`Completion`] which the worker
//! sends back to the reactor, and the reactor settles the matching deferred
//! on the loop thread.

use crate::bridge::panic_message;
use crate::error::{QError, QResult};
use core_types::{Failure, Value};
use crossbeam::channel::{self, Receiver, Sender};
use std::cell::{OnceCell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

/// A job queued on the pool.
pub(crate) type Job = Box<dyn FnOnce() + Send>;

/// Result of a finished job, converted to a [`Value`] on the loop thread.
pub(crate) type Completion = Result<Box<dyn FnOnce() -> Value + Send>, Failure>;

/// Runs a user job, capturing a panic as a `Panic` failure.
pub(crate) fn run_job<F, T>(job: F) -> Completion
where
    F: FnOnce() -> Result<T, Failure>,
    T: Into<Value> + Send + 'static,
{
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(Ok(value)) => Ok(Box::new(move || value.into())),
        Ok(Err(failure)) => Err(failure),
        Err(payload) => Err(Failure::panic(panic_message(payload.as_ref()))),
    }
}

pub(crate) struct WorkPool {
    threads: usize,
    thread_name: String,
    jobs: OnceCell<Sender<Job>>,
    workers: RefCell<Vec<JoinHandle<()>>>,
}

impl WorkPool {
    pub(crate) fn new(threads: usize, thread_name: impl Into<String>) -> Self {
        Self {
            threads,
            thread_name: thread_name.into(),
            jobs: OnceCell::new(),
            workers: RefCell::new(Vec::new()),
        }
    }

    /// Queues a job, starting the worker threads if needed.
    pub(crate) fn submit(&self, job: Job) -> QResult<()> {
        let sender = match self.jobs.get() {
            Some(sender) => sender,
            None => {
                let sender = self.start()?;
                self.jobs.get_or_init(|| sender)
            }
        };
        sender.send(job).map_err(|_| QError::ReactorGone)
    }

    pub(crate) fn is_started(&self) -> bool {
        self.jobs.get().is_some()
    }

    fn start(&self) -> QResult<Sender<Job>> {
        let (sender, receiver) = channel::unbounded::<Job>();
        let mut workers = self.workers.borrow_mut();
        for index in 0..self.threads {
            let jobs = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", self.thread_name, index))
                .spawn(move || worker_loop(jobs))
                .map_err(QError::Spawn)?;
            workers.push(handle);
        }
        tracing::debug!(threads = self.threads, name = %self.thread_name, "work pool started");
        Ok(sender)
    }
}

fn worker_loop(jobs: Receiver<Job>) {
    for job in jobs.iter() {
        job();
    }
}

impl Drop for WorkPool {
    fn drop(&mut self) {
        // Closing the channel lets idle workers exit.
        drop(self.jobs.take());
        for handle in self.workers.get_mut().drain(..) {
            if handle.join().is_err() {
                tracing::warn!("work thread exited with a panic");
            }
        }
    }
}
