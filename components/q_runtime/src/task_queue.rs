//! Next-tick queue.
//!
//! Every continuation the promise engine schedules lands here as a [`Tick`].
//! The reactor drains the queue one turn at a time: a turn runs the ticks
//! that were queued when it started, and anything queued while it runs waits
//! for the following turn.

use std::collections::VecDeque;

/// A unit of work deferred to a later turn.
///
/// The label names the kind of work and is reported to the log sink if the
/// tick panics.
pub struct Tick {
    label: &'static str,
    callback: Box<dyn FnOnce()>,
}

impl Tick {
    /// Creates a new Tick from a closure.
    ///
    /// # Arguments
    ///
    /// * `label` - Context reported if the closure panics
    /// * `f` - The closure to run when the tick is dispatched
    pub fn new<F>(label: &'static str, f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            label,
            callback: Box::new(f),
        }
    }

    /// The label given at creation.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Executes the tick.
    pub fn run(self) {
        (self.callback)()
    }
}

impl std::fmt::Debug for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tick {{ label: {:?} }}", self.label)
    }
}

/// FIFO queue of ticks.
#[derive(Debug, Default)]
pub struct TickQueue {
    queue: VecDeque<Tick>,
}

impl TickQueue {
    /// Creates a new empty TickQueue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Adds a tick to the end of the queue.
    pub fn push(&mut self, tick: Tick) {
        self.queue.push_back(tick);
    }

    /// Takes every tick currently queued, leaving the queue empty.
    ///
    /// Ticks pushed after this call belong to the next batch.
    pub fn take_batch(&mut self) -> VecDeque<Tick> {
        std::mem::take(&mut self.queue)
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of ticks in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
