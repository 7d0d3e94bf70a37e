//! Deferred-task scheduling interface.
//!
//! Promise reactions never run inside the call that registers or settles
//! them; they are handed to a [`TaskScheduler`]. Any FIFO queue that runs its
//! tasks after the current synchronous unit of work satisfies the contract.

use crate::config::RuntimeConfig;
use crate::task_queue::{MicroTask, MicrotaskQueue};
use core_types::Value;
use std::fmt;
use std::rc::Rc;

/// Accepts deferred tasks.
///
/// Implementations must run enqueued tasks in FIFO order, after the current
/// synchronous execution unit completes and before any lower-priority task.
pub trait TaskScheduler {
    /// Enqueues a task for deferred execution.
    fn enqueue(&self, task: MicroTask);
}

impl TaskScheduler for MicrotaskQueue {
    fn enqueue(&self, task: MicroTask) {
        MicrotaskQueue::enqueue(self, task);
    }
}

/// What a promise needs from its environment: somewhere to defer reactions
/// and the runtime configuration.
///
/// Derived promises inherit the host of the promise they were chained from.
#[derive(Clone)]
pub struct PromiseHost {
    scheduler: Rc<dyn TaskScheduler>,
    config: Rc<RuntimeConfig>,
}

impl PromiseHost {
    /// Creates a host from a scheduler and config.
    pub fn new(scheduler: Rc<dyn TaskScheduler>, config: RuntimeConfig) -> Self {
        Self {
            scheduler,
            config: Rc::new(config),
        }
    }

    /// Creates a host backed by the given microtask queue.
    pub fn with_queue(queue: MicrotaskQueue, config: RuntimeConfig) -> Self {
        Self::new(Rc::new(queue), config)
    }

    /// The runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Defers `f` through the scheduler.
    pub(crate) fn defer<F>(&self, f: F)
    where
        F: FnOnce() + 'static,
    {
        self.scheduler.enqueue(MicroTask::new(move || {
            f();
            Ok(Value::Undefined)
        }));
    }
}

impl fmt::Debug for PromiseHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseHost")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
