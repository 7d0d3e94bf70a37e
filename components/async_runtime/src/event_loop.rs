//! Event loop implementation.
//!
//! This module provides the main event loop that coordinates task and microtask
//! execution following the JavaScript event loop model. It is also the
//! default [`TaskScheduler`](crate::TaskScheduler) for promises.

use crate::config::RuntimeConfig;
use crate::promise::{Deferred, Promise, ResolvingFunctions};
use crate::scheduler::PromiseHost;
use crate::task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue};
use core_types::{JsError, JsResult, Value};
use tracing::trace;

/// The JavaScript event loop.
///
/// Each iteration (turn) of the loop:
/// 1. Takes the oldest task from the task queue and executes it
/// 2. Drains all microtasks, including ones enqueued while draining
/// 3. Repeats
///
/// Promise reactions are microtasks, so they always run before the next
/// task.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Task};
/// use core_types::Value;
///
/// let mut event_loop = EventLoop::new();
///
/// event_loop.enqueue_task(Task::new(|| Ok(Value::Undefined)));
/// event_loop.run_until_done().unwrap();
/// ```
#[derive(Debug)]
pub struct EventLoop {
    task_queue: TaskQueue,
    microtask_queue: MicrotaskQueue,
    host: PromiseHost,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues and default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Creates a new EventLoop whose promises use `config`.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let microtask_queue = MicrotaskQueue::new();
        let host = PromiseHost::with_queue(microtask_queue.clone(), config);
        Self {
            task_queue: TaskQueue::new(),
            microtask_queue,
            host,
        }
    }

    /// The host promises created on this loop share.
    pub fn host(&self) -> PromiseHost {
        self.host.clone()
    }

    /// The runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        self.host.config()
    }

    /// Creates a promise, running `executor` synchronously.
    pub fn promise<F>(&self, executor: F) -> Promise
    where
        F: FnOnce(ResolvingFunctions) -> JsResult<()>,
    {
        Promise::new(self.host(), executor)
    }

    /// Returns a promise resolved with `value`.
    pub fn resolved(&self, value: impl Into<Value>) -> Promise {
        Promise::resolved(self.host(), value)
    }

    /// Returns a promise rejected with `reason`.
    pub fn rejected(&self, reason: impl Into<Value>) -> Promise {
        Promise::rejected(self.host(), reason)
    }

    /// Returns a pending promise with external resolve/reject.
    pub fn deferred(&self) -> Deferred {
        Promise::deferred(self.host())
    }

    /// Runs the event loop until all tasks and microtasks are processed.
    ///
    /// # Returns
    ///
    /// `Ok(())` if all tasks completed successfully, or an error if any task failed.
    pub fn run_until_done(&mut self) -> Result<(), JsError> {
        // Microtasks queued before the first task run first.
        self.run_all_microtasks()?;
        while !self.task_queue.is_empty() || !self.microtask_queue.is_empty() {
            self.process_one_cycle()?;
        }

        Ok(())
    }

    /// Adds a task to the task queue.
    ///
    /// The task will be executed in the next available iteration of the event loop.
    pub fn enqueue_task(&mut self, task: Task) {
        self.task_queue.enqueue(task);
    }

    /// Adds a microtask to the microtask queue.
    ///
    /// The microtask will be executed after the current task completes.
    pub fn enqueue_microtask(&self, microtask: MicroTask) {
        self.microtask_queue.enqueue(microtask);
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.task_queue.is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.microtask_queue.is_empty()
    }

    /// Runs all microtasks in the queue until empty.
    ///
    /// This drains the microtask queue completely. New microtasks added during
    /// execution will also be processed before this method returns.
    pub fn run_all_microtasks(&mut self) -> Result<(), JsError> {
        let mut ran = 0usize;
        while let Some(microtask) = self.microtask_queue.dequeue() {
            microtask.run()?;
            ran += 1;
        }
        if ran > 0 {
            trace!(microtasks = ran, "microtask checkpoint");
        }
        Ok(())
    }

    /// Processes one complete cycle: one task followed by all microtasks.
    ///
    /// This represents one iteration of the event loop.
    pub fn process_one_cycle(&mut self) -> Result<(), JsError> {
        // Execute one task if available
        if let Some(task) = self.task_queue.dequeue() {
            task.run()?;
        }

        // Drain all microtasks
        self.run_all_microtasks()
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}
