//! Task and microtask queue management.
//!
//! Tasks and microtasks are the same kind of deferred job; what differs is
//! the queue they wait in. The event loop runs one task, then drains every
//! microtask, including microtasks enqueued while draining.

use core_types::{JsError, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A deferred unit of work.
///
/// Returns `Err` only for host-level failures; promise jobs contain their
/// errors as rejections and always succeed.
pub struct Job {
    callback: Box<dyn FnOnce() -> Result<Value, JsError>>,
}

/// A job in the task queue (timers, I/O callbacks, embedder work).
pub type Task = Job;

/// A job in the microtask queue; promise reactions are microtasks.
pub type MicroTask = Job;

impl Job {
    /// Wraps a closure as a job.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<Value, JsError> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Consumes the job and runs it.
    pub fn run(self) -> Result<Value, JsError> {
        (self.callback)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Job { .. }")
    }
}

/// FIFO queue of tasks, owned by the event loop.
#[derive(Debug, Default)]
pub struct TaskQueue {
    queue: VecDeque<Task>,
}

impl TaskQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task.
    pub fn enqueue(&mut self, task: Task) {
        self.queue.push_back(task);
    }

    /// Takes the oldest task.
    pub fn dequeue(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    /// Returns true when no task is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of waiting tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

/// A shared FIFO queue for microtasks.
///
/// Cloning the queue yields another handle to the same underlying storage,
/// so promises can keep a handle and enqueue reactions while the event loop
/// drains it. The borrow is never held while a microtask runs, which lets
/// running microtasks enqueue more work.
#[derive(Debug, Default, Clone)]
pub struct MicrotaskQueue {
    queue: Rc<RefCell<VecDeque<MicroTask>>>,
}

impl MicrotaskQueue {
    /// Creates a new empty MicrotaskQueue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a microtask to the end of the queue.
    pub fn enqueue(&self, microtask: MicroTask) {
        self.queue.borrow_mut().push_back(microtask);
    }

    /// Removes and returns the next microtask from the queue.
    pub fn dequeue(&self) -> Option<MicroTask> {
        self.queue.borrow_mut().pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Returns the number of microtasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }
}
