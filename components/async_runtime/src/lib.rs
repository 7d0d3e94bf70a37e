//! Async runtime for JavaScript execution.
//!
//! This crate provides a Promise/A+ implementation and the event loop that
//! drives it:
//! - Settlement of promises, with once-only state transitions
//! - `then` chaining with deferred, ordered reactions
//! - The resolution procedure, including adoption of foreign thenables
//! - Event loop with task and microtask queues
//!
//! # Overview
//!
//! - [`EventLoop`] - Main event loop coordinating task execution
//! - [`Promise`] - Promise/A+ compliant implementation
//! - [`TaskScheduler`] - Where promise reactions are deferred to
//! - [`RuntimeConfig`] - Cycle detection and adoption limits
//!
//! # Examples
//!
//! ## Event Loop Usage
//!
//! ```
//! use async_runtime::{EventLoop, Task};
//! use core_types::Value;
//!
//! let mut event_loop = EventLoop::new();
//! event_loop.enqueue_task(Task::new(|| Ok(Value::Undefined)));
//! event_loop.run_until_done().unwrap();
//! ```
//!
//! ## Promise Usage
//!
//! ```
//! use async_runtime::{EventLoop, PromiseState};
//! use core_types::Value;
//!
//! let mut event_loop = EventLoop::new();
//! let deferred = event_loop.deferred();
//! let doubled = deferred.promise().on_fulfilled(|v| match v {
//!     Value::Smi(n) => Ok(Value::Smi(n * 2)),
//!     other => Err(other),
//! });
//!
//! deferred.resolve(Value::Smi(21));
//! assert!(matches!(doubled.state(), PromiseState::Pending));
//!
//! event_loop.run_until_done().unwrap();
//! assert_eq!(doubled.value(), Some(Value::Smi(42)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod event_loop;
pub mod promise;
mod resolution;
pub mod scheduler;
pub mod task_queue;

// Re-export main types at crate root
pub use config::{ConfigError, CycleDetection, RuntimeConfig};
pub use event_loop::EventLoop;
pub use promise::{Deferred, Promise, PromiseState, ResolvingFunctions};
pub use scheduler::{PromiseHost, TaskScheduler};
pub use task_queue::{Job, MicroTask, MicrotaskQueue, Task, TaskQueue};
