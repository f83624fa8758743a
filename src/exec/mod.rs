// src/exec/mod.rs

//! Task execution layer.
//!
//! Runs the tasks the runtime dispatches and reports back to it via
//! `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the background loop spawning one Tokio task per
//!   dispatched task.
//! - [`task_runner`] runs one-shot tasks and starts the long-running
//!   services (watcher, dev server).
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` used in production, which tests can replace with
//!   a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
