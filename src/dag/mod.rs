// src/dag/mod.rs

//! Task graph representation and scheduling.
//!
//! - [`plan`] declares runs as series/parallel compositions of tasks.
//! - [`graph`] is the dependency graph a plan lowers to, validated with
//!   `petgraph`.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   tasks are ready to run, and what a failure does to their dependents.
//! - [`task_info`] provides per-run task state and scheduled task types.

pub mod graph;
pub mod plan;
pub mod scheduler;
pub mod task_info;

pub use graph::TaskGraph;
pub use plan::Plan;
pub use scheduler::{RunSummary, Scheduler, SchedulerStep};
pub use task_info::{ScheduledTask, TaskRunState};
