// src/dag/task_info.rs

//! Per-run task state and the scheduled task type.

use crate::types::TaskId;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Task was triggered for this run but is waiting on dependencies.
    Pending,
    /// Task has been dispatched to the executor.
    Running,
    /// Task completed successfully, or a service reported that it started.
    DoneSuccess,
    /// Task failed in this run.
    DoneFailed,
    /// Task never ran because a gating dependency failed.
    Skipped,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::DoneSuccess | RunState::DoneFailed | RunState::Skipped
        )
    }
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not currently participating in this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
    Skipped,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
            Some(RunState::Skipped) => TaskRunState::Skipped,
        }
    }
}

/// Static task information plus per-run state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub id: TaskId,
    /// Direct dependencies for this task.
    pub deps: Vec<TaskId>,

    /// Per-run state (None if not participating in the current run).
    pub run_state: Option<RunState>,

    /// Last run ID in which this task succeeded.
    pub last_successful_run: Option<u64>,
}

impl TaskInfo {
    pub fn new(id: TaskId, deps: Vec<TaskId>) -> Self {
        Self {
            id,
            deps,
            run_state: None,
            last_successful_run: None,
        }
    }
}

/// A task the scheduler (or a file change) wants the executor to run now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub task: TaskId,
    /// Graph run this invocation belongs to. `None` for a rebuild triggered by
    /// the watcher outside of any run; its outcome is logged but not reported
    /// back to the scheduler.
    pub run_id: Option<u64>,
}

impl ScheduledTask {
    pub fn in_run(task: TaskId, run_id: u64) -> Self {
        Self {
            task,
            run_id: Some(run_id),
        }
    }

    pub fn rebuild(task: TaskId) -> Self {
        Self { task, run_id: None }
    }
}
