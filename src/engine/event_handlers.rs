// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info};

use crate::dag::{ScheduledTask, Scheduler, TaskRunState};
use crate::engine::{RuntimeOptions, TaskOutcome, TriggerReason};
use crate::types::TaskId;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Request that the process exits (one-shot run finished).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn dispatch(tasks: Vec<ScheduledTask>) -> Self {
        let mut commands = Vec::new();
        if !tasks.is_empty() {
            commands.push(CoreCommand::DispatchTasks(tasks));
        }
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a task trigger event.
///
/// - A file-watch trigger bypasses the scheduler: the task goes straight to
///   the executor, overlapping any invocation already in flight.
/// - Any other trigger starts a run when idle, or merges the task (and its
///   dependents) into the active run if it is not already part of it.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    task: TaskId,
    reason: TriggerReason,
) -> CoreStep {
    if reason == TriggerReason::FileWatch {
        debug!(task = %task, "file change; dispatching rebuild");
        return CoreStep::dispatch(vec![ScheduledTask::rebuild(task)]);
    }

    match scheduler.run_state_of(task) {
        None => {
            debug!(task = %task, "trigger for a task outside the graph; ignoring");
            CoreStep::dispatch(Vec::new())
        }
        Some(TaskRunState::NotInRun) => CoreStep::dispatch(scheduler.handle_trigger(task)),
        Some(state) if scheduler.is_idle() => {
            debug!(task = %task, ?state, "re-triggering a finished task; starting a new run");
            scheduler.start_new_run();
            CoreStep::dispatch(scheduler.handle_trigger(task))
        }
        Some(state) => {
            debug!(task = %task, ?state, "task already part of the active run; ignoring");
            CoreStep::dispatch(Vec::new())
        }
    }
}

/// Handle a service progress event.
pub fn handle_task_progress(
    scheduler: &mut Scheduler,
    options: &RuntimeOptions,
    task: TaskId,
) -> CoreStep {
    let step = CoreStep::dispatch(scheduler.handle_progress(task));
    maybe_exit(scheduler, options, step)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    options: &RuntimeOptions,
    task: TaskId,
    outcome: TaskOutcome,
) -> CoreStep {
    let step = CoreStep::dispatch(scheduler.handle_completion(task, outcome));
    maybe_exit(scheduler, options, step)
}

/// In one-shot mode, stop once the run is over.
fn maybe_exit(scheduler: &Scheduler, options: &RuntimeOptions, mut step: CoreStep) -> CoreStep {
    if options.exit_when_idle && scheduler.is_idle() {
        info!("run finished; exiting");
        step.keep_running = false;
        step.commands.push(CoreCommand::RequestExit);
    }
    step
}
