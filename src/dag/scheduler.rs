// src/dag/scheduler.rs

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::TaskOutcome;
use crate::types::TaskId;

/// Structured result of a single scheduler "step".
///
/// Useful for tests that want to manually step the graph and make assertions
/// about what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks that were newly marked as failed in this step.
    pub newly_failed: Vec<TaskId>,
    /// Tasks that will not run because a gating dependency failed.
    pub newly_skipped: Vec<TaskId>,
    /// Whether this step caused the current run to finish (i.e. the scheduler
    /// is now idle).
    pub run_just_finished: bool,
}

/// Outcome of the latest run, per task, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: Vec<TaskId>,
    pub failed: Vec<TaskId>,
    pub skipped: Vec<TaskId>,
    /// Still pending or running when the summary was taken (e.g. on Ctrl-C).
    pub unfinished: Vec<TaskId>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty() && self.unfinished.is_empty()
    }
}

enum Readiness {
    Ready,
    Waiting,
    Blocked,
}

/// Scheduler holds the immutable graph plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current run
/// - deciding when a triggered task is ready to run
/// - marking tasks as succeeded/failed/progressed
/// - skipping the dependents of a failed gating task
///
/// Edges leaving a gating task (`clean`) require its success. Every other
/// edge only orders: the dependent starts once the dependency is terminal,
/// whatever its outcome.
#[derive(Debug)]
pub struct Scheduler {
    graph: TaskGraph,
    tasks: BTreeMap<TaskId, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    pub fn new(graph: TaskGraph) -> Self {
        let tasks = graph
            .tasks()
            .map(|id| (id, TaskInfo::new(id, graph.dependencies_of(id).to_vec())))
            .collect();
        Self {
            graph,
            tasks,
            run_counter: 0,
            current_run_id: None,
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Read-only view of the given task's run state; `None` for a task that
    /// is not in the graph.
    pub fn run_state_of(&self, task: TaskId) -> Option<TaskRunState> {
        let info = self.tasks.get(&task)?;
        Some(info.run_state.into())
    }

    /// Tasks participating in the active run; empty when idle.
    pub fn tasks_in_current_run(&self) -> Vec<TaskId> {
        if self.current_run_id.is_none() {
            return Vec::new();
        }
        self.tasks
            .values()
            .filter(|info| info.run_state.is_some())
            .map(|info| info.id)
            .collect()
    }

    /// Start a new run, resetting per-run state but keeping historical success
    /// information.
    pub fn start_new_run(&mut self) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for info in self.tasks.values_mut() {
            info.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new run");
    }

    /// Handle a trigger for a task (production API).
    pub fn handle_trigger(&mut self, task: TaskId) -> Vec<ScheduledTask> {
        self.step_trigger(task).newly_scheduled
    }

    /// Handle "progress" from a service (production API).
    pub fn handle_progress(&mut self, task: TaskId) -> Vec<ScheduledTask> {
        self.step_progress(task).newly_scheduled
    }

    /// Handle completion of a task with a concrete outcome (production API).
    pub fn handle_completion(&mut self, task: TaskId, outcome: TaskOutcome) -> Vec<ScheduledTask> {
        self.step_completion(task, outcome).newly_scheduled
    }

    /// Include `task` and everything downstream of it in the current run,
    /// starting a run if the scheduler is idle.
    pub fn step_trigger(&mut self, task: TaskId) -> SchedulerStep {
        if self.current_run_id.is_none() {
            debug!(task = %task, "trigger while idle; starting a new run");
            self.start_new_run();
        }

        if self.tasks.contains_key(&task) {
            self.mark_task_and_dependents_pending(task);
        } else {
            warn!(task = %task, "trigger for unknown task; ignoring");
        }

        self.advance(SchedulerStep::default())
    }

    /// A service reported that it is up; that satisfies its dependents.
    pub fn step_progress(&mut self, task: TaskId) -> SchedulerStep {
        let Some(run_id) = self.current_run_id else {
            debug!(task = %task, "progress with no active run; ignoring");
            return SchedulerStep::default();
        };

        match self.tasks.get_mut(&task) {
            Some(info) if info.run_state == Some(RunState::Running) => {
                debug!(task = %task, run_id, "task reported progress; marking DoneSuccess");
                info.run_state = Some(RunState::DoneSuccess);
                info.last_successful_run = Some(run_id);
            }
            Some(_) => {
                debug!(task = %task, "progress from a task that is not running; ignoring");
                return SchedulerStep::default();
            }
            None => {
                warn!(task = %task, "progress from unknown task; ignoring");
                return SchedulerStep::default();
            }
        }

        self.advance(SchedulerStep::default())
    }

    pub fn step_completion(&mut self, task: TaskId, outcome: TaskOutcome) -> SchedulerStep {
        let Some(run_id) = self.current_run_id else {
            warn!(task = %task, "completion with no active run; ignoring");
            return SchedulerStep::default();
        };

        let mut step = SchedulerStep::default();
        match self.tasks.get_mut(&task) {
            Some(info) if info.run_state == Some(RunState::Running) => match outcome {
                TaskOutcome::Success => {
                    info.run_state = Some(RunState::DoneSuccess);
                    info.last_successful_run = Some(run_id);
                    debug!(task = %task, run_id, "task completed successfully");
                }
                TaskOutcome::Failed => {
                    info.run_state = Some(RunState::DoneFailed);
                    if task.gates_dependents() {
                        warn!(task = %task, run_id, "task failed; skipping its dependents");
                    } else {
                        warn!(task = %task, run_id, "task failed");
                    }
                    step.newly_failed.push(task);
                }
            },
            Some(_) => {
                warn!(task = %task, "completion from a task that is not running; ignoring");
                return step;
            }
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
                return step;
            }
        }

        self.advance(step)
    }

    /// Outcome of the latest (or current) run.
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for id in self.graph.tasks() {
            let Some(info) = self.tasks.get(&id) else {
                continue;
            };
            match info.run_state {
                Some(RunState::DoneSuccess) => summary.succeeded.push(id),
                Some(RunState::DoneFailed) => summary.failed.push(id),
                Some(RunState::Skipped) => summary.skipped.push(id),
                Some(RunState::Pending) | Some(RunState::Running) => summary.unfinished.push(id),
                None => {}
            }
        }
        summary
    }

    /// Schedule whatever became ready, skip whatever became blocked, and
    /// close the run if everything is terminal.
    fn advance(&mut self, mut step: SchedulerStep) -> SchedulerStep {
        let (scheduled, skipped) = self.collect_new_ready_tasks();
        step.newly_scheduled.extend(scheduled);
        step.newly_skipped.extend(skipped);
        step.run_just_finished = self.maybe_finish_run();
        step
    }

    fn mark_task_and_dependents_pending(&mut self, root: TaskId) {
        let mut stack = vec![root];
        let mut visited = BTreeSet::new();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(info) = self.tasks.get_mut(&id) {
                if info.run_state.is_none() {
                    info.run_state = Some(RunState::Pending);
                    debug!(task = %id, "marked Pending for this run");
                }
            }
            stack.extend(self.graph.dependents_of(id).iter().copied());
        }
    }

    fn readiness(&self, info: &TaskInfo) -> Readiness {
        for dep_id in &info.deps {
            let Some(dep) = self.tasks.get(dep_id) else {
                warn!(task = %info.id, dep = %dep_id, "dependency missing from tasks map");
                return Readiness::Blocked;
            };
            match dep.run_state {
                Some(RunState::DoneSuccess) => {}
                Some(RunState::DoneFailed) => {
                    if dep.id.gates_dependents() {
                        return Readiness::Blocked;
                    }
                }
                Some(RunState::Skipped) => return Readiness::Blocked,
                Some(RunState::Pending) | Some(RunState::Running) => return Readiness::Waiting,
                None => {
                    // Not part of this run; a gating dependency must have
                    // succeeded at some point.
                    if dep.id.gates_dependents() && dep.last_successful_run.is_none() {
                        return Readiness::Blocked;
                    }
                }
            }
        }
        Readiness::Ready
    }

    /// Move ready `Pending` tasks to `Running` and blocked ones to `Skipped`,
    /// repeating until nothing changes (skips cascade downstream).
    fn collect_new_ready_tasks(&mut self) -> (Vec<ScheduledTask>, Vec<TaskId>) {
        let run_id = self.current_run_id.unwrap_or(0);
        let mut ready = Vec::new();
        let mut skipped = Vec::new();

        loop {
            let mut to_run = Vec::new();
            let mut to_skip = Vec::new();
            for id in self.graph.tasks() {
                let Some(info) = self.tasks.get(&id) else {
                    continue;
                };
                if info.run_state != Some(RunState::Pending) {
                    continue;
                }
                match self.readiness(info) {
                    Readiness::Ready => to_run.push(id),
                    Readiness::Blocked => to_skip.push(id),
                    Readiness::Waiting => {}
                }
            }

            if to_run.is_empty() && to_skip.is_empty() {
                break;
            }

            for id in to_skip {
                if let Some(info) = self.tasks.get_mut(&id) {
                    info.run_state = Some(RunState::Skipped);
                    warn!(task = %id, run_id, "upstream failure; task skipped");
                    skipped.push(id);
                }
            }
            for id in to_run {
                if let Some(info) = self.tasks.get_mut(&id) {
                    info.run_state = Some(RunState::Running);
                    info!(task = %id, run_id, "dependencies satisfied; scheduling task");
                    ready.push(ScheduledTask::in_run(id, run_id));
                }
            }
        }

        (ready, skipped)
    }

    /// Clear `current_run_id` once every task in the run is terminal.
    ///
    /// Returns `true` if this call transitioned the scheduler to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let all_terminal = self
            .tasks
            .values()
            .all(|info| info.run_state.is_none_or(|s| s.is_terminal()));

        if all_terminal {
            info!(
                run_id = self.current_run_id,
                "scheduler: all tasks terminal; marking run as finished"
            );
            self.current_run_id = None;
        }
        all_terminal
    }
}
