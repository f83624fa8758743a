// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! A synchronous, deterministic "core runtime" that consumes
//! [`RuntimeEvent`]s and produces an updated state plus a list of commands
//! describing what the IO shell should do next. It has no channels, no Tokio
//! types, and does not perform any IO.

use crate::dag::{RunSummary, Scheduler};
use crate::engine::event_handlers::{
    handle_task_completion, handle_task_progress, handle_task_trigger, CoreStep,
};
use crate::engine::{RuntimeEvent, RuntimeOptions};

#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, options: RuntimeOptions) -> Self {
        Self { scheduler, options }
    }

    /// Expose whether the scheduler is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn summary(&self) -> RunSummary {
        self.scheduler.summary()
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_trigger(&mut self.scheduler, task, reason)
            }
            RuntimeEvent::TaskProgressed { task } => {
                handle_task_progress(&mut self.scheduler, &self.options, task)
            }
            RuntimeEvent::TaskCompleted { task, outcome } => {
                handle_task_completion(&mut self.scheduler, &self.options, task, outcome)
            }
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
