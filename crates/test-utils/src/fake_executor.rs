use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetpipe::dag::ScheduledTask;
use assetpipe::engine::{RuntimeEvent, TaskOutcome};
use assetpipe::errors::Result;
use assetpipe::exec::ExecutorBackend;
use assetpipe::types::TaskId;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were "run", in dispatch order
/// - immediately reports `TaskProgressed` for services
/// - reports `TaskCompleted(Failed)` for tasks listed in `failing`, and
///   `TaskCompleted(Success)` for every other one-shot task.
///
/// Rebuilds dispatched outside a run are recorded but never reported.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<TaskId>>>,
    failing: BTreeSet<TaskId>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: Arc<Mutex<Vec<TaskId>>>) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: BTreeSet::new(),
        }
    }

    pub fn with_failures(mut self, tasks: impl IntoIterator<Item = TaskId>) -> Self {
        self.failing.extend(tasks);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.task);
                }
                if t.run_id.is_none() {
                    continue;
                }

                let event = if failing.contains(&t.task) {
                    RuntimeEvent::TaskCompleted {
                        task: t.task,
                        outcome: TaskOutcome::Failed,
                    }
                } else if t.task.is_service() {
                    RuntimeEvent::TaskProgressed { task: t.task }
                } else {
                    RuntimeEvent::TaskCompleted {
                        task: t.task,
                        outcome: TaskOutcome::Success,
                    }
                };
                tx.send(event).await.map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
