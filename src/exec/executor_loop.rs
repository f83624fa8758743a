// src/exec/executor_loop.rs

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_scheduled;
use crate::tasks::BuildContext;

/// Spawn the background executor loop.
///
/// Each scheduled task runs in its own Tokio task, so tasks dispatched
/// together run concurrently. Invocations of the same task may overlap
/// (a rebuild triggered while the previous one is still running); nothing is
/// cancelled.
pub fn spawn_executor(
    ctx: BuildContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        while let Some(task) = rx.recv().await {
            debug!(task = %task.task, run_id = ?task.run_id, "executor received task");
            let ctx = ctx.clone();
            let rt_tx = runtime_tx.clone();
            tokio::spawn(async move {
                run_scheduled(ctx, task, rt_tx).await;
            });
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
