// src/exec/task_runner.rs

//! Runs one dispatched task and reports back to the runtime.

use futures::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome, TriggerReason};
use crate::server;
use crate::tasks::{run_task, BuildContext};
use crate::types::{AssetClass, TaskId};
use crate::watch::WatchSubscription;

/// Run a scheduled task.
///
/// One-shot tasks report `TaskCompleted` when they are part of a run; a
/// rebuild triggered by the watcher only logs its outcome. Services report
/// `TaskProgressed` once they are up and then run until the process exits,
/// or `TaskCompleted(Failed)` if they cannot start.
pub async fn run_scheduled(
    ctx: BuildContext,
    scheduled: ScheduledTask,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    match scheduled.task {
        TaskId::Watch => run_watch_service(ctx, runtime_tx).await,
        TaskId::Serve => run_serve_service(ctx, runtime_tx).await,
        _ => run_one_shot(ctx, scheduled, runtime_tx).await,
    }
}

async fn run_one_shot(
    ctx: BuildContext,
    scheduled: ScheduledTask,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let task = scheduled.task;
    info!(task = %task, run_id = ?scheduled.run_id, "starting task");

    let outcome = match run_task(&ctx, task).await {
        Ok(_) => TaskOutcome::Success,
        Err(err) => {
            error!(task = %task, error = %err, "task failed");
            TaskOutcome::Failed
        }
    };

    if scheduled.run_id.is_none() {
        debug!(task = %task, ?outcome, "rebuild finished");
        return;
    }
    report(&runtime_tx, RuntimeEvent::TaskCompleted { task, outcome }).await;
}

async fn run_watch_service(ctx: BuildContext, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    let mut subscription = match WatchSubscription::start(&ctx, &AssetClass::DEFAULT_BUILD) {
        Ok(s) => s,
        Err(err) => {
            error!(error = %err, "could not start the file watcher");
            report(&runtime_tx, failed(TaskId::Watch)).await;
            return;
        }
    };
    report(&runtime_tx, RuntimeEvent::TaskProgressed { task: TaskId::Watch }).await;

    while let Some(change) = subscription.next().await {
        info!(class = %change.class, path = %change.path.display(), "source changed");
        let trigger = RuntimeEvent::TaskTriggered {
            task: TaskId::Build(change.class),
            reason: TriggerReason::FileWatch,
        };
        if runtime_tx.send(trigger).await.is_err() {
            // Runtime is gone; nothing left to trigger.
            break;
        }
    }
    debug!("watch service finished");
}

async fn run_serve_service(ctx: BuildContext, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    let addr = ctx.server.address();
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(err) => {
            error!(addr = %addr, error = %err, "could not bind the dev server");
            report(&runtime_tx, failed(TaskId::Serve)).await;
            return;
        }
    };
    match listener.local_addr() {
        Ok(local) => info!(url = %format!("http://{local}/"), "dev server listening"),
        Err(err) => warn!(error = %err, "dev server bound to an unknown address"),
    }
    report(&runtime_tx, RuntimeEvent::TaskProgressed { task: TaskId::Serve }).await;

    if let Err(err) = server::serve_on(listener, ctx.build_dir(), ctx.reload.clone()).await {
        error!(error = %err, "dev server stopped");
    }
}

fn failed(task: TaskId) -> RuntimeEvent {
    RuntimeEvent::TaskCompleted {
        task,
        outcome: TaskOutcome::Failed,
    }
}

async fn report(runtime_tx: &mpsc::Sender<RuntimeEvent>, event: RuntimeEvent) {
    if let Err(err) = runtime_tx.send(event).await {
        debug!(error = %err, "runtime channel closed; dropping event");
    }
}
