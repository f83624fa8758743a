// tests/runtime_fake_executor.rs

use std::collections::BTreeSet;
use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use assetpipe::dag::{Plan, RunSummary, ScheduledTask, Scheduler, TaskRunState};
use assetpipe::engine::{
    CoreCommand, CoreRuntime, RuntimeEvent, RuntimeOptions, TaskOutcome, TriggerReason,
};
use assetpipe::run_graph;
use assetpipe::types::{AssetClass, TaskId};
use assetpipe_test_utils::fake_executor::FakeExecutor;
use assetpipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn builds() -> BTreeSet<TaskId> {
    AssetClass::DEFAULT_BUILD
        .into_iter()
        .map(TaskId::Build)
        .collect()
}

/// Run `plan` to completion on a fake executor; returns the summary and the
/// dispatch order.
async fn run_plan(
    plan: Plan,
    failing: &[TaskId],
) -> Result<(RunSummary, Vec<TaskId>), Box<dyn Error>> {
    let graph = plan.lower()?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone())
        .with_failures(failing.iter().copied());

    let options = RuntimeOptions {
        exit_when_idle: true,
    };
    let summary = with_timeout(run_graph(&graph, options, rt_tx, rt_rx, executor)).await?;
    let dispatched = executed.lock().unwrap().clone();
    Ok((summary, dispatched))
}

#[tokio::test]
async fn build_runs_clean_before_every_build() -> TestResult {
    init_tracing();

    let (summary, dispatched) = run_plan(Plan::build(), &[]).await?;

    assert_eq!(dispatched[0], TaskId::Clean);
    let rest: BTreeSet<TaskId> = dispatched[1..].iter().copied().collect();
    assert_eq!(rest, builds());
    assert_eq!(dispatched.len(), 8);
    assert!(summary.is_success());
    assert_eq!(summary.succeeded.len(), 8);
    Ok(())
}

#[tokio::test]
async fn develop_starts_services_after_all_builds() -> TestResult {
    init_tracing();

    let (summary, dispatched) = run_plan(Plan::develop(), &[]).await?;

    assert_eq!(dispatched.len(), 10);
    let services: BTreeSet<TaskId> = dispatched[8..].iter().copied().collect();
    assert_eq!(services, BTreeSet::from([TaskId::Watch, TaskId::Serve]));
    assert!(summary.is_success());
    assert!(summary.succeeded.contains(&TaskId::Watch));
    assert!(summary.succeeded.contains(&TaskId::Serve));
    Ok(())
}

#[tokio::test]
async fn failed_build_still_starts_watch_and_serve() -> TestResult {
    init_tracing();

    let js = TaskId::Build(AssetClass::Js);
    let (summary, dispatched) = run_plan(Plan::develop(), &[js]).await?;

    assert!(dispatched.contains(&TaskId::Watch));
    assert!(dispatched.contains(&TaskId::Serve));
    assert_eq!(summary.failed, vec![js]);
    assert!(summary.skipped.is_empty());
    assert!(summary.succeeded.contains(&TaskId::Watch));
    assert!(!summary.is_success());
    Ok(())
}

#[tokio::test]
async fn failed_clean_skips_everything_downstream() -> TestResult {
    init_tracing();

    let (summary, dispatched) = run_plan(Plan::develop(), &[TaskId::Clean]).await?;

    assert_eq!(dispatched, vec![TaskId::Clean]);
    assert_eq!(summary.failed, vec![TaskId::Clean]);
    assert_eq!(summary.skipped.len(), 9);
    assert!(summary.succeeded.is_empty());
    Ok(())
}

#[tokio::test]
async fn single_task_plan_runs_once() -> TestResult {
    let (summary, dispatched) = run_plan(Plan::sprite(), &[]).await?;
    assert_eq!(dispatched, vec![TaskId::Build(AssetClass::Sprite)]);
    assert_eq!(summary.succeeded, vec![TaskId::Build(AssetClass::Sprite)]);
    Ok(())
}

#[tokio::test]
async fn file_change_after_the_run_is_idle_reaches_the_executor() -> TestResult {
    init_tracing();
    let graph = Plan::develop().lower()?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    let options = RuntimeOptions {
        exit_when_idle: false,
    };
    let loop_tx = rt_tx.clone();
    let handle =
        tokio::spawn(async move { run_graph(&graph, options, loop_tx, rt_rx, executor).await });

    let dispatched_count = |executed: &Arc<Mutex<Vec<TaskId>>>| executed.lock().unwrap().len();
    with_timeout(async {
        while dispatched_count(&executed) < 10 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await;

    let style = TaskId::Build(AssetClass::Style);
    rt_tx
        .send(RuntimeEvent::TaskTriggered {
            task: style,
            reason: TriggerReason::FileWatch,
        })
        .await?;
    with_timeout(async {
        while dispatched_count(&executed) < 11 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await;
    assert_eq!(executed.lock().unwrap()[10], style);

    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;
    let summary = with_timeout(handle).await??;
    assert!(summary.is_success(), "summary: {summary:?}");
    assert_eq!(summary.succeeded.len(), 10);
    Ok(())
}

#[test]
fn file_change_dispatches_a_rebuild_outside_any_run() {
    let graph = Plan::develop().lower().unwrap();
    let mut core = CoreRuntime::new(Scheduler::new(graph), RuntimeOptions::default());

    let style = TaskId::Build(AssetClass::Style);
    let step = core.step(RuntimeEvent::TaskTriggered {
        task: style,
        reason: TriggerReason::FileWatch,
    });

    assert!(step.keep_running);
    assert_eq!(
        step.commands,
        vec![CoreCommand::DispatchTasks(vec![ScheduledTask::rebuild(style)])]
    );
    assert!(core.is_idle());
    assert_eq!(
        core.scheduler().run_state_of(style),
        Some(TaskRunState::NotInRun)
    );
}

#[test]
fn repeated_file_changes_are_not_coalesced() {
    let graph = Plan::develop().lower().unwrap();
    let mut core = CoreRuntime::new(Scheduler::new(graph), RuntimeOptions::default());
    let js = TaskId::Build(AssetClass::Js);

    for _ in 0..3 {
        let step = core.step(RuntimeEvent::TaskTriggered {
            task: js,
            reason: TriggerReason::FileWatch,
        });
        assert_eq!(
            step.commands,
            vec![CoreCommand::DispatchTasks(vec![ScheduledTask::rebuild(js)])]
        );
    }
}

#[test]
fn scheduler_steps_through_a_build_run() {
    let graph = Plan::build().lower().unwrap();
    let mut scheduler = Scheduler::new(graph);

    let step = scheduler.step_trigger(TaskId::Clean);
    assert_eq!(step.newly_scheduled, vec![ScheduledTask::in_run(TaskId::Clean, 1)]);
    assert_eq!(scheduler.tasks_in_current_run().len(), 8);
    assert_eq!(
        scheduler.run_state_of(TaskId::Build(AssetClass::Html)),
        Some(TaskRunState::Pending)
    );

    let step = scheduler.step_completion(TaskId::Clean, TaskOutcome::Success);
    let scheduled: BTreeSet<TaskId> = step.newly_scheduled.iter().map(|s| s.task).collect();
    assert_eq!(scheduled, builds());

    let mut last = None;
    for build in builds() {
        last = Some(scheduler.step_completion(build, TaskOutcome::Success));
    }
    assert!(last.is_some_and(|s| s.run_just_finished));
    assert!(scheduler.is_idle());
}

#[test]
fn shutdown_stops_the_loop() {
    let graph = Plan::develop().lower().unwrap();
    let mut core = CoreRuntime::new(Scheduler::new(graph), RuntimeOptions::default());
    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert!(!step.keep_running);
}

#[test]
fn stale_completion_is_ignored() {
    let graph = Plan::build().lower().unwrap();
    let mut scheduler = Scheduler::new(graph);
    scheduler.step_trigger(TaskId::Clean);

    // Html is still pending; a completion for it cannot be real.
    let step = scheduler.step_completion(TaskId::Build(AssetClass::Html), TaskOutcome::Success);
    assert!(step.newly_scheduled.is_empty());
    assert_eq!(
        scheduler.run_state_of(TaskId::Build(AssetClass::Html)),
        Some(TaskRunState::Pending)
    );
}
