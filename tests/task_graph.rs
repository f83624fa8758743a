// tests/task_graph.rs

use assetpipe::cli::Command;
use assetpipe::dag::{Plan, TaskGraph};
use assetpipe::errors::PipelineError;
use assetpipe::paths::PathTable;
use assetpipe::types::{AssetClass, TaskId};

fn builds() -> Vec<TaskId> {
    AssetClass::DEFAULT_BUILD
        .into_iter()
        .map(TaskId::Build)
        .collect()
}

#[test]
fn develop_lowers_to_clean_builds_services() {
    let graph = Plan::develop().lower().unwrap();

    assert_eq!(graph.len(), 10);
    assert_eq!(graph.roots(), vec![TaskId::Clean]);

    for build in builds() {
        assert_eq!(graph.dependencies_of(build), &[TaskId::Clean]);
    }
    assert_eq!(graph.dependencies_of(TaskId::Watch), builds().as_slice());
    assert_eq!(graph.dependencies_of(TaskId::Serve), builds().as_slice());

    assert_eq!(
        graph.stages(),
        vec![
            vec![TaskId::Clean],
            builds(),
            vec![TaskId::Watch, TaskId::Serve],
        ]
    );
}

#[test]
fn build_plan_has_no_services() {
    let plan = Plan::for_command(Command::Build);
    let graph = plan.lower().unwrap();

    assert!(!graph.contains(TaskId::Watch));
    assert!(!graph.contains(TaskId::Serve));
    assert!(!graph.contains(TaskId::Build(AssetClass::Sprite)));
    assert_eq!(
        plan.to_string(),
        "series(clean, parallel(images, fonts, vendor-js, vendor-css, js, style, html))"
    );
}

#[test]
fn sprite_and_clean_are_single_tasks() {
    let sprite = Plan::for_command(Command::Sprite).lower().unwrap();
    assert_eq!(sprite.roots(), vec![TaskId::Build(AssetClass::Sprite)]);
    assert_eq!(sprite.asset_classes(), vec![AssetClass::Sprite]);

    let clean = Plan::for_command(Command::Clean).lower().unwrap();
    assert_eq!(clean.tasks().collect::<Vec<_>>(), vec![TaskId::Clean]);
    assert!(clean.asset_classes().is_empty());
}

#[test]
fn empty_groups_are_transparent() {
    let plan = Plan::series([
        Plan::task(TaskId::Clean),
        Plan::Parallel(Vec::new()),
        Plan::task(TaskId::Watch),
    ]);
    let graph = plan.lower().unwrap();
    assert_eq!(graph.dependencies_of(TaskId::Watch), &[TaskId::Clean]);
}

#[test]
fn duplicate_task_is_rejected() {
    let plan = Plan::series([Plan::task(TaskId::Clean), Plan::task(TaskId::Clean)]);
    match plan.lower() {
        Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("more than once")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn cycle_is_rejected() {
    let result = TaskGraph::new(
        [TaskId::Clean, TaskId::Watch, TaskId::Serve],
        [
            (TaskId::Clean, TaskId::Watch),
            (TaskId::Watch, TaskId::Serve),
            (TaskId::Serve, TaskId::Clean),
        ],
    );
    match result {
        Err(PipelineError::GraphCycle(msg)) => assert!(msg.contains("cycle detected")),
        other => panic!("Expected GraphCycle, got: {other:?}"),
    }
}

#[test]
fn self_dependency_is_a_cycle() {
    let result = TaskGraph::new([TaskId::Clean], [(TaskId::Clean, TaskId::Clean)]);
    assert!(matches!(result, Err(PipelineError::GraphCycle(_))));
}

#[test]
fn edge_to_unknown_task_is_rejected() {
    let result = TaskGraph::new([TaskId::Clean], [(TaskId::Clean, TaskId::Serve)]);
    match result {
        Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("unknown task 'serve'")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn graph_requires_a_path_entry_per_built_class() {
    let graph = Plan::build().lower().unwrap();
    assert!(graph.check_paths(&PathTable::defaults("src", "dist")).is_ok());

    let err = graph
        .check_paths(&PathTable::empty("src", "dist"))
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)));
}
