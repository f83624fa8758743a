// tests/pipeline_run.rs

use std::error::Error;

use tokio::sync::mpsc;

use assetpipe::cli::{CliArgs, Command};
use assetpipe::dag::{Plan, ScheduledTask};
use assetpipe::engine::{RuntimeEvent, RuntimeOptions};
use assetpipe::exec::task_runner::run_scheduled;
use assetpipe::transform::TransformerSpec;
use assetpipe::types::{AssetClass, ReloadScope, TaskId};
use assetpipe::{execute, run};
use assetpipe_test_utils::builders::ConfigFileBuilder;
use assetpipe_test_utils::project::TempProject;
use assetpipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn one_shot() -> RuntimeOptions {
    RuntimeOptions {
        exit_when_idle: true,
    }
}

#[tokio::test]
async fn develop_on_an_empty_tree_starts_watch_and_serve() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    let cfg = ConfigFileBuilder::new().with_port(0).build();
    let ctx = project.context(&cfg);

    let graph = Plan::develop().lower()?;
    let summary = with_timeout(execute(ctx, &graph, one_shot())).await?;

    assert!(summary.is_success(), "summary: {summary:?}");
    assert_eq!(summary.succeeded.len(), 10);
    assert!(summary.succeeded.contains(&TaskId::Watch));
    assert!(summary.succeeded.contains(&TaskId::Serve));
    assert!(project.files_under("dist").is_empty());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn watch_rebuild_pushes_a_reload_without_reporting_to_the_runtime() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("src/scss/main.scss", "body{}");
    let cfg = ConfigFileBuilder::new()
        .with_pipeline(
            AssetClass::Style,
            vec![TransformerSpec::command_with_ext("tr a-z A-Z", ".css")],
        )
        .build();
    let ctx = project.context(&cfg);
    let mut reloads = ctx.reload.subscribe();
    let (rt_tx, mut rt_rx) = mpsc::channel::<RuntimeEvent>(8);

    let style = TaskId::Build(AssetClass::Style);
    with_timeout(run_scheduled(ctx.clone(), ScheduledTask::rebuild(style), rt_tx)).await;

    let event = reloads.try_recv()?;
    assert_eq!(event.scope, ReloadScope::Css);
    assert_eq!(event.paths, vec!["css/main.css".to_string()]);
    assert_eq!(project.read("dist/css/main.css"), "BODY{}");
    assert!(rt_rx.try_recv().is_err(), "a rebuild is not part of any run");
    Ok(())
}

#[tokio::test]
async fn build_replaces_previous_outputs() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("dist/stale.html", "old");
    project.write("src/index.html", "<p>home</p>");
    project.write("src/js/main.js", "let a;");
    project.write("src/vendor/js/lib.js", "var lib;");

    let cfg = ConfigFileBuilder::new().passthrough().build();
    let ctx = project.context(&cfg);

    let graph = Plan::build().lower()?;
    let summary = with_timeout(execute(ctx, &graph, one_shot())).await?;

    assert!(summary.is_success(), "summary: {summary:?}");
    assert_eq!(
        project.files_under("dist"),
        vec!["index.html", "js/lib.js", "js/main.js"]
    );
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn one_failing_class_does_not_stop_the_others() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("src/index.html", "<p>home</p>");
    project.write("src/js/main.js", "let a;");

    let cfg = ConfigFileBuilder::new()
        .passthrough()
        .with_pipeline(AssetClass::Js, vec![TransformerSpec::command("exit 1")])
        .build();
    let ctx = project.context(&cfg);

    let graph = Plan::build().lower()?;
    let summary = with_timeout(execute(ctx, &graph, one_shot())).await?;

    assert_eq!(summary.failed, vec![TaskId::Build(AssetClass::Js)]);
    assert!(project.exists("dist/index.html"));
    assert!(!project.exists("dist/js/main.js"));
    Ok(())
}

#[tokio::test]
async fn run_reads_the_config_next_to_the_project() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write(
        "Assetpipe.toml",
        r#"
[project]
build = "public"

[pipeline]
html = []
"#,
    );
    project.write("src/index.html", "<p>home</p>");
    project.write("public/old.html", "old");

    let args = CliArgs {
        command: Some(Command::Build),
        config: project.path("Assetpipe.toml").to_string_lossy().into_owned(),
        log_level: None,
        dry_run: false,
    };
    with_timeout(run(args)).await?;

    assert_eq!(project.files_under("public"), vec!["index.html"]);
    Ok(())
}

#[tokio::test]
async fn dry_run_touches_nothing() -> TestResult {
    let project = TempProject::new();
    project.write("Assetpipe.toml", "");
    project.write("dist/keep.html", "keep");

    let args = CliArgs {
        command: Some(Command::Clean),
        config: project.path("Assetpipe.toml").to_string_lossy().into_owned(),
        log_level: None,
        dry_run: true,
    };
    run(args).await?;

    assert!(project.exists("dist/keep.html"));
    Ok(())
}

#[tokio::test]
async fn invalid_config_fails_before_running() {
    let project = TempProject::new();
    project.write("Assetpipe.toml", "[project]\nbuild = \"..\"\n");
    project.write("dist/keep.html", "keep");

    let args = CliArgs {
        command: Some(Command::Clean),
        config: project.path("Assetpipe.toml").to_string_lossy().into_owned(),
        log_level: None,
        dry_run: false,
    };
    assert!(run(args).await.is_err());
    assert!(project.exists("dist/keep.html"));
}
