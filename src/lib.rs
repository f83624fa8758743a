// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod paths;
pub mod server;
pub mod tasks;
pub mod transform;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, ConfigFile};
use crate::dag::{Plan, RunSummary, Scheduler, TaskGraph};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::{PipelineError, Result};
use crate::exec::{ExecutorBackend, RealExecutorBackend};
use crate::fs::RealFileSystem;
use crate::tasks::BuildContext;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (or the built-in layout)
/// - the plan of the requested command, lowered and validated
/// - scheduler / runtime / executor
/// - Ctrl-C handling for `develop`
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_or_default(&config_path)?;

    let command = args.command.unwrap_or(Command::Develop);
    let plan = Plan::for_command(command);
    let graph = plan.lower()?;
    graph.check_paths(cfg.paths())?;

    if args.dry_run {
        print_dry_run(command, &cfg, &plan, &graph);
        return Ok(());
    }

    let root = project_root(&config_path);
    let ctx = BuildContext::from_config(root, &cfg, Arc::new(RealFileSystem));

    let options = RuntimeOptions {
        exit_when_idle: command != Command::Develop,
    };
    let summary = execute(ctx, &graph, options).await?;

    if options.exit_when_idle && !summary.is_success() {
        let failed: Vec<String> = summary
            .failed
            .iter()
            .chain(summary.skipped.iter())
            .map(|t| t.to_string())
            .collect();
        bail!("{command:?} finished with failed or skipped tasks: {}", failed.join(", "));
    }
    Ok(())
}

/// Run `graph` with the production executor.
pub async fn execute(
    ctx: BuildContext,
    graph: &TaskGraph,
    options: RuntimeOptions,
) -> Result<RunSummary> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(ctx, rt_tx.clone());
    run_graph(graph, options, rt_tx, rt_rx, executor).await
}

/// Run `graph` on any executor backend: seed its roots, then drive the
/// runtime until it stops.
///
/// Without `exit_when_idle` the runtime only stops on Ctrl-C; in-flight tasks
/// are not awaited.
pub async fn run_graph<E: ExecutorBackend>(
    graph: &TaskGraph,
    options: RuntimeOptions,
    rt_tx: mpsc::Sender<RuntimeEvent>,
    rt_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
) -> Result<RunSummary> {
    if graph.is_empty() {
        return Ok(RunSummary::default());
    }

    if !options.exit_when_idle {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let roots = graph.roots();
    info!(?roots, "initial roots to trigger at startup");
    for task in roots {
        rt_tx
            .send(RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::Startup,
            })
            .await
            .map_err(|e| PipelineError::Other(e.into()))?;
    }

    let core = CoreRuntime::new(Scheduler::new(graph.clone()), options);
    let runtime = Runtime::new(core, rt_rx, executor);
    runtime.run().await
}

/// Figure out the project root from the config location.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetpipe.toml"),
///   that directory is the root.
/// - For a bare filename like "Assetpipe.toml" we fall back to the current
///   working directory.
fn project_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print the resolved layout and execution order without running anything.
fn print_dry_run(command: Command, cfg: &ConfigFile, plan: &Plan, graph: &TaskGraph) {
    let paths = cfg.paths();
    println!("assetpipe dry-run ({command:?})");
    println!("  plan: {plan}");
    println!(
        "  project: source = {}, build = {}",
        paths.source_folder().display(),
        paths.build_folder().display()
    );
    println!("  server: http://{}/", cfg.server.address());
    println!("  watch.skip_unchanged = {}", cfg.watch.skip_unchanged);
    println!();

    println!("execution order:");
    for (idx, stage) in graph.stages().iter().enumerate() {
        let names: Vec<String> = stage.iter().map(|t| t.to_string()).collect();
        println!("  {}. {}", idx + 1, names.join(", "));
    }
    println!();

    println!("asset classes:");
    for (class, entry) in paths.iter() {
        println!("  - {class}");
        println!("      source: {:?}", entry.source);
        if !entry.watch.is_empty() {
            println!("      watch: {:?}", entry.watch);
        }
        println!("      output: {}", entry.output.display());
        if class == types::AssetClass::Images {
            let images = cfg.pipelines().images();
            println!("      web: {}", describe_chain(&images.web));
            println!("      fallback: {}", describe_chain(&images.fallback));
            println!("      web formats: {}", images.web_formats.join(", "));
        } else {
            println!("      chain: {}", describe_chain(cfg.pipelines().chain(class)));
        }
    }

    debug!("dry-run complete (no execution)");
}

fn describe_chain(specs: &[transform::TransformerSpec]) -> String {
    if specs.is_empty() {
        return "(copy)".to_string();
    }
    specs
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
