// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Build static web assets, watch sources and serve them with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// What to run. Defaults to `develop`.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to an optional config file (TOML), relative to the project root.
    ///
    /// When the file does not exist the built-in layout is used.
    #[arg(long, value_name = "PATH", default_value = "Assetpipe.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Validate the configuration, print the path table and execution order,
    /// but don't run anything.
    #[arg(long, global = true)]
    pub dry_run: bool,
}

/// Entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Clean, build every asset class, then watch and serve (default).
    Develop,
    /// Clean and build every asset class once, then exit.
    Build,
    /// Bundle the icons under `images/stack/` into a single SVG sprite.
    Sprite,
    /// Delete the output directory.
    Clean,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
