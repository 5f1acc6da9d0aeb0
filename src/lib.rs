// src/lib.rs

pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod sink;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::engine::{CommandIdentity, CommandScheduler};
use crate::exec::TokioProcessRunner;
use crate::fs::{FileSystem, RealFileSystem};
use crate::sink::{Sink, TerminalSink};
use crate::watch::CommandResolver;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - command resolution
/// - scheduler and process runner
/// - (optional) file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let root = project_root(&args, fs.as_ref())?;
    let cfg = load_or_default(args.config.as_deref(), &root)?;
    let resolver = Arc::new(CommandResolver::new(&cfg, &root, Arc::clone(&fs))?);

    if args.dry_run {
        print_dry_run(&cfg, &resolver);
        return Ok(());
    }

    let sink: Arc<dyn Sink> = Arc::new(TerminalSink::new());
    let runner = TokioProcessRunner::new(Handle::current(), sink, Arc::clone(&fs));
    let scheduler = CommandScheduler::new(Arc::new(runner));

    if args.once {
        let commands = once_commands(&args, &resolver);
        if commands.is_empty() {
            warn!("nothing to run");
        }
        for command in commands {
            scheduler.trigger(command);
        }
        scheduler.wait_idle().await;
        info!("all commands finished");
        return Ok(());
    }

    let _watcher = watch::spawn_watcher(Arc::clone(&resolver), scheduler.clone())?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("shutdown requested; waiting for running commands");
    scheduler.wait_idle().await;
    debug!("shutdown complete");
    Ok(())
}

fn project_root(args: &CliArgs, fs: &dyn FileSystem) -> Result<PathBuf> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("reading current directory")?,
    };
    if !fs.is_dir(&root) {
        anyhow::bail!("project root {:?} is not a directory", root);
    }
    fs.canonicalize(&root)
}

/// Commands for `--once`: the ones owning the given files, or every
/// available command when no files were given.
fn once_commands(args: &CliArgs, resolver: &CommandResolver) -> Vec<CommandIdentity> {
    if args.files.is_empty() {
        return resolver.available_commands();
    }

    let mut commands: Vec<CommandIdentity> = Vec::new();
    for file in &args.files {
        match resolver.resolve(file) {
            Some(command) if !commands.contains(&command) => commands.push(command),
            Some(_) => {}
            None => warn!(?file, "no build command for file"),
        }
    }
    commands
}

/// Print the resolution rules and which commands exist.
fn print_dry_run(cfg: &ConfigFile, resolver: &CommandResolver) {
    println!("bundlewatch dry-run");
    println!("  root = {}", resolver.root().display());
    println!("  config.tooling_dir = {}", cfg.config().tooling_dir);
    println!("  config.default_command = {}", cfg.config().default_command);
    if !cfg.default_section().exclude.is_empty() {
        println!("  default.exclude = {:?}", cfg.default_section().exclude);
    }
    println!();

    println!("assets:");
    for (kind, asset) in cfg.assets() {
        println!("  - {kind}");
        println!("      suffixes: {:?}", asset.suffixes);
        match &asset.command {
            Some(cmd) => println!("      command: {cmd}"),
            None => println!("      command: (default)"),
        }
    }
    println!();

    let available = resolver.available_commands();
    println!("available commands ({}):", available.len());
    for command in available {
        println!("  - {command}");
    }

    let entries = resolver.tooling_entries();
    if !entries.is_empty() {
        println!();
        println!("tooling directory entries:");
        for entry in entries {
            println!("  - {}", entry.display());
        }
    }

    debug!("dry-run complete (no execution)");
}
