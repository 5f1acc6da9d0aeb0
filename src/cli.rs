// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `bundlewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bundlewatch",
    version,
    about = "Run asset build commands when project files are saved, and report their diagnostics.",
    long_about = None
)]
pub struct CliArgs {
    /// Project root to watch.
    ///
    /// Default: the current working directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Bundlewatch.toml` in the project root. A missing default
    /// file means built-in defaults; a missing explicit file is an error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run the commands for FILES (or every available command) once, wait
    /// for them to finish and exit, instead of watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUNDLEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate config, print the resolution rules, but don't run
    /// any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// Changed files to resolve in `--once` mode.
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_mode_collects_positional_files() {
        let args = CliArgs::try_parse_from([
            "bundlewatch",
            "--once",
            "--root",
            "web",
            "web/site.less",
            "web/app.js",
        ])
        .unwrap();

        assert!(args.once);
        assert_eq!(args.root, Some(PathBuf::from("web")));
        assert_eq!(
            args.files,
            vec![PathBuf::from("web/site.less"), PathBuf::from("web/app.js")]
        );
        assert!(args.config.is_none());
    }
}
