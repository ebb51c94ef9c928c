//! CLI argument structures and parsing.
//!
//! Defines all command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use polaris_search::MatchOptions;

use crate::detect_cmd::DetectCli;
use crate::files_cmd::FilesCli;
use crate::grep_cmd::GrepCli;
use crate::preview_cmd::PreviewCli;
use crate::replace_cmd::ReplaceCli;

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Polaris - find files, search contents and replace matches.
#[derive(Debug, Parser)]
#[command(name = "polaris")]
#[command(author, version)]
#[command(about = "Polaris - workspace search and replace", long_about = None)]
pub struct Cli {
    #[clap(flatten)]
    pub workspace: WorkspaceArgs,

    /// Enable verbose output (same as --log-level debug)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Set log verbosity level (error, warn, info, debug, trace)
    #[arg(
        long = "log-level",
        short = 'L',
        value_enum,
        global = true,
        help_heading = "Debugging"
    )]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Resolves the effective log level.
    ///
    /// `-v` wins over `--log-level`, which wins over `POLARIS_LOG_LEVEL`.
    pub fn effective_log_level(&self, env_level: Option<&str>) -> LogLevel {
        if self.verbose {
            return LogLevel::Debug;
        }
        if let Some(level) = self.log_level {
            return level;
        }
        env_level
            .and_then(LogLevel::from_str_loose)
            .unwrap_or_default()
    }
}

/// Options locating the workspace and its settings.
#[derive(Debug, Clone, Default, Args)]
pub struct WorkspaceArgs {
    /// Workspace root (defaults to the current directory)
    #[arg(long = "root", short = 'C', global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Settings file (defaults to <config dir>/polaris/config.toml)
    #[arg(long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Match toggles shared by the search commands.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct MatchArgs {
    /// Match case exactly
    #[arg(long = "case-sensitive", short = 's')]
    pub case_sensitive: bool,

    /// Only match whole words
    #[arg(long = "whole-word", short = 'w')]
    pub whole_word: bool,

    /// Treat the query as a regular expression
    #[arg(long = "regex", short = 'r')]
    pub regex: bool,
}

impl From<MatchArgs> for MatchOptions {
    fn from(args: MatchArgs) -> Self {
        MatchOptions {
            case_sensitive: args.case_sensitive,
            whole_word: args.whole_word,
            is_regex: args.regex,
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find files by fuzzy or regex name match
    #[command(visible_alias = "f")]
    Files(FilesCli),

    /// Search file contents
    #[command(visible_alias = "g")]
    Grep(GrepCli),

    /// Replace content matches
    Replace(ReplaceCli),

    /// Show which file search tool is in use
    Detect(DetectCli),

    /// Show a file excerpt around a line
    Preview(PreviewCli),
}
