//! CLI argument parsing and command dispatch.
//!
//! - `args` - Command-line argument structures
//! - `handlers` - Command dispatch

pub mod args;
pub mod handlers;

pub use args::{Cli, Commands, LogLevel, MatchArgs, WorkspaceArgs};
pub use handlers::dispatch_command;
