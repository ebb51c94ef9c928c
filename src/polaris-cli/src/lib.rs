//! Polaris command line.
//!
//! A terminal front end for the `polaris-search` panel pipeline:
//!
//! - `files` - fuzzy or regex file finding
//! - `grep` - content search, optionally limited to a set of files
//! - `replace` - replace one match or all of them
//! - `detect` - report the file enumeration tool
//! - `preview` - show a file excerpt around a line
//!
//! Each command lives in its own `*_cmd` module; `cli/` holds the argument
//! structures and dispatch.

pub mod cli;
pub mod detect_cmd;
pub mod files_cmd;
pub mod grep_cmd;
pub mod output;
pub mod preview_cmd;
pub mod replace_cmd;
pub mod workspace;
