//! `polaris replace` - search, then replace one match or all of them.

use std::str::FromStr;

use anyhow::{Result, bail};
use clap::Parser;

use polaris_search::{ContentMatch, MatchOptions, ReplacementOp};

use crate::cli::{MatchArgs, WorkspaceArgs};
use crate::grep_cmd::{GlobArgs, search_interruptibly};
use crate::output::{format_content_match, format_outcome, print_json};

/// A match position written `PATH:LINE:COLUMN`, with 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLocation {
    pub path: String,
    pub line: u64,
    pub column: usize,
}

impl FromStr for MatchLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let (Some(column), Some(line), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected PATH:LINE:COLUMN, got '{s}'"));
        };
        if path.is_empty() {
            return Err("path must not be empty".to_string());
        }
        let line: u64 = line
            .parse()
            .map_err(|_| format!("invalid line number '{line}'"))?;
        let column: usize = column
            .parse()
            .map_err(|_| format!("invalid column '{column}'"))?;
        if line == 0 || column == 0 {
            return Err("line and column start at 1".to_string());
        }
        Ok(Self {
            path: path.to_string(),
            line,
            column,
        })
    }
}

impl MatchLocation {
    /// Builds the replacement for the match found at this location.
    pub fn to_op(&self, results: &[ContentMatch], replacement: &str) -> Result<ReplacementOp> {
        let column = self.column - 1;
        let span = results
            .iter()
            .filter(|hit| hit.path == self.path)
            .flat_map(|hit| hit.spans.iter())
            .find(|span| span.line_number == self.line && span.column == column);
        let Some(span) = span else {
            bail!(
                "No match at {}:{}:{}",
                self.path,
                self.line,
                self.column
            );
        };
        Ok(ReplacementOp {
            path: self.path.clone(),
            line_number: self.line,
            column,
            length: span.len(),
            replacement_text: replacement.to_string(),
        })
    }
}

/// Replace content matches.
#[derive(Debug, Parser)]
pub struct ReplaceCli {
    /// Text to find, or a pattern with --regex
    pub pattern: String,

    /// Replacement text
    pub replacement: String,

    #[command(flatten)]
    pub matching: MatchArgs,

    #[command(flatten)]
    pub globs: GlobArgs,

    /// Replace only the match starting here
    #[arg(long, value_name = "PATH:LINE:COL")]
    pub at: Option<MatchLocation>,

    /// List the matches without changing any file
    #[arg(long)]
    pub dry_run: bool,

    /// Output the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl ReplaceCli {
    pub async fn run(self, workspace: &WorkspaceArgs) -> Result<()> {
        let service = workspace.service()?;
        let query = self
            .globs
            .apply(service.query(&self.pattern))
            .with_options(MatchOptions::from(self.matching));

        let results = search_interruptibly(query, |query| service.find_in_files(query)).await?;
        if results.is_empty() {
            println!("No matches");
            return Ok(());
        }

        if self.dry_run {
            for hit in &results {
                println!("{}", format_content_match(hit));
            }
            let total: usize = results.iter().map(|hit| hit.spans.len()).sum();
            println!("Would replace {total} matches on {} lines", results.len());
            return Ok(());
        }

        let outcome = match &self.at {
            Some(location) => {
                let op = location.to_op(&results, &self.replacement)?;
                service.replace_one(&op).await?
            }
            None => service.replace_all(&self.replacement).await,
        };

        if self.json {
            print_json(&outcome)?;
        } else {
            println!("{}", format_outcome(&outcome));
        }
        if !outcome.failed_paths.is_empty() {
            bail!("{} file(s) could not be updated", outcome.failed_paths.len());
        }
        Ok(())
    }
}
