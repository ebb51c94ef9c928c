//! `polaris files` - rank workspace paths against a query.

use anyhow::Result;
use clap::Parser;

use polaris_search::{MatchOptions, SearchService};

use crate::cli::{MatchArgs, WorkspaceArgs};
use crate::output::{format_file_match, print_json};

/// Find files by name.
#[derive(Debug, Parser)]
pub struct FilesCli {
    /// Fuzzy query, or a pattern with --regex
    pub query: String,

    #[command(flatten)]
    pub matching: MatchArgs,

    /// Maximum number of files to show
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print paths with matched characters wrapped in <mark>
    #[arg(long, conflicts_with = "json")]
    pub html: bool,
}

impl FilesCli {
    pub async fn run(self, workspace: &WorkspaceArgs) -> Result<()> {
        let mut config = workspace.search_config()?;
        if let Some(limit) = self.limit {
            config.file_result_limit = limit;
        }
        let service = SearchService::new(config);

        let options = MatchOptions::from(self.matching);
        let files = service.find_files(&self.query, options).await?;
        tracing::info!(
            "{} files matched using {}",
            files.len(),
            service.detect_search_tool()
        );

        if self.json {
            return print_json(&files);
        }
        for file in &files {
            println!("{}", format_file_match(file, self.html));
        }
        Ok(())
    }
}
