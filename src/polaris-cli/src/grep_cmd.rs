//! `polaris grep` - content search.

use anyhow::Result;
use clap::Parser;

use polaris_search::{
    CancellationToken, ContentMatch, MatchOptions, SearchQuery, SearchResult, SearchService,
};

use crate::cli::{MatchArgs, WorkspaceArgs};
use crate::output::{format_content_match, print_json};

/// Glob filters shared by `grep` and `replace`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GlobArgs {
    /// Only search files matching this glob (repeatable)
    #[arg(long = "include", short = 'g', value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip files matching this glob (repeatable)
    #[arg(long = "exclude", short = 'x', value_name = "GLOB")]
    pub exclude: Vec<String>,
}

impl GlobArgs {
    /// Applies the filters to `query`.
    pub fn apply(&self, query: SearchQuery) -> SearchQuery {
        query
            .include_globs(self.include.iter().cloned())
            .exclude_globs(self.exclude.iter().cloned())
    }
}

/// Search file contents.
#[derive(Debug, Parser)]
pub struct GrepCli {
    /// Text to find, or a pattern with --regex
    pub query: String,

    #[command(flatten)]
    pub matching: MatchArgs,

    #[command(flatten)]
    pub globs: GlobArgs,

    /// Search only these workspace-relative files (repeatable)
    #[arg(long = "open-file", value_name = "PATH")]
    pub open_files: Vec<String>,

    /// Stop after this many matching lines
    #[arg(long = "max-results", short = 'm')]
    pub max_results: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl GrepCli {
    pub async fn run(self, workspace: &WorkspaceArgs) -> Result<()> {
        let service = workspace.service()?;
        let mut query = self
            .globs
            .apply(service.query(&self.query))
            .with_options(MatchOptions::from(self.matching));
        if let Some(max) = self.max_results {
            query = query.max_results(max);
        }

        let results = if self.open_files.is_empty() {
            search_interruptibly(query, |query| service.find_in_files(query)).await?
        } else {
            let open_files = self.open_files;
            search_interruptibly(query, |query| {
                service.find_in_open_files(query, &open_files)
            })
            .await?
        };
        if let Some(snapshot) = service.snapshot() {
            tracing::info!(
                "{} matches on {} lines",
                snapshot.total_count(),
                snapshot.results.len()
            );
        }

        if self.json {
            return print_json(&results);
        }
        for hit in &results {
            println!("{}", format_content_match(hit));
        }
        Ok(())
    }
}

/// Runs a content search that Ctrl-C cancels.
///
/// An interrupted search ends with whatever it found so far, which is nothing.
pub(crate) async fn search_interruptibly<F, Fut>(
    query: SearchQuery,
    search: F,
) -> SearchResult<Vec<ContentMatch>>
where
    F: FnOnce(SearchQuery) -> Fut,
    Fut: Future<Output = SearchResult<Vec<ContentMatch>>>,
{
    let token = CancellationToken::new();
    let interrupt = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, cancelling search");
                token.cancel();
            }
        })
    };

    let results = search(query.cancellation(token)).await;
    interrupt.abort();
    results
}
