//! `polaris preview` - show a file excerpt around a line.

use anyhow::Result;
use clap::Parser;

use crate::cli::WorkspaceArgs;
use crate::output::{format_preview, print_json};

/// Show a file excerpt.
#[derive(Debug, Parser)]
pub struct PreviewCli {
    /// Workspace-relative file path
    pub path: String,

    /// 1-based line to center on
    #[arg(long, short = 'l')]
    pub line: Option<u64>,

    /// Lines of context around the line (defaults to the configured preview size)
    #[arg(long, short = 'c')]
    pub context: Option<usize>,

    /// Output the whole file and its language as JSON
    #[arg(long)]
    pub json: bool,
}

impl PreviewCli {
    pub async fn run(self, workspace: &WorkspaceArgs) -> Result<()> {
        let service = workspace.service()?;
        let preview = service.preview(&self.path, self.line).await?;

        if self.json {
            return print_json(&preview);
        }

        let context = self.context.unwrap_or(service.config().preview_lines);
        println!("{} ({})", preview.path, preview.language);
        for line in format_preview(&preview.window(context), preview.highlight_line) {
            println!("{line}");
        }
        Ok(())
    }
}
