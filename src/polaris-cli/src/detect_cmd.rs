//! `polaris detect` - report the file enumeration tool.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use polaris_search::SearchTool;

use crate::cli::WorkspaceArgs;
use crate::output::print_json;

/// Show which file search tool is in use.
#[derive(Debug, Parser)]
pub struct DetectCli {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Detection {
    tool: SearchTool,
    fd_program: String,
    ripgrep_program: String,
}

impl DetectCli {
    pub fn run(self, workspace: &WorkspaceArgs) -> Result<()> {
        let config = workspace.search_config()?;
        let detection = Detection {
            fd_program: config.fd_program().display().to_string(),
            ripgrep_program: config.ripgrep_program().display().to_string(),
            tool: polaris_search::ToolDetector::new(&config).detect(),
        };

        if self.json {
            return print_json(&detection);
        }
        println!("File search: {}", detection.tool);
        println!("fd:          {}", detection.fd_program);
        println!("rg:          {}", detection.ripgrep_program);
        Ok(())
    }
}
