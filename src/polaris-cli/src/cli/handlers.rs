//! Command dispatch.

use anyhow::Result;

use super::args::{Cli, Commands};

/// Routes a parsed command line to its command.
pub async fn dispatch_command(cli: Cli) -> Result<()> {
    let workspace = cli.workspace;
    match cli.command {
        Commands::Files(files_cli) => files_cli.run(&workspace).await,
        Commands::Grep(grep_cli) => grep_cli.run(&workspace).await,
        Commands::Replace(replace_cli) => replace_cli.run(&workspace).await,
        Commands::Detect(detect_cli) => detect_cli.run(&workspace),
        Commands::Preview(preview_cli) => preview_cli.run(&workspace).await,
    }
}
