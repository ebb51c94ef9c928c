use anyhow::Result;
use clap::Parser;

use polaris_cli::cli::{Cli, dispatch_command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_level = std::env::var("POLARIS_LOG_LEVEL").ok();
    let log_level = cli.effective_log_level(env_level.as_deref());

    let filter_str = if std::env::var("RUST_LOG").is_ok() {
        format!(
            "error,polaris_cli={},polaris_search={}",
            log_level.as_filter_str(),
            log_level.as_filter_str()
        )
    } else {
        log_level.as_filter_str().to_string()
    };

    // Results go to stdout; keep logs out of the way.
    tracing_subscriber::fmt()
        .with_env_filter(&filter_str)
        .with_writer(std::io::stderr)
        .init();

    dispatch_command(cli).await
}
