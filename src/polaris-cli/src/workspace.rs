//! Building the search service from the global options.

use std::path::PathBuf;

use anyhow::{Context, Result};
use polaris_search::{SearchConfig, SearchService, SearchSettings};

use crate::cli::WorkspaceArgs;

impl WorkspaceArgs {
    /// The workspace root, defaulting to the current directory.
    pub fn root_dir(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }

    /// Settings from `--config` or the default location.
    pub fn settings(&self) -> Result<SearchSettings> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => match SearchSettings::default_path() {
                Some(path) => path,
                None => return Ok(SearchSettings::default()),
            },
        };
        Ok(SearchSettings::load(&path)?)
    }

    pub fn search_config(&self) -> Result<SearchConfig> {
        let settings = self.settings()?;
        Ok(SearchConfig::builder(self.root_dir()?)
            .settings(&settings)
            .build())
    }

    pub fn service(&self) -> Result<SearchService> {
        let config = self.search_config()?;
        tracing::debug!("Workspace root: {}", config.root.display());
        Ok(SearchService::new(config))
    }
}
