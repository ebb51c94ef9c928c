//! Configuration types for the search pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{SearchError, SearchResult};

/// Directories every enumeration and content search skips, whichever tool runs.
pub const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules", "dist", "out", "build"];

/// Default cap on content matches returned by one search.
pub const DEFAULT_MAX_RESULTS: usize = 2000;

/// Default number of ranked paths returned by a file search.
pub const DEFAULT_FILE_RESULT_LIMIT: usize = 100;

/// Default time a cancelled search process gets to exit before it is killed.
pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_secs(2);

/// Configuration for the search pipeline.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Workspace root every relative path is resolved against.
    pub root: PathBuf,

    /// Maximum number of content matches per search.
    pub max_results: usize,

    /// Maximum number of ranked paths per file search.
    pub file_result_limit: usize,

    /// Grace period between the termination request and a forced kill.
    pub cancel_grace: Duration,

    /// Lines of context shown around the highlighted line in a preview.
    pub preview_lines: usize,

    /// Debounce the host applies to live (as-you-type) searches.
    pub live_search_delay: Duration,

    /// Explicit ripgrep executable; `None` resolves `rg` on `PATH`.
    pub ripgrep_program: Option<PathBuf>,

    /// Explicit fd executable; `None` resolves `fd` on `PATH`.
    pub fd_program: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_results: DEFAULT_MAX_RESULTS,
            file_result_limit: DEFAULT_FILE_RESULT_LIMIT,
            cancel_grace: DEFAULT_CANCEL_GRACE,
            preview_lines: 10,
            live_search_delay: Duration::from_millis(300),
            ripgrep_program: None,
            fd_program: None,
        }
    }
}

impl SearchConfig {
    /// Creates a new configuration with the specified root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Creates a builder for constructing a configuration.
    pub fn builder(root: impl Into<PathBuf>) -> SearchConfigBuilder {
        SearchConfigBuilder::new(root)
    }

    /// Checks if a directory name belongs to the fixed exclusion set.
    pub fn is_excluded_dir(name: &str) -> bool {
        EXCLUDED_DIRS.contains(&name)
    }

    /// The ripgrep program to run.
    pub fn ripgrep_program(&self) -> PathBuf {
        self.ripgrep_program
            .clone()
            .unwrap_or_else(|| PathBuf::from("rg"))
    }

    /// The fd program to run.
    pub fn fd_program(&self) -> PathBuf {
        self.fd_program.clone().unwrap_or_else(|| PathBuf::from("fd"))
    }
}

/// Builder for creating `SearchConfig` instances.
#[derive(Debug)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Creates a new builder with the specified root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            config: SearchConfig::new(root),
        }
    }

    /// Sets the content-search result cap.
    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    /// Sets how many ranked paths a file search keeps.
    pub fn file_result_limit(mut self, limit: usize) -> Self {
        self.config.file_result_limit = limit;
        self
    }

    /// Sets the grace period given to a cancelled process.
    pub fn cancel_grace(mut self, grace: Duration) -> Self {
        self.config.cancel_grace = grace;
        self
    }

    /// Sets the preview context size.
    pub fn preview_lines(mut self, lines: usize) -> Self {
        self.config.preview_lines = lines;
        self
    }

    /// Sets the live-search debounce.
    pub fn live_search_delay(mut self, delay: Duration) -> Self {
        self.config.live_search_delay = delay;
        self
    }

    /// Uses a specific ripgrep executable.
    pub fn ripgrep_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.ripgrep_program = Some(program.into());
        self
    }

    /// Uses a specific fd executable.
    pub fn fd_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.fd_program = Some(program.into());
        self
    }

    /// Applies the values present in a settings file.
    pub fn settings(mut self, settings: &SearchSettings) -> Self {
        if let Some(max) = settings.max_results {
            self.config.max_results = max;
        }
        if let Some(limit) = settings.file_result_limit {
            self.config.file_result_limit = limit;
        }
        if let Some(ms) = settings.cancel_grace_ms {
            self.config.cancel_grace = Duration::from_millis(ms);
        }
        if let Some(lines) = settings.preview_lines {
            self.config.preview_lines = lines;
        }
        if let Some(ms) = settings.live_search_delay_ms {
            self.config.live_search_delay = Duration::from_millis(ms);
        }
        if let Some(program) = &settings.ripgrep_path {
            self.config.ripgrep_program = Some(program.clone());
        }
        if let Some(program) = &settings.fd_path {
            self.config.fd_program = Some(program.clone());
        }
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> SearchConfig {
        self.config
    }
}

/// User tunables as stored in `config.toml`.
///
/// Every key is optional; absent keys keep the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSettings {
    pub max_results: Option<usize>,
    pub file_result_limit: Option<usize>,
    pub cancel_grace_ms: Option<u64>,
    pub preview_lines: Option<usize>,
    pub live_search_delay_ms: Option<u64>,
    pub ripgrep_path: Option<PathBuf>,
    pub fd_path: Option<PathBuf>,
}

impl SearchSettings {
    /// Default location: `<config dir>/polaris/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("polaris").join("config.toml"))
    }

    /// Parses settings from TOML text.
    pub fn from_toml(text: &str, origin: &Path) -> SearchResult<Self> {
        toml::from_str(text).map_err(|e| SearchError::Config {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Loads settings from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> SearchResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file at {}", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(SearchError::read_file(path, e)),
        }
    }
}
