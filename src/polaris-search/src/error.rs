//! Error types for search and replace operations.

use std::path::PathBuf;

/// Result type alias for search operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while enumerating, searching or replacing.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The workspace root does not exist.
    #[error("Root directory does not exist: {0}")]
    RootNotFound(PathBuf),

    /// The workspace root is not a directory.
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A search tool was detected but could not be started.
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A search tool exited with a code it uses for real failures.
    #[error("{program} exited with code {}: {stderr}", display_exit_code(.code))]
    ProcessFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The child process did not expose the piped stream we asked for.
    #[error("{program} {stream} stream unavailable")]
    StreamUnavailable {
        program: String,
        stream: &'static str,
    },

    /// The replace target is not part of the last search results.
    #[error("No search result recorded for {path}:{line}; run the search again")]
    StaleReference { path: String, line: u64 },

    /// The recorded match no longer exists in the file.
    #[error("Match no longer exists at {path}:{line}:{column}")]
    StaleMatch {
        path: String,
        line: u64,
        column: usize,
    },

    /// Failed to read file contents.
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file contents.
    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse glob pattern.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },

    /// The settings file could not be parsed.
    #[error("Invalid settings file '{path}': {reason}")]
    Config { path: PathBuf, reason: String },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error wrapper.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

fn display_exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "<signal>".to_string(), |c| c.to_string())
}

impl SearchError {
    /// Creates a new `RootNotFound` error.
    pub fn root_not_found(path: impl Into<PathBuf>) -> Self {
        Self::RootNotFound(path.into())
    }

    /// Creates a new `NotADirectory` error.
    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Creates a new `Spawn` error.
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Creates a new `ProcessFailed` error.
    pub fn process_failed(
        program: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ProcessFailed {
            program: program.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Creates a new `StaleMatch` error.
    pub fn stale_match(path: impl Into<String>, line: u64, column: usize) -> Self {
        Self::StaleMatch {
            path: path.into(),
            line,
            column,
        }
    }

    /// Creates a new `ReadFile` error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a new `WriteFile` error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a new `InvalidGlobPattern` error.
    pub fn invalid_glob(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGlobPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error means recorded results no longer describe the files.
    ///
    /// Callers react to these by re-running the search.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleReference { .. } | Self::StaleMatch { .. })
    }
}
