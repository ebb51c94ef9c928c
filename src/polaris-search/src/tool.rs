//! Detection of the external search tools installed on the machine.

use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::SearchConfig;

/// The file enumeration strategy available on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTool {
    /// `fd`.
    Fd,
    /// `rg --files`.
    Ripgrep,
    /// In-process directory walk.
    Walk,
}

impl SearchTool {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fd => "fd",
            Self::Ripgrep => "rg",
            Self::Walk => "walk",
        }
    }
}

impl fmt::Display for SearchTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Probe = Box<dyn Fn(&Path) -> bool + Send + Sync>;

/// Probes for `fd`, then `rg`, and remembers the answer.
///
/// The first detection is cached until [`ToolDetector::clear`] is called.
pub struct ToolDetector {
    fd_program: PathBuf,
    ripgrep_program: PathBuf,
    probe: Probe,
    cached: Mutex<Option<SearchTool>>,
}

impl fmt::Debug for ToolDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDetector")
            .field("fd_program", &self.fd_program)
            .field("ripgrep_program", &self.ripgrep_program)
            .field("cached", &*self.cached.lock())
            .finish_non_exhaustive()
    }
}

impl ToolDetector {
    /// Creates a detector that looks programs up on `PATH`.
    pub fn new(config: &SearchConfig) -> Self {
        Self::with_probe(config, |program| which::which(program).is_ok())
    }

    /// Creates a detector with a custom presence check.
    pub fn with_probe(
        config: &SearchConfig,
        probe: impl Fn(&Path) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            fd_program: config.fd_program(),
            ripgrep_program: config.ripgrep_program(),
            probe: Box::new(probe),
            cached: Mutex::new(None),
        }
    }

    /// Returns the preferred available tool.
    pub fn detect(&self) -> SearchTool {
        let mut cached = self.cached.lock();
        if let Some(tool) = *cached {
            return tool;
        }

        let tool = if (self.probe)(&self.fd_program) {
            SearchTool::Fd
        } else if (self.probe)(&self.ripgrep_program) {
            SearchTool::Ripgrep
        } else {
            tracing::info!("Neither fd nor rg found on PATH, using directory walk");
            SearchTool::Walk
        };

        tracing::debug!("Detected file search tool: {}", tool);
        *cached = Some(tool);
        tool
    }

    /// Returns the cached detection, if any.
    pub fn cached(&self) -> Option<SearchTool> {
        *self.cached.lock()
    }

    /// Forgets the cached detection.
    pub fn clear(&self) {
        *self.cached.lock() = None;
    }

    /// The fd program this detector probes.
    pub fn fd_program(&self) -> &Path {
        &self.fd_program
    }

    /// The ripgrep program this detector probes.
    pub fn ripgrep_program(&self) -> &Path {
        &self.ripgrep_program
    }
}
