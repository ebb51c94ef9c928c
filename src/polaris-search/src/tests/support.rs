//! Shared fixtures: scripted stand-ins for `rg` and instrumented file access.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::config::SearchConfig;
use crate::content::ContentSearchEngine;
use crate::enumerate::FileEnumerator;
use crate::error::{SearchError, SearchResult};
use crate::host::{LocalFs, TextEdit, WorkspaceFs};
use crate::process::ToolCommand;
use crate::replace::apply_edits;
use crate::service::SearchService;
use crate::tool::ToolDetector;

/// A workspace directory plus a separate directory for scripts and canned output.
pub struct Fixture {
    pub workspace: TempDir,
    pub tools: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            workspace: TempDir::new().unwrap(),
            tools: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.workspace.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).unwrap()
    }

    /// Moves a file's modification time far into the past.
    pub fn age(&self, relative: &str) {
        let file = std::fs::File::options()
            .write(true)
            .open(self.path(relative))
            .unwrap();
        file.set_modified(std::time::UNIX_EPOCH + Duration::from_secs(1_000_000))
            .unwrap();
    }

    /// Where the canned search output lives.
    pub fn output_file(&self) -> PathBuf {
        self.tools.path().join("out.jsonl")
    }

    /// Replaces the canned search output.
    pub fn set_output(&self, lines: &[String]) {
        let mut text = lines.join("\n");
        text.push('\n');
        std::fs::write(self.output_file(), text).unwrap();
    }

    /// A stand-in for `rg` that runs `body` with `sh`.
    pub fn script(&self, name: &str, body: &str) -> ToolCommand {
        let script = self.tools.path().join(name);
        std::fs::write(&script, body).unwrap();
        ToolCommand::new("sh").with_leading_args([script.into_os_string()])
    }

    /// A stand-in for `rg` that prints the canned output.
    pub fn canned_rg(&self) -> ToolCommand {
        self.set_output(&[]);
        self.script(
            "fake-rg.sh",
            &format!("cat '{}'\n", self.output_file().display()),
        )
    }

    pub fn engine(&self, rg: ToolCommand) -> ContentSearchEngine {
        ContentSearchEngine::with_command(rg, Duration::from_millis(200))
    }

    pub fn config(&self) -> SearchConfig {
        SearchConfig::new(self.root())
    }

    /// A service that walks the workspace and runs `rg` as given.
    pub fn service(&self, rg: ToolCommand, fs: Arc<dyn WorkspaceFs>) -> SearchService {
        let config = self.config();
        SearchService::with_components(
            config.clone(),
            ToolDetector::with_probe(&config, |_| false),
            FileEnumerator::new(&config),
            self.engine(rg),
            fs,
        )
    }

    /// A `match` record for `relative` as `rg --json` prints it.
    pub fn match_line(
        &self,
        relative: &str,
        line: u64,
        text: &str,
        spans: &[(usize, usize)],
    ) -> String {
        match_record(&self.path(relative), line, text, spans)
    }
}

pub fn match_record(path: &Path, line: u64, text: &str, spans: &[(usize, usize)]) -> String {
    let submatches: Vec<serde_json::Value> = spans
        .iter()
        .map(|&(start, end)| {
            serde_json::json!({"match": {"text": &text[start..end]}, "start": start, "end": end})
        })
        .collect();
    serde_json::json!({
        "type": "match",
        "data": {
            "path": {"text": path.to_string_lossy()},
            "lines": {"text": text},
            "line_number": line,
            "absolute_offset": 0,
            "submatches": submatches,
        }
    })
    .to_string()
}

/// Local file access that refuses to write some files.
#[derive(Debug, Default)]
pub struct FailingWrites {
    pub fail: HashSet<PathBuf>,
}

impl FailingWrites {
    pub fn new(fail: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            fail: fail.into_iter().collect(),
        }
    }
}

#[async_trait]
impl WorkspaceFs for FailingWrites {
    async fn read_to_string(&self, path: &Path) -> SearchResult<String> {
        LocalFs.read_to_string(path).await
    }

    async fn modified_millis(&self, path: &Path) -> SearchResult<u64> {
        LocalFs.modified_millis(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> SearchResult<()> {
        if self.fail.contains(path) {
            return Err(SearchError::write_file(
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        LocalFs.write(path, contents).await
    }
}

/// Local file access with some files open in editable buffers.
#[derive(Debug, Default)]
pub struct OpenBuffers {
    pub buffers: Mutex<HashMap<PathBuf, String>>,
    pub edits: Mutex<Vec<(PathBuf, Vec<TextEdit>)>>,
    pub direct_writes: Mutex<Vec<PathBuf>>,
}

impl OpenBuffers {
    pub fn open(&self, path: PathBuf, text: &str) {
        self.buffers.lock().insert(path, text.to_string());
    }
}

#[async_trait]
impl WorkspaceFs for OpenBuffers {
    async fn read_to_string(&self, path: &Path) -> SearchResult<String> {
        LocalFs.read_to_string(path).await
    }

    async fn modified_millis(&self, path: &Path) -> SearchResult<u64> {
        LocalFs.modified_millis(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> SearchResult<()> {
        self.direct_writes.lock().push(path.to_path_buf());
        LocalFs.write(path, contents).await
    }

    async fn open_buffer_text(&self, path: &Path) -> Option<String> {
        self.buffers.lock().get(path).cloned()
    }

    async fn apply_buffer_edits(&self, path: &Path, edits: &[TextEdit]) -> SearchResult<()> {
        let saved = {
            let mut buffers = self.buffers.lock();
            let buffer = buffers.get_mut(path).unwrap();
            *buffer = apply_edits(buffer, edits).unwrap();
            buffer.clone()
        };
        self.edits.lock().push((path.to_path_buf(), edits.to_vec()));
        LocalFs.write(path, &saved).await
    }
}
