//! Access to workspace files, either on disk or through the editor's buffers.

use std::ops::Range;
use std::path::Path;

use async_trait::async_trait;

use crate::error::{SearchError, SearchResult};
use crate::ripgrep::millis_since_epoch;

/// A substitution over the whole text of a file, in byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub new_text: String,
}

/// File primitives the replace flow needs from its host.
///
/// Paths are absolute. Hosts with editable buffers report which files are
/// open and apply edits to them so unsaved state is respected.
#[async_trait]
pub trait WorkspaceFs: Send + Sync {
    async fn read_to_string(&self, path: &Path) -> SearchResult<String>;

    /// Last modification time in milliseconds since the Unix epoch.
    async fn modified_millis(&self, path: &Path) -> SearchResult<u64>;

    async fn write(&self, path: &Path, contents: &str) -> SearchResult<()>;

    /// Text of the editable buffer showing `path`, if the file is open.
    async fn open_buffer_text(&self, _path: &Path) -> Option<String> {
        None
    }

    /// Applies `edits` to the open buffer of `path` and saves it.
    ///
    /// Edits arrive sorted from the end of the text towards the start.
    async fn apply_buffer_edits(&self, path: &Path, _edits: &[TextEdit]) -> SearchResult<()> {
        Err(SearchError::Other(anyhow::anyhow!(
            "No editable buffer for {}",
            path.display()
        )))
    }
}

/// Plain filesystem access with no open buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl WorkspaceFs for LocalFs {
    async fn read_to_string(&self, path: &Path) -> SearchResult<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SearchError::read_file(path, e))
    }

    async fn modified_millis(&self, path: &Path) -> SearchResult<u64> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| SearchError::read_file(path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| SearchError::read_file(path, e))?;
        Ok(millis_since_epoch(modified))
    }

    async fn write(&self, path: &Path, contents: &str) -> SearchResult<()> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| SearchError::write_file(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_fs_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.txt");

        LocalFs.write(&path, "hello").await.unwrap();
        assert_eq!(LocalFs.read_to_string(&path).await.unwrap(), "hello");
        assert!(LocalFs.modified_millis(&path).await.unwrap() > 0);
        assert!(LocalFs.open_buffer_text(&path).await.is_none());
    }

    #[tokio::test]
    async fn test_local_fs_errors_name_the_file() {
        let err = LocalFs
            .read_to_string(Path::new("/nonexistent/polaris.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::ReadFile { .. }));
        assert!(err.to_string().contains("/nonexistent/polaris.txt"));

        let err = LocalFs
            .write(Path::new("/nonexistent/dir/polaris.txt"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::WriteFile { .. }));
    }

    #[tokio::test]
    async fn test_local_fs_has_no_buffers() {
        let err = LocalFs
            .apply_buffer_edits(Path::new("/w/a.rs"), &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/w/a.rs"));
    }
}
