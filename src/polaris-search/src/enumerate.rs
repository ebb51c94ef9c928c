//! Listing every file of a workspace with whichever tool is available.

use std::ffi::OsString;
use std::path::Path;

use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;

use crate::config::{EXCLUDED_DIRS, SearchConfig};
use crate::error::{SearchError, SearchResult};
use crate::process::{ToolCommand, run_to_completion};
use crate::tool::SearchTool;

/// Produces workspace-relative file paths.
///
/// All three strategies skip [`EXCLUDED_DIRS`] and include hidden files.
#[derive(Debug, Clone)]
pub struct FileEnumerator {
    fd: ToolCommand,
    ripgrep: ToolCommand,
}

impl FileEnumerator {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            fd: ToolCommand::new(config.fd_program()),
            ripgrep: ToolCommand::new(config.ripgrep_program()),
        }
    }

    /// Overrides the commands used for the process strategies.
    pub fn with_commands(fd: ToolCommand, ripgrep: ToolCommand) -> Self {
        Self { fd, ripgrep }
    }

    /// Lists the files under `root` using `tool`.
    pub async fn enumerate(&self, tool: SearchTool, root: &Path) -> SearchResult<Vec<String>> {
        let files = match tool {
            SearchTool::Fd => {
                validate_root(root)?;
                self.list_with(&self.fd, &fd_args(root), root, &[0]).await?
            }
            SearchTool::Ripgrep => {
                validate_root(root)?;
                // rg exits with 1 when it ran fine but produced nothing.
                self.list_with(&self.ripgrep, &ripgrep_args(root), root, &[0, 1])
                    .await?
            }
            SearchTool::Walk => walk(root).await?,
        };

        tracing::debug!(
            "Enumerated {} files under {} with {}",
            files.len(),
            root.display(),
            tool
        );
        Ok(files)
    }

    async fn list_with(
        &self,
        tool: &ToolCommand,
        args: &[OsString],
        root: &Path,
        success_codes: &[i32],
    ) -> SearchResult<Vec<String>> {
        let output = run_to_completion(tool, args, root).await?;
        match output.status.code() {
            Some(code) if success_codes.contains(&code) => Ok(parse_listing(&output.stdout, root)),
            code => Err(SearchError::process_failed(
                tool.display_name(),
                code,
                output.stderr,
            )),
        }
    }
}

pub(crate) fn validate_root(root: &Path) -> SearchResult<()> {
    if !root.exists() {
        return Err(SearchError::root_not_found(root));
    }
    if !root.is_dir() {
        return Err(SearchError::not_a_directory(root));
    }
    Ok(())
}

/// `fd --type f --hidden --exclude <dir>... . <root>`
pub fn fd_args(root: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--type".into(), "f".into(), "--hidden".into()];
    for dir in EXCLUDED_DIRS {
        args.push("--exclude".into());
        args.push((*dir).into());
    }
    args.push(".".into());
    args.push(root.as_os_str().to_owned());
    args
}

/// `rg --files --hidden --glob '!<dir>/'... <root>`
pub fn ripgrep_args(root: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--files".into(), "--hidden".into()];
    for dir in EXCLUDED_DIRS {
        args.push("--glob".into());
        args.push(format!("!{dir}/").into());
    }
    args.push(root.as_os_str().to_owned());
    args
}

/// Turns newline-delimited tool output into workspace-relative paths.
pub fn parse_listing(stdout: &str, root: &Path) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(|line| relative_to(root, line))
        .collect()
}

/// Strips the root prefix and any leading separator.
pub(crate) fn relative_to(root: &Path, path: &str) -> String {
    let relative = match Path::new(path).strip_prefix(root) {
        Ok(stripped) => stripped.to_string_lossy().into_owned(),
        Err(_) => path.to_string(),
    };
    relative.trim_start_matches(['/', '\\']).to_string()
}

/// Walks the workspace in-process, honouring ignore files like the tools do.
///
/// Returns nothing when there is no workspace directory to walk.
async fn walk(root: &Path) -> SearchResult<Vec<String>> {
    if !root.is_dir() {
        tracing::debug!("No workspace at {}, nothing to enumerate", root.display());
        return Ok(Vec::new());
    }

    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || walk_blocking(&root))
        .await
        .map_err(|e| SearchError::Other(anyhow::anyhow!("Directory walk panicked: {e}")))?
}

fn walk_blocking(root: &Path) -> SearchResult<Vec<String>> {
    let mut overrides = OverrideBuilder::new(root);
    for dir in EXCLUDED_DIRS {
        let glob = format!("!{dir}/");
        overrides
            .add(&glob)
            .map_err(|e| SearchError::invalid_glob(glob.clone(), e.to_string()))?;
    }
    let overrides = overrides
        .build()
        .map_err(|e| SearchError::invalid_glob("<exclusions>", e.to_string()))?;

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .overrides(overrides)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("Error walking directory: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_string_lossy().into_owned());
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_workspace() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for dir in ["src", ".github", ".git", "node_modules/pkg", "dist", "out", "build"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(root.join(".github/ci.yml"), "on: push").unwrap();
        fs::write(root.join(".env"), "KEY=1").unwrap();
        fs::write(root.join(".git/HEAD"), "ref").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(root.join("dist/app.js"), "").unwrap();
        fs::write(root.join("out/app.js"), "").unwrap();
        fs::write(root.join("build/app.o"), "").unwrap();

        temp_dir
    }

    #[test]
    fn test_fd_args() {
        let args = fd_args(Path::new("/w"));
        let args: Vec<&str> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(
            args,
            [
                "--type", "f", "--hidden", "--exclude", ".git", "--exclude", "node_modules",
                "--exclude", "dist", "--exclude", "out", "--exclude", "build", ".", "/w"
            ]
        );
    }

    #[test]
    fn test_ripgrep_args() {
        let args = ripgrep_args(Path::new("/w"));
        let args: Vec<&str> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(
            args,
            [
                "--files",
                "--hidden",
                "--glob",
                "!.git/",
                "--glob",
                "!node_modules/",
                "--glob",
                "!dist/",
                "--glob",
                "!out/",
                "--glob",
                "!build/",
                "/w"
            ]
        );
    }

    #[test]
    fn test_parse_listing_strips_root() {
        let stdout = "/w/src/main.rs\n/w/README.md\n\n/w/.env\n";
        assert_eq!(
            parse_listing(stdout, Path::new("/w")),
            ["src/main.rs", "README.md", ".env"]
        );
    }

    #[test]
    fn test_parse_listing_keeps_foreign_paths() {
        assert_eq!(parse_listing("other/x.rs\n", Path::new("/w")), ["other/x.rs"]);
    }

    #[tokio::test]
    async fn test_walk_applies_exclusions() {
        let temp_dir = setup_workspace();
        let enumerator = FileEnumerator::new(&SearchConfig::default());

        let files = enumerator
            .enumerate(SearchTool::Walk, temp_dir.path())
            .await
            .unwrap();

        assert!(files.contains(&"src/main.rs".to_string()));
        assert!(files.contains(&".env".to_string()));
        assert!(files.contains(&".github/ci.yml".to_string()));
        assert!(files.iter().all(|f| !f.starts_with(".git/")));
        assert!(files.iter().all(|f| !f.starts_with("node_modules")));
        assert!(files.iter().all(|f| !f.starts_with("dist")));
        assert!(files.iter().all(|f| !f.starts_with("out")));
        assert!(files.iter().all(|f| !f.starts_with("build")));
    }

    #[tokio::test]
    async fn test_walk_without_workspace_is_empty() {
        let enumerator = FileEnumerator::new(&SearchConfig::default());
        let files = enumerator
            .enumerate(SearchTool::Walk, Path::new("/nonexistent/polaris"))
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_process_strategy_requires_root() {
        let enumerator = FileEnumerator::new(&SearchConfig::default());
        let err = enumerator
            .enumerate(SearchTool::Ripgrep, Path::new("/nonexistent/polaris"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::RootNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ripgrep_exit_one_is_empty_success() {
        let temp_dir = TempDir::new().unwrap();
        let enumerator = FileEnumerator::with_commands(
            ToolCommand::new("sh").with_leading_args(["-c", "exit 1", "fd"]),
            ToolCommand::new("sh").with_leading_args(["-c", "exit 1", "rg"]),
        );

        let files = enumerator
            .enumerate(SearchTool::Ripgrep, temp_dir.path())
            .await
            .unwrap();
        assert!(files.is_empty());

        let err = enumerator
            .enumerate(SearchTool::Fd, temp_dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::ProcessFailed { code: Some(1), .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fd_non_zero_exit_carries_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let script = "echo 'fd: bad pattern' >&2; exit 2";
        let enumerator = FileEnumerator::with_commands(
            ToolCommand::new("sh").with_leading_args(["-c", script, "fd"]),
            ToolCommand::new("rg"),
        );

        let err = enumerator
            .enumerate(SearchTool::Fd, temp_dir.path())
            .await
            .unwrap_err();
        match err {
            SearchError::ProcessFailed { code, stderr, .. } => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "fd: bad pattern");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let temp_dir = TempDir::new().unwrap();
        let enumerator = FileEnumerator::with_commands(
            ToolCommand::new("/nonexistent/fd"),
            ToolCommand::new("/nonexistent/rg"),
        );
        let err = enumerator
            .enumerate(SearchTool::Fd, temp_dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Spawn { .. }));
    }
}
