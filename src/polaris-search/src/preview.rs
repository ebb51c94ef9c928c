//! File previews for the selected result.

use std::path::Path;

use serde::Serialize;

use crate::error::SearchResult;
use crate::host::WorkspaceFs;

/// A file's contents prepared for the preview pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePreview {
    /// Workspace-relative path.
    pub path: String,
    pub content: String,
    pub language: &'static str,

    /// 1-based line to scroll to and highlight.
    pub highlight_line: Option<u64>,
}

/// Consecutive lines cut out of a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewWindow<'a> {
    /// 1-based number of the first line in `lines`.
    pub first_line: u64,
    pub lines: Vec<&'a str>,
}

impl FilePreview {
    /// Up to `context` lines either side of the highlighted line.
    ///
    /// Without a highlighted line the window starts at the top of the file.
    pub fn window(&self, context: usize) -> PreviewWindow<'_> {
        let center = self
            .highlight_line
            .map_or(0, |line| line.saturating_sub(1) as usize);
        let start = center.saturating_sub(context);
        let span = if self.highlight_line.is_some() {
            context * 2 + 1
        } else {
            context
        };

        PreviewWindow {
            first_line: start as u64 + 1,
            lines: self.content.lines().skip(start).take(span).collect(),
        }
    }
}

/// Reads `relative_path` under `root` for previewing.
pub async fn read_preview(
    fs: &dyn WorkspaceFs,
    root: &Path,
    relative_path: &str,
    highlight_line: Option<u64>,
) -> SearchResult<FilePreview> {
    let absolute = root.join(relative_path);
    let content = match fs.open_buffer_text(&absolute).await {
        Some(text) => text,
        None => fs.read_to_string(&absolute).await?,
    };

    Ok(FilePreview {
        path: relative_path.to_string(),
        content,
        language: detect_language(relative_path),
        highlight_line,
    })
}

/// Language id for syntax highlighting, from the file extension.
pub fn detect_language(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("ts") => "typescript",
        Some("tsx") => "tsx",
        Some("js") => "javascript",
        Some("jsx") => "jsx",
        Some("json") => "json",
        Some("css") => "css",
        Some("scss") => "scss",
        Some("sass") => "sass",
        Some("less") => "less",
        Some("html") => "html",
        Some("xml") => "xml",
        Some("md") => "markdown",
        Some("mdx") => "mdx",
        Some("mdc") => "mdc",
        Some("yml" | "yaml") => "yaml",
        Some("py") => "python",
        Some("rb") => "ruby",
        Some("go") => "go",
        Some("rs") => "rust",
        Some("java") => "java",
        Some("c" | "h") => "c",
        Some("cpp" | "hpp") => "cpp",
        Some("cs") => "csharp",
        Some("php") => "php",
        Some("swift") => "swift",
        Some("kt") => "kotlin",
        Some("sh" | "bash" | "zsh") => "bash",
        Some("fish") => "fish",
        Some("ps1") => "powershell",
        Some("sql") => "sql",
        Some("graphql") => "graphql",
        Some("astro") => "astro",
        Some("vue") => "vue",
        Some("svelte") => "svelte",
        _ => "plaintext",
    }
}
