//! Plain-text and JSON rendering of search results.

use anyhow::Result;
use serde::Serialize;

use polaris_search::{ContentMatch, FileMatch, PreviewWindow, ReplaceOutcome};

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One file result: the path, or its `<mark>`-highlighted HTML form.
pub fn format_file_match(file: &FileMatch, html: bool) -> String {
    if html {
        file.highlighted_path.clone()
    } else {
        file.path.clone()
    }
}

/// `path:line:column: text`, with a 1-based column.
///
/// Multi-line matches show only their first line.
pub fn format_content_match(hit: &ContentMatch) -> String {
    let text = hit.line_text.lines().next().unwrap_or_default();
    format!(
        "{}:{}:{}: {}",
        hit.path,
        hit.line_number,
        hit.primary_column + 1,
        text
    )
}

pub fn format_outcome(outcome: &ReplaceOutcome) -> String {
    let mut text = format!(
        "Replaced {} of {} matches",
        outcome.succeeded_count, outcome.attempted_count
    );
    if !outcome.failed_paths.is_empty() {
        text.push_str("\nFailed:");
        for path in &outcome.failed_paths {
            text.push_str("\n  ");
            text.push_str(path);
        }
    }
    text
}

/// Numbered lines, with `>` in front of the highlighted one.
pub fn format_preview(window: &PreviewWindow<'_>, highlight_line: Option<u64>) -> Vec<String> {
    window
        .lines
        .iter()
        .enumerate()
        .map(|(offset, line)| {
            let number = window.first_line + offset as u64;
            let marker = if Some(number) == highlight_line { '>' } else { ' ' };
            format!("{marker}{number:>6} | {line}")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polaris_search::ContentMatchSpan;
    use pretty_assertions::assert_eq;

    fn content_match(line_text: &str, column: usize) -> ContentMatch {
        ContentMatch {
            path: "src/lib.rs".to_string(),
            line_number: 12,
            primary_column: column,
            line_text: line_text.to_string(),
            spans: vec![ContentMatchSpan {
                line_number: 12,
                column,
                match_text: "foo".to_string(),
                text_before_match: String::new(),
                text_after_match: String::new(),
            }],
            modified_time_millis: 0,
        }
    }

    #[test]
    fn test_format_content_match() {
        let hit = content_match("let foo = 1;", 4);
        assert_eq!(format_content_match(&hit), "src/lib.rs:12:5: let foo = 1;");
    }

    #[test]
    fn test_format_multiline_content_match() {
        let hit = content_match("let foo\nbar = 1;", 4);
        assert_eq!(format_content_match(&hit), "src/lib.rs:12:5: let foo");
    }

    #[test]
    fn test_format_file_match() {
        let file = FileMatch {
            path: "src/a&b.rs".to_string(),
            score: 10,
            highlight_ranges: vec![0..1],
            highlighted_path: "<mark class=\"search-match\">s</mark>rc/a&amp;b.rs".to_string(),
        };
        assert_eq!(format_file_match(&file, false), "src/a&b.rs");
        assert!(format_file_match(&file, true).starts_with("<mark"));
    }

    #[test]
    fn test_format_outcome() {
        let outcome = ReplaceOutcome {
            attempted_count: 4,
            succeeded_count: 3,
            failed_paths: ["b.txt".to_string()].into_iter().collect(),
        };
        assert_eq!(format_outcome(&outcome), "Replaced 3 of 4 matches\nFailed:\n  b.txt");

        let clean = ReplaceOutcome {
            attempted_count: 2,
            succeeded_count: 2,
            ..Default::default()
        };
        assert_eq!(format_outcome(&clean), "Replaced 2 of 2 matches");
    }

    #[test]
    fn test_format_preview() {
        let window = PreviewWindow {
            first_line: 9,
            lines: vec!["a", "b", "c"],
        };
        assert_eq!(
            format_preview(&window, Some(10)),
            ["      9 | a", ">    10 | b", "     11 | c"]
        );
    }
}
