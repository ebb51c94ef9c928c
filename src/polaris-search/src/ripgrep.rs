//! ripgrep invocation and `--json` output handling.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::config::EXCLUDED_DIRS;
use crate::enumerate::relative_to;
use crate::result::{ContentMatch, ContentMatchSpan, SearchQuery};

/// Builds the ripgrep arguments for a content search.
///
/// The order is fixed: output flags, toggles, cap, exclusions, multiline
/// flags, caller globs, then `--`, the pattern and the paths to search.
pub fn content_search_args(query: &SearchQuery, root: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--json",
        "--line-number",
        "--column",
        "--no-heading",
        "--with-filename",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    if !query.case_sensitive {
        args.push("--ignore-case".into());
    }
    if query.whole_word {
        args.push("--word-regexp".into());
    }
    if !query.is_regex {
        args.push("--fixed-strings".into());
    }

    args.push("--max-count".into());
    args.push(query.max_results.to_string().into());
    args.push("--hidden".into());

    for dir in EXCLUDED_DIRS {
        args.push("--glob".into());
        args.push(format!("!{dir}/").into());
    }

    if query.is_multiline() {
        args.push("--multiline".into());
        if query.is_regex {
            args.push("--multiline-dotall".into());
        }
    }

    for glob in query.exclude_globs.iter().filter(|g| !g.trim().is_empty()) {
        args.push("--glob".into());
        args.push(format!("!{glob}").into());
    }

    if query.restrict_to_paths.is_none() {
        for glob in query.include_globs.iter().filter(|g| !g.trim().is_empty()) {
            args.push("--glob".into());
            args.push(glob.into());
        }
    }

    args.push("--".into());
    args.push(query.text.as_str().into());

    match &query.restrict_to_paths {
        Some(paths) => args.extend(paths.iter().map(|p| root.join(p).into_os_string())),
        None => args.push(root.as_os_str().to_owned()),
    }

    args
}

/// One line of `rg --json` output, before its payload is interpreted.
#[derive(Debug, Deserialize)]
struct RgRecord {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Payload of a `match` record.
#[derive(Debug, Clone, Deserialize)]
pub struct RgMatch {
    pub path: RgText,
    pub lines: RgText,
    pub line_number: Option<u64>,
    #[serde(default)]
    pub submatches: Vec<RgSubmatch>,
}

/// ripgrep's encoding of a string. Non-UTF-8 data comes as base64 `bytes`
/// instead and leaves `text` empty.
#[derive(Debug, Clone, Deserialize)]
pub struct RgText {
    pub text: Option<String>,
}

/// Byte range of one match within `lines.text`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RgSubmatch {
    pub start: usize,
    pub end: usize,
}

/// Parses a `match` record; every other line yields `None`.
pub fn parse_match_line(line: &str) -> Option<RgMatch> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let record: RgRecord = match serde_json::from_str(line) {
        Ok(record) => record,
        Err(e) => {
            tracing::trace!("Skipping unparsable search output line: {}", e);
            return None;
        }
    };
    if record.kind != "match" {
        return None;
    }

    match serde_json::from_value(record.data) {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::trace!("Skipping malformed match record: {}", e);
            None
        }
    }
}

/// Splits the submatches of a record into per-line spans.
///
/// A span belongs to the line its match starts on. Offsets that do not land
/// on character boundaries are dropped.
pub fn spans_from_record(
    text: &str,
    first_line: u64,
    submatches: &[RgSubmatch],
) -> Vec<ContentMatchSpan> {
    submatches
        .iter()
        .filter_map(|sub| {
            let match_text = text.get(sub.start..sub.end)?;
            let leading = text.get(..sub.start)?;

            let line_start = leading.rfind('\n').map_or(0, |i| i + 1);
            let line_number = first_line + leading.matches('\n').count() as u64;

            let trailing = text.get(sub.end..)?;
            let line_end = trailing.find('\n').map_or(text.len(), |i| sub.end + i);

            Some(ContentMatchSpan {
                line_number,
                column: sub.start - line_start,
                match_text: match_text.to_string(),
                text_before_match: text.get(line_start..sub.start)?.to_string(),
                text_after_match: text
                    .get(sub.end..line_end)?
                    .trim_end_matches('\r')
                    .to_string(),
            })
        })
        .collect()
}

/// Groups consecutive spans that start on the same line.
fn group_by_line(spans: Vec<ContentMatchSpan>) -> Vec<(u64, Vec<ContentMatchSpan>)> {
    let mut groups: Vec<(u64, Vec<ContentMatchSpan>)> = Vec::new();
    for span in spans {
        match groups.last_mut() {
            Some((line, group)) if *line == span.line_number => group.push(span),
            _ => groups.push((span.line_number, vec![span])),
        }
    }
    groups
}

/// Milliseconds since the Unix epoch.
pub(crate) fn millis_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// Accumulates parsed records into line hits until the cap is reached.
#[derive(Debug)]
pub struct MatchCollector {
    root: PathBuf,
    max_results: usize,
    results: Vec<ContentMatch>,
    mtimes: HashMap<PathBuf, u64>,
}

impl MatchCollector {
    pub fn new(root: impl Into<PathBuf>, max_results: usize) -> Self {
        Self {
            root: root.into(),
            max_results,
            results: Vec::new(),
            mtimes: HashMap::new(),
        }
    }

    /// Feeds one output line. Returns `true` once the cap is reached.
    pub async fn push_line(&mut self, line: &str) -> bool {
        if let Some(record) = parse_match_line(line) {
            self.push(record).await;
        }
        self.is_full()
    }

    /// Adds a parsed match record.
    pub async fn push(&mut self, record: RgMatch) {
        if self.is_full() {
            return;
        }

        let (Some(raw_path), Some(text), Some(first_line)) =
            (record.path.text, record.lines.text, record.line_number)
        else {
            tracing::trace!("Skipping match record without text payload");
            return;
        };

        let spans = spans_from_record(&text, first_line, &record.submatches);
        if spans.is_empty() {
            return;
        }

        let path = relative_to(&self.root, &raw_path);
        let absolute = {
            let reported = PathBuf::from(&raw_path);
            if reported.is_absolute() {
                reported
            } else {
                self.root.join(reported)
            }
        };
        let modified_time_millis = self.modified_millis(absolute).await;

        // A multi-line block yields one hit per line that has a match starting on it.
        for (line_number, spans) in group_by_line(spans) {
            if let Some(last) = self.results.last_mut()
                && last.path == path
                && last.line_number == line_number
            {
                last.spans.extend(spans);
                continue;
            }
            if self.is_full() {
                break;
            }

            let offset = (line_number - first_line) as usize;
            let line_text: String = text.split_inclusive('\n').skip(offset).collect();
            self.results.push(ContentMatch {
                path: path.clone(),
                line_number,
                primary_column: spans[0].column,
                line_text: line_text.trim_end_matches(['\n', '\r']).to_string(),
                spans,
                modified_time_millis,
            });
        }
    }

    async fn modified_millis(&mut self, path: PathBuf) -> u64 {
        if let Some(&millis) = self.mtimes.get(&path) {
            return millis;
        }

        let millis = match tokio::fs::metadata(&path).await.and_then(|m| m.modified()) {
            Ok(time) => millis_since_epoch(time),
            Err(e) => {
                tracing::debug!("Could not stat {}: {}, using current time", path.display(), e);
                millis_since_epoch(SystemTime::now())
            }
        };
        self.mtimes.insert(path, millis);
        millis
    }

    pub fn is_full(&self) -> bool {
        self.results.len() >= self.max_results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<ContentMatch> {
        self.results
    }
}
