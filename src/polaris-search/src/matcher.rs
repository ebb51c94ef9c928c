//! Ranking workspace paths against a query using nucleo-matcher.

use std::ops::Range;

use nucleo_matcher::{
    Config, Matcher, Utf32Str,
    pattern::{AtomKind, CaseMatching, Normalization, Pattern},
};
use regex::{Regex, RegexBuilder};

use crate::config::DEFAULT_FILE_RESULT_LIMIT;
use crate::result::{FileMatch, MatchOptions};

const MARK_OPEN: &str = "<mark class=\"search-match\">";
const MARK_CLOSE: &str = "</mark>";

/// Fuzzy and regex path matcher.
///
/// Fuzzy mode scores every path with nucleo's subsequence scorer and keeps the
/// best `limit`. The case-sensitive and whole-word toggles filter the ranked
/// list afterwards, so they can only remove entries, never reorder them.
#[derive(Debug)]
pub struct FuzzyMatcher {
    matcher: Matcher,
    limit: usize,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    /// Creates a matcher keeping the default number of results.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_FILE_RESULT_LIMIT)
    }

    /// Creates a matcher keeping at most `limit` results.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT.match_paths()),
            limit,
        }
    }

    /// Ranks `paths` against `query`, best first.
    pub fn find_files(
        &mut self,
        query: &str,
        paths: &[String],
        options: MatchOptions,
    ) -> Vec<FileMatch> {
        if query.trim().is_empty() || paths.is_empty() {
            return Vec::new();
        }

        if options.is_regex {
            return regex_matches(query, paths, options.case_sensitive, self.limit);
        }

        let mut results = self.fuzzy_matches(query, paths);

        if options.case_sensitive {
            results.retain(|m| m.path.contains(query));
        }

        if options.whole_word
            && let Some(word) = whole_word_regex(query, options.case_sensitive)
        {
            results.retain(|m| path_has_word(&m.path, &word));
        }

        results
    }

    fn fuzzy_matches(&mut self, query: &str, paths: &[String]) -> Vec<FileMatch> {
        let pattern = Pattern::new(
            query,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );

        let mut buf = Vec::new();
        let mut scored: Vec<(usize, u32)> = paths
            .iter()
            .enumerate()
            .filter_map(|(idx, path)| {
                buf.clear();
                let haystack = Utf32Str::new(path, &mut buf);
                pattern
                    .score(haystack, &mut self.matcher)
                    .map(|score| (idx, score))
            })
            .collect();

        // Stable sort: equal scores keep enumeration order.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(self.limit);

        let mut indices = Vec::new();
        scored
            .into_iter()
            .map(|(idx, score)| {
                let path = &paths[idx];
                indices.clear();
                buf.clear();
                let haystack = Utf32Str::new(path, &mut buf);
                pattern.indices(haystack, &mut self.matcher, &mut indices);
                indices.sort_unstable();
                indices.dedup();

                let ranges = char_indices_to_ranges(path, &indices);
                FileMatch {
                    path: path.clone(),
                    score: i64::from(score),
                    highlighted_path: highlight(path, &ranges),
                    highlight_ranges: ranges,
                }
            })
            .collect()
    }
}

/// Paths matching `pattern` anywhere, in enumeration order.
///
/// An invalid pattern yields no results.
fn regex_matches(
    pattern: &str,
    paths: &[String],
    case_sensitive: bool,
    limit: usize,
) -> Vec<FileMatch> {
    let regex = match RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
    {
        Ok(regex) => regex,
        Err(e) => {
            tracing::debug!("Invalid path pattern '{}': {}", pattern, e);
            return Vec::new();
        }
    };

    paths
        .iter()
        .filter(|path| regex.is_match(path))
        .take(limit)
        .enumerate()
        .map(|(position, path)| {
            let ranges: Vec<Range<usize>> = regex
                .find_iter(path)
                .filter(|m| !m.is_empty())
                .map(|m| m.range())
                .collect();
            FileMatch {
                path: path.clone(),
                score: -(position as i64),
                highlighted_path: highlight(path, &ranges),
                highlight_ranges: ranges,
            }
        })
        .collect()
}

fn whole_word_regex(query: &str, case_sensitive: bool) -> Option<Regex> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(query)))
        .case_insensitive(!case_sensitive)
        .build()
        .ok()
}

fn path_has_word(path: &str, word: &Regex) -> bool {
    path.split(['/', '\\']).any(|segment| word.is_match(segment))
}

/// Whether some segment of `path` contains `query` as a whole word.
pub fn matches_whole_word(path: &str, query: &str, case_sensitive: bool) -> bool {
    whole_word_regex(query, case_sensitive).is_some_and(|word| path_has_word(path, &word))
}

/// Converts matched character positions into merged byte ranges.
fn char_indices_to_ranges(text: &str, indices: &[u32]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    let mut wanted = indices.iter().peekable();

    for (char_idx, (byte_idx, ch)) in text.char_indices().enumerate() {
        let Some(&&next) = wanted.peek() else {
            break;
        };
        if next as usize != char_idx {
            continue;
        }
        wanted.next();

        let end = byte_idx + ch.len_utf8();
        match ranges.last_mut() {
            Some(last) if last.end == byte_idx => last.end = end,
            _ => ranges.push(byte_idx..end),
        }
    }

    ranges
}

/// Wraps `ranges` of `text` in `<mark>` and escapes everything else.
pub fn highlight(text: &str, ranges: &[Range<usize>]) -> String {
    let mut html = String::with_capacity(text.len() + ranges.len() * 32);
    let mut cursor = 0;

    for range in ranges {
        let (Some(before), Some(marked)) = (text.get(cursor..range.start), text.get(range.clone()))
        else {
            continue;
        };
        html.push_str(&escape_html(before));
        html.push_str(MARK_OPEN);
        html.push_str(&escape_html(marked));
        html.push_str(MARK_CLOSE);
        cursor = range.end;
    }

    if let Some(rest) = text.get(cursor..) {
        html.push_str(&escape_html(rest));
    }
    html
}

/// Escapes the characters that are significant in HTML text and attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
