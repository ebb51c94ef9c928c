//! Replace flows through the service, with scripted `rg` output.
#![cfg(unix)]

use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::support::{FailingWrites, Fixture, OpenBuffers};
use crate::error::SearchError;
use crate::host::LocalFs;
use crate::result::ReplacementOp;

fn op(path: &str, line: u64, column: usize, length: usize, text: &str) -> ReplacementOp {
    ReplacementOp {
        path: path.to_string(),
        line_number: line,
        column,
        length,
        replacement_text: text.to_string(),
    }
}

#[tokio::test]
async fn test_replace_one_at_recorded_offset() {
    let fx = Fixture::new();
    fx.write("a.txt", "hello foo world\nfoo\n");
    let service = fx.service(fx.canned_rg(), Arc::new(LocalFs));
    fx.set_output(&[
        fx.match_line("a.txt", 1, "hello foo world\n", &[(6, 9)]),
        fx.match_line("a.txt", 2, "foo\n", &[(0, 3)]),
    ]);
    service.find_in_files(service.query("foo")).await.unwrap();

    let outcome = service
        .replace_one(&op("a.txt", 1, 6, 3, "bar"))
        .await
        .unwrap();

    assert_eq!(outcome.attempted_count, 1);
    assert_eq!(outcome.succeeded_count, 1);
    assert!(outcome.is_complete());
    assert_eq!(fx.read("a.txt"), "hello bar world\nfoo\n");
}

#[tokio::test]
async fn test_replace_one_relocates_after_modification() {
    let fx = Fixture::new();
    fx.write("a.txt", "foo = 1;\n");
    let service = fx.service(fx.canned_rg(), Arc::new(LocalFs));
    fx.set_output(&[fx.match_line("a.txt", 1, "foo = 1;\n", &[(0, 3)])]);
    service.find_in_files(service.query("foo")).await.unwrap();

    // Someone edits the line after the search.
    fx.write("a.txt", "let foo = 1;\n");
    fx.age("a.txt");
    fx.set_output(&[fx.match_line("a.txt", 1, "let foo = 1;\n", &[(4, 7)])]);

    let outcome = service
        .replace_one(&op("a.txt", 1, 0, 3, "bar"))
        .await
        .unwrap();

    assert_eq!(outcome.succeeded_count, 1);
    assert_eq!(fx.read("a.txt"), "let bar = 1;\n");
}

#[tokio::test]
async fn test_replace_one_aborts_when_match_is_gone() {
    let fx = Fixture::new();
    fx.write("a.txt", "foo\n");
    let service = fx.service(fx.canned_rg(), Arc::new(LocalFs));
    fx.set_output(&[fx.match_line("a.txt", 1, "foo\n", &[(0, 3)])]);
    service.find_in_files(service.query("foo")).await.unwrap();

    fx.write("a.txt", "nothing here\n");
    fx.age("a.txt");
    fx.set_output(&[]);

    let err = service
        .replace_one(&op("a.txt", 1, 0, 3, "bar"))
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::StaleMatch { .. }));
    assert_eq!(fx.read("a.txt"), "nothing here\n");
    // The results were refreshed to reflect the file.
    assert!(service.snapshot().unwrap().results.is_empty());
}

#[tokio::test]
async fn test_replace_one_unknown_target_is_stale_reference() {
    let fx = Fixture::new();
    fx.write("a.txt", "foo\n");
    let service = fx.service(fx.canned_rg(), Arc::new(LocalFs));

    let err = service
        .replace_one(&op("a.txt", 1, 0, 3, "bar"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::StaleReference { .. }));

    fx.set_output(&[fx.match_line("a.txt", 1, "foo\n", &[(0, 3)])]);
    service.find_in_files(service.query("foo")).await.unwrap();

    let err = service
        .replace_one(&op("a.txt", 7, 0, 3, "bar"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::StaleReference { line: 7, .. }));
    assert_eq!(fx.read("a.txt"), "foo\n");
}

#[tokio::test]
async fn test_replace_all_reports_partial_failure() {
    let fx = Fixture::new();
    fx.write("a.txt", "foo foo\n");
    fx.write("b.txt", "x foo\n");
    fx.write("c.txt", "foo\n");
    let fs = FailingWrites::new([fx.path("b.txt")]);
    let service = fx.service(fx.canned_rg(), Arc::new(fs));
    fx.set_output(&[
        fx.match_line("a.txt", 1, "foo foo\n", &[(0, 3), (4, 7)]),
        fx.match_line("b.txt", 1, "x foo\n", &[(2, 5)]),
        fx.match_line("c.txt", 1, "foo\n", &[(0, 3)]),
    ]);
    service.find_in_files(service.query("foo")).await.unwrap();

    let outcome = service.replace_all("quux").await;

    assert_eq!(outcome.attempted_count, 4);
    assert_eq!(outcome.succeeded_count, 3);
    assert_eq!(
        outcome.failed_paths.iter().collect::<Vec<_>>(),
        ["b.txt"]
    );
    assert!(outcome.is_partial());
    assert_eq!(fx.read("a.txt"), "quux quux\n");
    assert_eq!(fx.read("b.txt"), "x foo\n");
    assert_eq!(fx.read("c.txt"), "quux\n");
}

#[tokio::test]
async fn test_replace_all_without_results_is_noop() {
    let fx = Fixture::new();
    let service = fx.service(fx.canned_rg(), Arc::new(LocalFs));

    assert!(service.replace_all("x").await.is_noop());

    service.find_in_files(service.query("foo")).await.unwrap();
    let outcome = service.replace_all("x").await;
    assert!(outcome.is_noop());
    assert!(outcome.failed_paths.is_empty());
}

#[tokio::test]
async fn test_replace_all_skips_file_whose_matches_vanished() {
    let fx = Fixture::new();
    fx.write("a.txt", "foo\n");
    fx.write("b.txt", "foo\n");
    let service = fx.service(fx.canned_rg(), Arc::new(LocalFs));
    fx.set_output(&[
        fx.match_line("a.txt", 1, "foo\n", &[(0, 3)]),
        fx.match_line("b.txt", 1, "foo\n", &[(0, 3)]),
    ]);
    service.find_in_files(service.query("foo")).await.unwrap();

    fx.write("b.txt", "gone\n");
    fx.age("b.txt");
    // A scoped re-search of b.txt finds nothing; every search prints the same output.
    fx.set_output(&[fx.match_line("a.txt", 1, "foo\n", &[(0, 3)])]);

    let outcome = service.replace_all("bar").await;

    assert_eq!(outcome.succeeded_count, 1);
    assert!(outcome.failed_paths.contains("b.txt"));
    assert_eq!(fx.read("a.txt"), "bar\n");
    assert_eq!(fx.read("b.txt"), "gone\n");
}

#[tokio::test]
async fn test_replace_goes_through_open_buffer() {
    let fx = Fixture::new();
    fx.write("a.txt", "foo foo\n");
    let fs = Arc::new(OpenBuffers::default());
    fs.open(fx.path("a.txt"), "foo foo\n");
    let service = fx.service(fx.canned_rg(), fs.clone());
    fx.set_output(&[fx.match_line("a.txt", 1, "foo foo\n", &[(0, 3), (4, 7)])]);
    service.find_in_files(service.query("foo")).await.unwrap();

    let outcome = service.replace_all("x").await;

    assert_eq!(outcome.succeeded_count, 2);
    assert!(fs.direct_writes.lock().is_empty());
    let edits = fs.edits.lock();
    assert_eq!(edits.len(), 1);
    let starts: Vec<usize> = edits[0].1.iter().map(|e| e.range.start).collect();
    assert_eq!(starts, [4, 0]);
    assert_eq!(fx.read("a.txt"), "x x\n");
}
