//! Session files on disk: exact layout, old headers and malformed input.

mod common;

use common::calc_session;
use sliceshell::codec::{GROUPING_SENTINEL, HEADER_V1_1, INPUT_SENTINEL, OUTPUT_SENTINEL};
use sliceshell::slice::io_slices;
use sliceshell::{Error, FormatVersion, IoKind, SliceRange};

fn write_file(dir: &tempfile::TempDir, name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

#[test]
fn saved_transcript_matches_snapshot() {
    let mut shell = calc_session();
    shell.run("a=1\nb=2\nprint a+b").unwrap();
    let saved = shell.editor().save_session();
    insta::assert_snapshot!("s1_session", saved.trim_end());
}

#[test]
fn version_1_1_file_loads_and_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "old.pyslices",
        &[
            HEADER_V1_1,
            GROUPING_SENTINEL,
            INPUT_SENTINEL,
            "x = 40",
            "print x + 2",
            OUTPUT_SENTINEL,
            "#0",
            GROUPING_SENTINEL,
            INPUT_SENTINEL,
            "",
        ],
    );

    let mut shell = calc_session();
    assert_eq!(shell.load(&path).unwrap(), FormatVersion::V1_1);
    assert!(!shell.is_modified());
    let doc = shell.editor().document();
    assert_eq!(doc.text(), "x = 40\nprint x + 2\n0\n");
    assert_eq!(
        io_slices(doc.markers())[..2],
        [
            (SliceRange::new(0, 1), IoKind::Input),
            (SliceRange::new(2, 2), IoKind::Output),
        ]
    );

    // Stale output from the file is replaced by a fresh run.
    shell.editor_mut().set_caret(0);
    shell.run_current().unwrap();
    assert_eq!(shell.editor().document().line_text(2), "42");
    assert!(shell.is_modified());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut shell = calc_session();
    let err = shell.load(dir.path().join("absent.pyslices")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!err.is_refusal());
}

#[test]
fn malformed_file_keeps_current_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "broken.pyslices",
        &[
            HEADER_V1_1,
            GROUPING_SENTINEL,
            INPUT_SENTINEL,
            "print 1",
            OUTPUT_SENTINEL,
            "1",
        ],
    );

    let mut shell = calc_session();
    shell.run("print 7").unwrap();
    let before = shell.editor().document().clone();

    let err = shell.load(&path).unwrap_err();
    assert!(matches!(err, Error::FileFormat { line: 5, .. }), "{err}");
    assert!(err.to_string().contains("output line 6 lacks the '#' prefix"), "{err}");
    assert!(shell.editor().document().same_content(&before));
}

#[test]
fn script_file_becomes_an_input_grouping() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("script.py");
    std::fs::write(&path, "a = 5\r\nprint a\r\n").unwrap();

    let mut shell = calc_session();
    shell.run("print 1").unwrap();
    shell.editor_mut().set_caret(0);
    shell.load_file_as_slice(&path).unwrap();

    let doc = shell.editor().document();
    assert_eq!(doc.text(), "print 1\n1\na = 5\nprint a\n");
    assert_eq!(doc.grouping_slice(2), SliceRange::new(2, 3));
    assert_eq!(doc.kind_of(3), IoKind::Input);

    let start = doc.line_start(2);
    shell.editor_mut().set_caret(start);
    shell.run_current().unwrap();
    assert_eq!(shell.editor().document().line_text(4), "5");
}
