//! End-to-end shell scenarios driven through `ShellSession`.
//!
//! Run with logging:
//!   cargo test --test scenarios -- --nocapture

mod common;

use common::{Value, calc_session};
use sliceshell::codec::{GROUPING_SENTINEL, HEADER_V1_2, INPUT_SENTINEL, OUTPUT_SENTINEL, SHEBANG};
use sliceshell::slice::{groupings, io_slices};
use sliceshell::{Axis, Document, Error, IoKind, ScriptedPump, SliceRange};
use tracing::info;

/// Type the three-line command of the first scenario, one edit at a time.
fn type_s1<I: sliceshell::Interpreter>(shell: &mut sliceshell::ShellSession<I>) {
    let editor = shell.editor_mut();
    editor.type_text("a=1").unwrap();
    editor.insert_line_break(false).unwrap();
    editor.type_text("b=2").unwrap();
    editor.insert_line_break(false).unwrap();
    editor.type_text("print a+b").unwrap();
}

fn s1() -> sliceshell::ShellSession<common::Calc> {
    let mut shell = calc_session();
    type_s1(&mut shell);
    shell.run_current().unwrap();
    shell
}

#[test]
fn s1_run_three_line_command() {
    let shell = s1();
    let doc = shell.editor().document();
    info!(text = %doc.text(), "after run");

    let markers = doc.markers();
    let groups = groupings(markers);
    assert_eq!(groups[0], SliceRange::new(0, 3));
    assert_eq!(
        io_slices(markers)[..2],
        [
            (SliceRange::new(0, 2), IoKind::Input),
            (SliceRange::new(3, 3), IoKind::Output),
        ]
    );
    assert_eq!(doc.line_text(3), "3");
    // A fresh prompt follows the grouping.
    assert_eq!(groups.len(), 2);
    assert_eq!(doc.caret_line(), 4);

    assert_eq!(shell.history().entries(), ["a=1\nb=2\nprint a+b"]);
    assert_eq!(shell.interpreter().vars.get("b"), Some(&Value::Int(2)));
    assert!(shell.editor().validate().is_ok());
}

#[test]
fn s2_undo_typing_restores_empty_document() {
    let mut shell = calc_session();
    type_s1(&mut shell);
    for _ in 0..7 {
        shell.editor_mut().undo();
    }
    assert!(shell.editor().document().same_content(&Document::new()));
    assert!(shell.history().is_empty());
}

#[test]
fn s2_undo_after_run_keeps_transcript() {
    let mut shell = s1();
    let before = shell.editor().document().text();
    for _ in 0..7 {
        assert!(!shell.editor_mut().undo());
    }
    assert_eq!(shell.editor().document().text(), before);
    assert_eq!(shell.history().len(), 1);
}

#[test]
fn s3_split_then_merge() {
    let mut shell = s1();
    let original = shell.editor().document().clone();
    let start = shell.editor().document().line_start(1);
    shell.editor_mut().set_caret(start);
    assert!(shell.editor_mut().split_at_caret().unwrap());

    let doc = shell.editor().document();
    let slices = io_slices(doc.markers());
    assert_eq!(slices[0], (SliceRange::new(0, 0), IoKind::Input));
    assert_eq!(slices[1], (SliceRange::new(1, 2), IoKind::Input));
    assert_eq!(doc.range_text(slices[1].0), "b=2\nprint a+b");
    assert!(shell.editor().validate().is_ok());

    let editor = shell.editor_mut();
    editor.margin_click(0, Axis::Io, false).unwrap();
    editor.margin_click(1, Axis::Io, true).unwrap();
    assert!(editor.merge_selected().unwrap());
    assert!(editor.document().same_content(&original));
}

#[test]
fn s4_typing_in_output_is_refused() {
    let mut shell = s1();
    let before = shell.editor().document().clone();
    let pos = shell.editor().document().line_start(3);
    shell.editor_mut().set_caret(pos);

    let err = shell.type_text("x").unwrap_err();
    assert!(matches!(err, Error::ReadOnlyRegion { line: 3 }));
    assert!(err.is_refusal());
    assert!(shell.editor().document().same_content(&before));
}

#[test]
fn s5_save_and_reload() {
    let mut shell = s1();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s1.pyslices");
    shell.save(&path).unwrap();

    let saved = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = saved.lines().collect();
    assert_eq!(
        lines[..9],
        [
            SHEBANG,
            HEADER_V1_2,
            GROUPING_SENTINEL,
            INPUT_SENTINEL,
            "a=1",
            "b=2",
            "print a+b",
            OUTPUT_SENTINEL,
            "#3",
        ]
    );

    let mut reloaded = calc_session();
    reloaded.load(&path).unwrap();
    assert!(reloaded
        .editor()
        .document()
        .same_content(shell.editor().document()));
    assert!(!reloaded.is_modified());
}

#[test]
fn s6_readline_feeds_interpreter() {
    let mut shell = calc_session().with_pump(ScriptedPump::new(["hello"]));
    shell.type_text("x = raw_input(\"> \")").unwrap();
    shell.run_current().unwrap();

    assert_eq!(shell.interpreter().inputs, ["hello"]);
    assert_eq!(
        shell.interpreter().vars.get("x"),
        Some(&Value::Str("hello".to_string()))
    );
    let doc = shell.editor().document();
    assert_eq!(doc.line_text(1), "> ");
    assert_eq!(doc.line_text(2), "hello");
    assert_eq!(doc.kind_of(2), IoKind::Output);
    assert_eq!(shell.editor().readline_line(), None);
    assert!(shell.editor().validate().is_ok());

    shell.run("print x + \"!\"").unwrap();
    let doc = shell.editor().document();
    assert_eq!(doc.line_text(doc.last_line() - 1), "hello!");
}

#[test]
fn rerun_replaces_output() {
    let mut shell = s1();
    let end = shell.editor().document().line_end(0);
    shell.editor_mut().set_caret(end);
    shell.editor_mut().type_text("1").unwrap();
    shell.run_current().unwrap();
    let doc = shell.editor().document();
    assert_eq!(doc.text(), "a=11\nb=2\nprint a+b\n13\n");
    assert_eq!(shell.history().len(), 2);
}

#[test]
fn interpreter_errors_become_output() {
    let mut shell = calc_session();
    shell.run("print nope").unwrap();
    let doc = shell.editor().document();
    assert_eq!(
        doc.text(),
        "print nope\nTraceback (most recent call last):\nNameError: name 'nope' is not defined\n"
    );
    assert_eq!(doc.kind_of(2), IoKind::Output);
}

#[test]
fn startup_then_tutorial_free_prompt() {
    let mut shell = calc_session();
    shell.startup().unwrap();
    let doc = shell.editor().document();
    assert_eq!(doc.text(), "Calc 1.0\n");
    assert_eq!(doc.kind_of(0), IoKind::Output);
    assert!(!shell.is_modified());
}
