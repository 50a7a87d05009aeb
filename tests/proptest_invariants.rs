//! Property-based tests for document invariants, undo/redo and the codec.
//!
//! Uses proptest to drive random edit sequences through the public API.

mod common;

use common::calc_session;
use proptest::prelude::*;
use proptest::sample::Index;
use sliceshell::codec::{self, SessionLayout};
use sliceshell::marker::Composite;
use sliceshell::{Axis, Clipboard, Document, Editor, IoKind, MarkerSet};

// ============================================================================
// Strategies
// ============================================================================

#[derive(Clone, Debug)]
enum Op {
    Type(String),
    LineBreak,
    Backspace,
    DeleteForward,
    Caret(Index),
    Split,
    Click(Index, bool, bool),
    Merge,
    ToggleFold(Index, bool),
    DeleteSelected,
    ClearCommand,
    LoadFile(String),
    Copy,
    Cut,
    Paste,
    CopySlices,
    CutSlices,
    PasteSlices,
    DeleteOutputsAfter(Index),
}

fn typed_text() -> impl Strategy<Value = String> {
    "[a-z0-9 =+:()]{1,6}"
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => typed_text().prop_map(Op::Type),
        2 => Just(Op::LineBreak),
        2 => Just(Op::Backspace),
        1 => Just(Op::DeleteForward),
        3 => any::<Index>().prop_map(Op::Caret),
        1 => Just(Op::Split),
        2 => (any::<Index>(), any::<bool>(), any::<bool>()).prop_map(|(i, io, ext)| Op::Click(i, io, ext)),
        1 => Just(Op::Merge),
        1 => (any::<Index>(), any::<bool>()).prop_map(|(i, io)| Op::ToggleFold(i, io)),
        1 => Just(Op::DeleteSelected),
        1 => Just(Op::ClearCommand),
        1 => "[a-z =]{0,8}(\n[a-z =]{0,8}){0,2}".prop_map(Op::LoadFile),
        1 => Just(Op::Copy),
        1 => Just(Op::Cut),
        1 => Just(Op::Paste),
        1 => Just(Op::CopySlices),
        1 => Just(Op::CutSlices),
        1 => Just(Op::PasteSlices),
        1 => any::<Index>().prop_map(Op::DeleteOutputsAfter),
    ]
}

fn axis(io: bool) -> Axis {
    if io { Axis::Io } else { Axis::Grouping }
}

/// Two groupings with output, then an empty prompt.
fn start_layout() -> SessionLayout {
    SessionLayout::new()
        .grouping(IoKind::Input, "a = 1\nprint a")
        .slice(IoKind::Output, "1")
        .grouping(IoKind::Input, "b = 2")
        .slice(IoKind::Output, "ok\ndone")
        .grouping(IoKind::Input, "")
}

fn start_editor() -> Editor {
    let mut editor = Editor::with_document(start_layout().to_document());
    editor.clear_journal();
    editor
}

/// Refused operations are part of the exercise, so results are ignored.
fn apply(editor: &mut Editor, clipboard: &mut Clipboard, op: &Op) {
    let lines = editor.document().line_count();
    let chars = editor.document().len_chars();
    let _ = match op {
        Op::Type(text) => editor.type_text(text).map(|()| true),
        Op::LineBreak => editor.insert_line_break(true).map(|()| true),
        Op::Backspace => editor.backspace(),
        Op::DeleteForward => editor.delete_forward(),
        Op::Caret(i) => {
            editor.set_caret(i.index(chars + 1));
            Ok(true)
        }
        Op::Split => editor.split_at_caret(),
        Op::Click(i, io, extend) => editor.margin_click(i.index(lines), axis(*io), *extend).map(|()| true),
        Op::Merge => editor.merge_selected(),
        Op::ToggleFold(i, io) => editor.toggle_fold(i.index(lines), axis(*io)),
        Op::DeleteSelected => editor.delete_selected_slices(),
        Op::ClearCommand => editor.clear_command(),
        Op::LoadFile(text) => editor.load_file_as_slice(text).map(|()| true),
        Op::Copy => Ok(editor.copy(clipboard)),
        Op::Cut => editor.cut(clipboard),
        Op::Paste => editor.paste(clipboard),
        Op::CopySlices => Ok(editor.copy_selected_slices(clipboard)),
        Op::CutSlices => editor.cut_selected_slices(clipboard),
        Op::PasteSlices => editor.paste_slices(clipboard),
        Op::DeleteOutputsAfter(i) => editor.delete_outputs_after(i.index(lines)),
    };
}

fn run_ops(ops: &[Op]) -> Editor {
    let mut editor = start_editor();
    let mut clipboard = Clipboard::new();
    for op in ops {
        apply(&mut editor, &mut clipboard, op);
    }
    editor
}

fn check_invariants(doc: &Document) -> Result<(), TestCaseError> {
    let markers = doc.markers();
    prop_assert_eq!(markers.len(), doc.line_count());
    let first = markers.markers_of(0);
    prop_assert!(first.is_grouping_start() && first.is_io_start(), "line 0: {:?}", first);
    for line in 0..markers.len() {
        let m = markers.markers_of(line);
        prop_assert!(m.is_single_per_axis(), "line {}: {:?}", line, m);
        prop_assert!(Composite::of(m).is_some(), "line {}: {:?}", line, m);
        prop_assert_eq!(m.is_output(), m.contains(MarkerSet::OUTPUT_BACKGROUND), "line {}", line);
        if line > 0 {
            let prev = markers.markers_of(line - 1);
            prop_assert!(
                sliceshell::marker::allowed_adjacency(prev, m),
                "lines {}-{}: {:?} -> {:?}",
                line - 1,
                line,
                prev,
                m
            );
        }
    }
    prop_assert_eq!(markers.first_invalid_line(), None);
    Ok(())
}

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Markers stay well formed after any edit sequence (properties 1 to 4).
    #[test]
    fn markers_stay_well_formed(ops in prop::collection::vec(op(), 0..40)) {
        let mut editor = start_editor();
        let mut clipboard = Clipboard::new();
        for op in &ops {
            apply(&mut editor, &mut clipboard, op);
            check_invariants(editor.document())?;
        }
    }

    /// Undoing everything restores the starting document.
    #[test]
    fn undo_round_trip(ops in prop::collection::vec(op(), 0..40)) {
        let mut editor = run_ops(&ops);
        let records = editor.journal().len();
        for _ in 0..records {
            prop_assert!(editor.undo());
        }
        prop_assert!(!editor.undo());
        let initial = start_layout().to_document();
        prop_assert!(
            editor.document().same_content(&initial),
            "got {:?}",
            editor.document().text()
        );
    }

    /// Undoing then redoing `k` records is a no-op.
    #[test]
    fn redo_round_trip(ops in prop::collection::vec(op(), 1..40), k in any::<Index>()) {
        let mut editor = run_ops(&ops);
        let after = editor.document().clone();
        let k = k.index(editor.journal().len() + 1);
        for _ in 0..k {
            prop_assert!(editor.undo());
        }
        for _ in 0..k {
            prop_assert!(editor.redo());
        }
        prop_assert!(editor.document().same_content(&after));
        check_invariants(editor.document())?;
    }

    /// Saving and loading reproduces text and slice structure.
    #[test]
    fn codec_round_trip(ops in prop::collection::vec(op(), 0..40)) {
        let editor = run_ops(&ops);
        let doc = editor.document();
        let parsed = codec::parse(&codec::save(doc)).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&parsed.layout, &SessionLayout::from_document(doc));

        let mut reloaded = Editor::new();
        reloaded.load_session(&editor.save_session()).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(reloaded.document().text(), doc.text());
        for line in 0..doc.line_count() {
            let ours = doc.markers_of(line) - MarkerSet::SELECTING;
            let theirs = reloaded.document().markers_of(line);
            prop_assert_eq!(theirs.io_kind(), ours.io_kind(), "line {}", line);
            prop_assert!(theirs.grouping().is_some(), "line {}", line);
            prop_assert_eq!(theirs.is_grouping_start(), ours.is_grouping_start(), "line {}", line);
            prop_assert_eq!(theirs.is_io_start(), ours.is_io_start(), "line {}", line);
        }
    }

    /// Running the same slice twice yields the same output (property 8).
    #[test]
    fn rerun_is_idempotent(
        assigns in prop::collection::vec((0usize..3, -50i64..50), 1..4),
        prints in prop::collection::vec(prop::collection::vec(any::<Index>(), 1..3), 0..3),
    ) {
        let names = ["a", "b", "c"];
        let mut lines: Vec<String> = assigns
            .iter()
            .map(|(name, value)| format!("{} = {value}", names[*name]))
            .collect();
        for terms in &prints {
            let sum: Vec<&str> = terms.iter().map(|i| names[assigns[i.index(assigns.len())].0]).collect();
            lines.push(format!("print {}", sum.join(" + ")));
        }

        let mut shell = calc_session();
        shell.run(&lines.join("\n")).unwrap();
        let first = shell.editor().document().text();
        shell.editor_mut().set_caret(0);
        shell.run_current().unwrap();
        prop_assert_eq!(shell.editor().document().text(), first);
        check_invariants(shell.editor().document())?;
    }
}
