//! Fuzz target for structural edits.
//!
//! Drives random edit sequences and checks that the markers stay valid and
//! that undo walks back to the starting document.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sliceshell::{Axis, Clipboard, Editor, IoKind, SessionLayout};

#[derive(Arbitrary, Debug)]
enum Op {
    Type(String),
    LineBreak,
    Backspace,
    DeleteForward,
    Caret(u16),
    Split,
    Click { line: u8, io: bool, extend: bool },
    Merge,
    Fold { line: u8, io: bool },
    DeleteSelected,
    ClearCommand,
    Cut,
    Copy,
    Paste,
    CopySlices,
    CutSlices,
    PasteSlices,
    DeleteOutputsAfter(u8),
}

fn axis(io: bool) -> Axis {
    if io { Axis::Io } else { Axis::Grouping }
}

fuzz_target!(|ops: Vec<Op>| {
    let layout = SessionLayout::new()
        .grouping(IoKind::Input, "x = 1\nprint x")
        .slice(IoKind::Output, "1")
        .grouping(IoKind::Input, "");
    let start = layout.to_document();
    let mut editor = Editor::with_document(start.clone());
    editor.clear_journal();
    let mut clipboard = Clipboard::new();

    for op in ops.iter().take(64) {
        let lines = editor.document().line_count();
        let chars = editor.document().len_chars();
        let _ = match op {
            Op::Type(text) => {
                let text: String = text.chars().take(16).collect();
                editor.type_text(&text).map(|()| true)
            }
            Op::LineBreak => editor.insert_line_break(true).map(|()| true),
            Op::Backspace => editor.backspace(),
            Op::DeleteForward => editor.delete_forward(),
            Op::Caret(pos) => {
                editor.set_caret(usize::from(*pos) % (chars + 1));
                Ok(true)
            }
            Op::Split => editor.split_at_caret(),
            Op::Click { line, io, extend } => editor
                .margin_click(usize::from(*line) % lines, axis(*io), *extend)
                .map(|()| true),
            Op::Merge => editor.merge_selected(),
            Op::Fold { line, io } => editor.toggle_fold(usize::from(*line) % lines, axis(*io)),
            Op::DeleteSelected => editor.delete_selected_slices(),
            Op::ClearCommand => editor.clear_command(),
            Op::Cut => editor.cut(&mut clipboard),
            Op::Copy => Ok(editor.copy(&mut clipboard)),
            Op::Paste => editor.paste(&clipboard),
            Op::CopySlices => Ok(editor.copy_selected_slices(&mut clipboard)),
            Op::CutSlices => editor.cut_selected_slices(&mut clipboard),
            Op::PasteSlices => editor.paste_slices(&clipboard),
            Op::DeleteOutputsAfter(line) => editor.delete_outputs_after(usize::from(*line) % lines),
        };
        assert!(editor.validate().is_ok(), "{op:?} broke the markers");
    }

    while editor.undo() {}
    assert!(editor.document().same_content(&start));
});
