//! Fuzz target for session file parsing.
//!
//! Any accepted file must produce a valid document that saves and parses
//! back to the same layout.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sliceshell::Editor;
use sliceshell::codec::{self, SessionLayout};

fuzz_target!(|data: &str| {
    let Ok(parsed) = codec::parse(data) else {
        return;
    };
    assert_eq!(parsed.layout.first_invalid_line(), None);

    let mut editor = Editor::new();
    let before = editor.document().clone();
    if editor.load_session(data).is_err() {
        assert!(editor.document().same_content(&before));
        return;
    }
    assert!(editor.validate().is_ok());

    let saved = editor.save_session();
    let reparsed = codec::parse(&saved).expect("saved session must parse");
    assert_eq!(reparsed.layout, SessionLayout::from_document(editor.document()));
});
