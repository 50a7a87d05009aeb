//! `sliceshell` - core of an interactive shell made of re-editable slices.
//!
//! A slice shell document is plain text where every line is tagged with
//! markers. Consecutive lines form *I/O-slices* (a command, or the output it
//! produced) and I/O-slices form *grouping-slices* (a command with its
//! output). Any input slice can be edited and run again; its old output is
//! replaced.
//!
//! The crate has no GUI. A host supplies an [`Interpreter`], optionally an
//! [`EventPump`] for interactive input, and renders the [`Document`].
//!
//! ```
//! use sliceshell::{Interpreter, InterpreterIo, ShellOptions, ShellSession};
//!
//! struct Echo;
//!
//! impl Interpreter for Echo {
//!     fn push(&mut self, source: &str, io: &mut dyn InterpreterIo) -> bool {
//!         io.write_out(source);
//!         false
//!     }
//! }
//!
//! let mut shell = ShellSession::new(Echo, ShellOptions::default());
//! shell.type_text("hello").unwrap();
//! shell.run_current().unwrap();
//! assert_eq!(shell.editor().document().text(), "hello\nhello\n");
//! ```

// Crate-level lint configuration
#![allow(clippy::cast_possible_truncation)] // Line counts fit in isize
#![allow(clippy::cast_sign_loss)] // History steps are range-checked first
#![allow(clippy::cast_possible_wrap)] // Same
#![allow(clippy::module_name_repetitions)] // Allow MarkerSet in marker etc
#![allow(clippy::missing_errors_doc)] // Error variants are documented on Error
#![allow(clippy::missing_panics_doc)] // Only programmer errors panic
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::struct_excessive_bools)] // Options are a bag of switches
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::needless_collect)] // Collect for assertions is clear

pub mod clipboard;
pub mod codec;
pub mod command;
pub mod document;
pub mod edit;
pub mod error;
pub mod event;
pub mod exec;
pub mod intro;
pub mod journal;
pub mod marker;
pub mod options;
pub mod slice;
pub mod text;

// Re-export core types at crate root
pub use clipboard::Clipboard;
pub use codec::{FormatVersion, SessionLayout};
pub use command::{Key, KeyEvent, KeyModifiers, Outcome, ShellCommand, keymap};
pub use document::Document;
pub use edit::Editor;
pub use error::{Error, Result};
pub use event::{LogLevel, emit_event, emit_log, set_event_callback, set_log_callback};
pub use journal::{Coalesce, Journal};
pub use marker::{IoKind, MarkerSet, MarkerStore};
pub use options::{ShellMode, ShellOptions};
pub use slice::{Axis, SliceRange};
pub use text::{RopeBuffer, TextBuffer};

// Re-export execution types
pub use exec::{
    Assist, CallTip, CompletionOptions, EventPump, History, Interpreter, InterpreterIo, NoPump,
    PumpStatus, ReadlineContext, ScriptedPump, ShellSession,
};
