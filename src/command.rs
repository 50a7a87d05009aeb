//! Host-facing commands and the default key bindings.
//!
//! A host translates its key events into [`KeyEvent`]s, looks them up with
//! [`keymap`] and hands the resulting [`ShellCommand`] to
//! [`ShellSession::dispatch`]. Hosts with their own bindings can build
//! commands directly.

use std::path::PathBuf;

use bitflags::bitflags;

use crate::error::Result;
use crate::exec::{Interpreter, ShellSession};
use crate::options::ShellMode;
use crate::slice::Axis;
use crate::text::TextBuffer;

bitflags! {
    /// Keyboard modifier flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT = 0b0000_0010;
        const CTRL = 0b0000_0100;
    }
}

/// Keys the shell binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Escape,
    Up,
    Down,
    Char(char),
    F(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(key: Key, modifiers: KeyModifiers) -> Self {
        Self { key, modifiers }
    }

    #[must_use]
    pub const fn plain(key: Key) -> Self {
        Self::new(key, KeyModifiers::empty())
    }

    #[must_use]
    pub const fn ctrl(c: char) -> Self {
        Self::new(Key::Char(c), KeyModifiers::CTRL)
    }
}

/// Something the user asked the shell to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    /// Run the input slice under the caret.
    Run,
    /// The return gesture: a line break, or a run in shell mode.
    Return,
    ClearCommand,
    Undo,
    Redo,
    HistoryPrev,
    HistoryNext,
    HistoryInsertPrev,
    HistoryInsertNext,
    HistorySearch,
    SplitSlice,
    MergeSelected,
    DeleteSelectedSlices,
    /// Toggle the fold of the slice under the caret.
    ToggleFold(Axis),
    SelectAllSlices,
    UnselectAllSlices,
    Copy,
    CopyWithPrompts,
    CopyWithPromptsPrefixed,
    Cut,
    Paste,
    PasteAndRun,
    CopySlices,
    CutSlices,
    PasteSlices,
    Save(PathBuf),
    Load(PathBuf),
    LoadFileAsSlice(PathBuf),
}

/// Result of dispatching a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The document or a clipboard changed.
    Changed,
    /// Nothing to do; the host may beep.
    Unchanged,
}

impl From<bool> for Outcome {
    fn from(changed: bool) -> Self {
        if changed { Self::Changed } else { Self::Unchanged }
    }
}

/// Default key bindings.
#[must_use]
pub fn keymap(event: KeyEvent) -> Option<ShellCommand> {
    let ctrl = KeyModifiers::CTRL;
    let shift = KeyModifiers::SHIFT;
    let alt = KeyModifiers::ALT;
    let command = match (event.key, event.modifiers) {
        (Key::Enter, m) if m.is_empty() => ShellCommand::Return,
        (Key::Enter, m) if m == ctrl || m == shift => ShellCommand::Run,
        (Key::Escape, m) if m.is_empty() => ShellCommand::ClearCommand,
        (Key::Up, m) if m == ctrl => ShellCommand::HistoryPrev,
        (Key::Down, m) if m == ctrl => ShellCommand::HistoryNext,
        (Key::Up, m) if m == shift => ShellCommand::HistoryInsertPrev,
        (Key::Down, m) if m == shift => ShellCommand::HistoryInsertNext,
        (Key::F(8), m) if m.is_empty() => ShellCommand::HistorySearch,
        (Key::F(12), m) if m.is_empty() => ShellCommand::ToggleFold(Axis::Grouping),
        (Key::F(12), m) if m == shift => ShellCommand::ToggleFold(Axis::Io),
        (Key::Char(c), m) if m == ctrl => match c.to_ascii_lowercase() {
            'z' => ShellCommand::Undo,
            'y' => ShellCommand::Redo,
            'c' => ShellCommand::Copy,
            'x' => ShellCommand::Cut,
            'v' => ShellCommand::Paste,
            'd' => ShellCommand::SplitSlice,
            'm' => ShellCommand::MergeSelected,
            'a' => ShellCommand::SelectAllSlices,
            'p' => ShellCommand::HistoryPrev,
            'n' => ShellCommand::HistoryNext,
            _ => return None,
        },
        (Key::Char(c), m) if m == ctrl | shift => match c.to_ascii_lowercase() {
            'c' => ShellCommand::CopyWithPrompts,
            'v' => ShellCommand::PasteAndRun,
            'a' => ShellCommand::UnselectAllSlices,
            _ => return None,
        },
        (Key::Char(c), m) if m == ctrl | alt => match c.to_ascii_lowercase() {
            'c' => ShellCommand::CopyWithPromptsPrefixed,
            _ => return None,
        },
        _ => return None,
    };
    Some(command)
}

impl<I: Interpreter, B: TextBuffer + 'static> ShellSession<I, B> {
    /// Carry out `command`.
    ///
    /// Refused edits come back as errors; see [`Error::is_refusal`](crate::Error::is_refusal).
    pub fn dispatch(&mut self, command: ShellCommand) -> Result<Outcome> {
        let outcome = match command {
            ShellCommand::Run => {
                self.run_current()?;
                Outcome::Changed
            }
            ShellCommand::Return => {
                self.on_return()?;
                Outcome::Changed
            }
            ShellCommand::ClearCommand => self.editor_mut().clear_command()?.into(),
            ShellCommand::Undo => self.editor_mut().undo().into(),
            ShellCommand::Redo => self.editor_mut().redo().into(),
            ShellCommand::HistoryPrev => self.history_prev()?.into(),
            ShellCommand::HistoryNext => self.history_next()?.into(),
            ShellCommand::HistoryInsertPrev => self.history_insert(1)?.into(),
            ShellCommand::HistoryInsertNext => self.history_insert(-1)?.into(),
            ShellCommand::HistorySearch => self.history_search()?.into(),
            ShellCommand::SplitSlice => self.editor_mut().split_at_caret()?.into(),
            ShellCommand::MergeSelected => self.editor_mut().merge_selected()?.into(),
            ShellCommand::DeleteSelectedSlices => self.editor_mut().delete_selected_slices()?.into(),
            ShellCommand::ToggleFold(axis) => {
                let line = self.editor().document().caret_line();
                self.editor_mut().toggle_fold(line, axis)?.into()
            }
            ShellCommand::SelectAllSlices => {
                self.editor_mut().select_all_slices();
                Outcome::Changed
            }
            ShellCommand::UnselectAllSlices => {
                self.editor_mut().unselect_all_slices();
                Outcome::Changed
            }
            ShellCommand::Copy => self.copy().into(),
            ShellCommand::CopyWithPrompts => self.copy_with_prompts().into(),
            ShellCommand::CopyWithPromptsPrefixed => self.copy_with_prompts_prefixed().into(),
            ShellCommand::Cut => self.cut()?.into(),
            ShellCommand::Paste => self.paste()?.into(),
            ShellCommand::PasteAndRun => self.paste_and_run()?.into(),
            ShellCommand::CopySlices => self.copy_selected_slices().into(),
            ShellCommand::CutSlices => self.cut_selected_slices()?.into(),
            ShellCommand::PasteSlices => self.paste_slices()?.into(),
            ShellCommand::Save(path) => {
                self.save(path)?;
                Outcome::Changed
            }
            ShellCommand::Load(path) => {
                self.load(path)?;
                Outcome::Changed
            }
            ShellCommand::LoadFileAsSlice(path) => {
                self.load_file_as_slice(path)?;
                Outcome::Changed
            }
        };
        Ok(outcome)
    }

    /// Look `event` up in the default bindings and dispatch it.
    ///
    /// Returns `None` for unbound keys.
    pub fn handle_key(&mut self, event: KeyEvent) -> Result<Option<Outcome>> {
        match keymap(event) {
            Some(command) => self.dispatch(command).map(Some),
            None => Ok(None),
        }
    }

    /// Switch between slices mode and shell mode.
    pub fn set_mode(&mut self, mode: ShellMode) {
        let mut options = self.options().clone();
        options.mode = mode;
        self.set_options(options);
    }
}
