//! Readline plumbing between a running command and the host.
//!
//! While the interpreter waits for input, the session hands a
//! [`ReadlineContext`] to the host's [`EventPump`] until the user submits
//! or cancels. Only the readline line is editable during that time.

use std::collections::VecDeque;

use crate::document::Document;
use crate::edit::Editor;
use crate::error::Result;
use crate::text::TextBuffer;

/// What the pump reports after one round of event processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpStatus {
    Continue,
    /// The host can no longer deliver input. Any pending readline is cancelled.
    Closed,
}

/// The host's event loop, as seen from inside a running command.
pub trait EventPump<B: TextBuffer> {
    /// Process pending user input against `ctx`.
    fn pump(&mut self, ctx: &mut ReadlineContext<'_, B>) -> PumpStatus;

    /// Show the document as it stands. Called while output is written,
    /// at most once per refresh interval.
    fn refresh(&mut self, _doc: &Document<B>) {}
}

/// A pump for hosts without interactive input: every readline is cancelled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPump;

impl<B: TextBuffer> EventPump<B> for NoPump {
    fn pump(&mut self, _ctx: &mut ReadlineContext<'_, B>) -> PumpStatus {
        PumpStatus::Closed
    }
}

/// A pump that answers each readline with the next queued line.
#[derive(Clone, Debug, Default)]
pub struct ScriptedPump {
    lines: VecDeque<String>,
    refreshes: usize,
}

impl ScriptedPump {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            refreshes: 0,
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }
}

impl<B: TextBuffer> EventPump<B> for ScriptedPump {
    fn pump(&mut self, ctx: &mut ReadlineContext<'_, B>) -> PumpStatus {
        let Some(line) = self.lines.pop_front() else {
            return PumpStatus::Closed;
        };
        if ctx.type_text(&line).is_err() {
            ctx.cancel();
        } else {
            ctx.submit();
        }
        PumpStatus::Continue
    }

    fn refresh(&mut self, _doc: &Document<B>) {
        self.refreshes += 1;
    }
}

/// The pending readline, exposed to the pump.
pub struct ReadlineContext<'a, B: TextBuffer> {
    editor: &'a mut Editor<B>,
    line: usize,
    slot: Option<String>,
}

impl<'a, B: TextBuffer> ReadlineContext<'a, B> {
    pub(crate) fn new(editor: &'a mut Editor<B>, line: usize) -> Self {
        Self {
            editor,
            line,
            slot: None,
        }
    }

    #[must_use]
    pub fn editor(&self) -> &Editor<B> {
        self.editor
    }

    /// Line holding the user's answer.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn line_text(&self) -> String {
        self.editor.document().line_text(self.line)
    }

    /// Type at the caret, moving it onto the readline line first if needed.
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        let doc = self.editor.document();
        if doc.caret_line() != self.line {
            let end = doc.line_end(self.line);
            self.editor.set_caret(end);
        }
        self.editor.type_text(text)
    }

    pub fn backspace(&mut self) -> Result<bool> {
        self.editor.backspace()
    }

    pub fn delete_forward(&mut self) -> Result<bool> {
        self.editor.delete_forward()
    }

    /// Move the caret within the readline line.
    pub fn set_column(&mut self, column: usize) {
        let doc = self.editor.document();
        let start = doc.line_start(self.line);
        let end = doc.line_end(self.line);
        self.editor.set_caret((start + column).min(end));
    }

    /// Finish with the line's text.
    pub fn submit(&mut self) {
        if self.slot.is_none() {
            self.slot = Some(format!("{}\n", self.line_text()));
        }
    }

    /// Finish with no input.
    pub fn cancel(&mut self) {
        if self.slot.is_none() {
            self.slot = Some(String::new());
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.slot.is_some()
    }

    pub(crate) fn take(&mut self) -> Option<String> {
        self.slot.take()
    }
}

/// Spin `pump` until the readline on `line` is submitted or cancelled.
pub(crate) fn wait_for_line<B, P>(editor: &mut Editor<B>, pump: &mut P, line: usize) -> String
where
    B: TextBuffer,
    P: EventPump<B> + ?Sized,
{
    let mut ctx = ReadlineContext::new(editor, line);
    let end = ctx.editor.document().line_end(line);
    ctx.editor.set_caret(end);
    while !ctx.is_done() {
        if pump.pump(&mut ctx) == PumpStatus::Closed {
            ctx.cancel();
        }
    }
    ctx.take().unwrap_or_default()
}
