//! Copy, cut and paste for text and for whole slices.
//!
//! [`Clipboard`] is owned by the host (or the shell session) and handed to
//! the editor for each request. It holds two independent slots: plain text,
//! and a [`SliceClip`] with lines plus their markers.

use crate::edit::Editor;
use crate::error::{Error, Result};
use crate::journal::{Coalesce, Edit};
use crate::marker::{IoKind, MarkerSet};
use crate::slice;
use crate::text::{TextBuffer, fix_line_endings};

/// Prompt shown before the first line of an input slice.
pub const PS1: &str = ">>> ";
/// Prompt shown before continuation lines of an input slice.
pub const PS2: &str = "... ";

/// Whole lines copied with their markers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SliceClip {
    lines: Vec<String>,
    markers: Vec<MarkerSet>,
}

impl SliceClip {
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn markers(&self) -> &[MarkerSet] {
        &self.markers
    }
}

/// Text and slice clipboard.
#[derive(Clone, Debug, Default)]
pub struct Clipboard {
    text: Option<String>,
    slices: Option<SliceClip>,
}

impl Clipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    #[must_use]
    pub fn slices(&self) -> Option<&SliceClip> {
        self.slices.as_ref()
    }

    pub fn clear(&mut self) {
        self.text = None;
        self.slices = None;
    }
}

/// Remove one leading `>>> ` or `... ` prompt from each line.
#[must_use]
pub fn strip_prompts(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            line.strip_prefix(PS1)
                .or_else(|| line.strip_prefix(PS2))
                .unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl<B: TextBuffer> Editor<B> {
    /// Copy the selection without prompts. Returns `false` with nothing selected.
    pub fn copy(&self, clipboard: &mut Clipboard) -> bool {
        if !self.document().has_selection() {
            return false;
        }
        clipboard.set_text(strip_prompts(&self.document().selected_text()));
        true
    }

    /// Copy the selection, then delete it.
    ///
    /// Nothing is copied if the selection cannot be deleted.
    pub fn cut(&mut self, clipboard: &mut Clipboard) -> Result<bool> {
        if !self.document().has_selection() {
            return Ok(false);
        }
        let text = self.document().selected_text();
        let (start, end) = self.document().selection();
        self.delete(start, end)?;
        clipboard.set_text(strip_prompts(&text));
        Ok(true)
    }

    /// Copy the selection with `>>> ` and `... ` before every input line.
    pub fn copy_with_prompts(&self, clipboard: &mut Clipboard) -> bool {
        match self.prompted_selection() {
            Some(lines) => {
                clipboard.set_text(lines.join("\n"));
                true
            }
            None => false,
        }
    }

    /// Same as [`copy_with_prompts`](Self::copy_with_prompts), with every line indented by four spaces.
    pub fn copy_with_prompts_prefixed(&self, clipboard: &mut Clipboard) -> bool {
        match self.prompted_selection() {
            Some(lines) => {
                let text = lines
                    .iter()
                    .map(|line| format!("    {line}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                clipboard.set_text(text);
                true
            }
            None => false,
        }
    }

    fn prompted_selection(&self) -> Option<Vec<String>> {
        let doc = self.document();
        if !doc.has_selection() {
            return None;
        }
        let (start, end) = doc.selection();
        let lines = (doc.line_of(start)..=doc.line_of(end))
            .map(|line| {
                let line_start = doc.line_start(line);
                let from = start.max(line_start);
                let to = end.min(doc.line_end(line));
                let text = doc.text_range(from, to);
                if doc.kind_of(line) == IoKind::Input && from == line_start {
                    let prompt = if doc.io_slice(line).start == line { PS1 } else { PS2 };
                    format!("{prompt}{text}")
                } else {
                    text
                }
            })
            .collect();
        Some(lines)
    }

    /// Paste the clipboard text at the caret, replacing the selection.
    ///
    /// Line endings are normalized, trailing whitespace and prompts are
    /// stripped, and the text is inserted as one undo record.
    pub fn paste(&mut self, clipboard: &Clipboard) -> Result<bool> {
        let Some(raw) = clipboard.text() else {
            return Ok(false);
        };
        let text = strip_prompts(fix_line_endings(raw).trim_end());
        if self.document().has_selection() {
            let (start, end) = self.document().selection();
            self.delete(start, end)?;
        }
        let caret = self.document().caret();
        let end = self.insert(caret, &text, Coalesce::Never)?;
        self.set_caret(end);
        Ok(true)
    }

    /// Copy every gutter-selected line with its markers.
    pub fn copy_selected_slices(&self, clipboard: &mut Clipboard) -> bool {
        let doc = self.document();
        let runs = slice::selection_slices(doc.markers());
        if runs.is_empty() {
            return false;
        }
        let mut clip = SliceClip::default();
        for run in runs {
            for line in run.start..=run.end {
                clip.lines.push(doc.line_text(line));
                clip.markers
                    .push(doc.markers_of(line) - MarkerSet::SELECTING - MarkerSet::READLINE);
            }
        }
        clipboard.slices = Some(clip);
        true
    }

    /// Copy the gutter-selected slices, then delete them.
    pub fn cut_selected_slices(&mut self, clipboard: &mut Clipboard) -> Result<bool> {
        let mut scratch = Clipboard::new();
        if !self.copy_selected_slices(&mut scratch) {
            return Ok(false);
        }
        self.delete_selected_slices()?;
        clipboard.slices = scratch.slices;
        Ok(true)
    }

    /// Insert the slice clipboard after the grouping under the caret.
    ///
    /// The pasted lines keep their markers; the first one always opens a
    /// grouping. Fails with [`Error::IllegalAdjacency`] if the seam with
    /// the grouping above is not allowed.
    pub fn paste_slices(&mut self, clipboard: &Clipboard) -> Result<bool> {
        let Some(clip) = clipboard.slices() else {
            return Ok(false);
        };
        if clip.lines.is_empty() {
            return Ok(false);
        }
        if let Some(line) = self.readline_line() {
            return Err(Error::ReadOnlyRegion { line });
        }

        let grouping = self.document().grouping_slice(self.document().caret_line());
        let anchor = grouping.end;
        let pos = self.document().line_end(anchor);
        let text = format!("\n{}", clip.lines.join("\n"));

        let pending = self.begin();
        let doc = self.document_mut();
        doc.raw_insert(pos, &text);
        let markers = doc.markers_mut();
        for (offset, set) in clip.markers.iter().enumerate() {
            markers.set_raw(anchor + 1 + offset, *set);
        }
        let first = anchor + 1;
        if !markers.markers_of(first).is_grouping_start() {
            let kind = markers.markers_of(first).io_kind().unwrap_or(IoKind::Input);
            markers.mark_grouping_start(first, kind);
        }
        let last = anchor + clip.lines.len();
        markers.reflow(first, last + 1);

        let edit = Edit::insert(pos, anchor, &text);
        self.finish(pending, first, last, edit, Coalesce::Never)?;
        let caret = self.document().line_start(first);
        self.set_caret(caret);
        Ok(true)
    }
}
