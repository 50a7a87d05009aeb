//! Session file format.
//!
//! A session file is plain text that a Python tokenizer still accepts:
//! every structural boundary is a comment line (a *sentinel*) and every
//! output line is prefixed with `#`.
//!
//! ```text
//! #!/usr/bin/env python
//! #PySlices Save Format Version 1.2 (PySlices v0.9.8 and later)
//! #PySlices Marker Information -- Begin Grouping Slice
//! #PySlices Marker Information -- Begin Input Slice
//! a = 1
//! print a
//! #PySlices Marker Information -- Begin Output Slice
//! #1
//! ```
//!
//! Only start markers are stored. The loader rebuilds every derived marker
//! from them, so folding and gutter selection are not persisted.
//!
//! # Examples
//!
//! ```
//! use sliceshell::Editor;
//!
//! let mut editor = Editor::new();
//! editor.type_text("a = 1").unwrap();
//! let saved = editor.save_session();
//!
//! let mut other = Editor::new();
//! other.load_session(&saved).unwrap();
//! assert_eq!(other.document().text(), "a = 1");
//! ```

use std::fs;
use std::path::Path;

use crate::document::Document;
use crate::edit::Editor;
use crate::error::{Error, Result};
use crate::event::{LogLevel, SESSION_LOADED, SESSION_SAVED, emit_event, emit_log};
use crate::journal::{Coalesce, Edit};
use crate::marker::{IoKind, IoRole, MarkerSet, MarkerStore};
use crate::text::{TextBuffer, fix_line_endings};

pub const SHEBANG: &str = "#!/usr/bin/env python";
pub const HEADER_V1_1: &str = "#PySlices Save Format Version 1.1 (PySlices v0.9.7.8 and later)";
pub const HEADER_V1_2: &str = "#PySlices Save Format Version 1.2 (PySlices v0.9.8 and later)";
pub const GROUPING_SENTINEL: &str = "#PySlices Marker Information -- Begin Grouping Slice";
pub const INPUT_SENTINEL: &str = "#PySlices Marker Information -- Begin Input Slice";
pub const OUTPUT_SENTINEL: &str = "#PySlices Marker Information -- Begin Output Slice";

/// Header version a session file was read with. Saving always writes 1.2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    V1_1,
    V1_2,
}

impl FormatVersion {
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::V1_1 => HEADER_V1_1,
            Self::V1_2 => HEADER_V1_2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1_1 => "1.1",
            Self::V1_2 => "1.2",
        }
    }

    fn from_header(line: &str) -> Option<Self> {
        match line {
            HEADER_V1_2 => Some(Self::V1_2),
            HEADER_V1_1 => Some(Self::V1_1),
            _ => None,
        }
    }
}

fn sentinel_kind(line: &str) -> Option<IoKind> {
    match line {
        INPUT_SENTINEL => Some(IoKind::Input),
        OUTPUT_SENTINEL => Some(IoKind::Output),
        _ => None,
    }
}

const fn sentinel_for(kind: IoKind) -> &'static str {
    match kind {
        IoKind::Input => INPUT_SENTINEL,
        IoKind::Output => OUTPUT_SENTINEL,
    }
}

/// Lines and start markers of a document, before any marker is derived.
///
/// Used by the loader, by startup composition and by tests that need a
/// document of a known shape.
///
/// ```
/// use sliceshell::codec::SessionLayout;
/// use sliceshell::marker::IoKind;
///
/// let layout = SessionLayout::new()
///     .grouping(IoKind::Input, "x = 1\nx")
///     .slice(IoKind::Output, "1")
///     .grouping(IoKind::Input, "");
/// assert_eq!(layout.text(), "x = 1\nx\n1\n");
/// assert!(layout.validate().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionLayout {
    lines: Vec<String>,
    markers: Vec<MarkerSet>,
}

impl SessionLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new grouping whose first I/O-slice holds `text`.
    #[must_use]
    pub fn grouping(mut self, kind: IoKind, text: &str) -> Self {
        self.push_slice(MarkerSet::grouping_start(kind), kind, text);
        self
    }

    /// Add an I/O-slice to the last grouping (or open the first one).
    #[must_use]
    pub fn slice(mut self, kind: IoKind, text: &str) -> Self {
        let first = if self.lines.is_empty() {
            MarkerSet::grouping_start(kind)
        } else {
            MarkerSet::GROUP_MIDDLE | kind.marker(IoRole::Start)
        };
        self.push_slice(first, kind, text);
        self
    }

    /// Append every line of `other` after this layout's.
    #[must_use]
    pub fn append(mut self, other: Self) -> Self {
        self.lines.extend(other.lines);
        self.markers.extend(other.markers);
        self
    }

    fn push_slice(&mut self, first: MarkerSet, kind: IoKind, text: &str) {
        let text = fix_line_endings(text);
        for (i, line) in text.split('\n').enumerate() {
            self.lines.push(line.to_string());
            self.markers
                .push(if i == 0 { first } else { MarkerSet::continuation(kind) });
        }
    }

    /// Capture the start markers of `doc`.
    pub fn from_document<B: TextBuffer>(doc: &Document<B>) -> Self {
        let mut layout = Self::new();
        for line in 0..doc.line_count() {
            let m = doc.markers_of(line);
            let kind = doc.kind_of(line);
            let start = if line == 0 || m.is_grouping_start() {
                MarkerSet::grouping_start(kind)
            } else if m.is_io_start() {
                MarkerSet::GROUP_MIDDLE | kind.marker(IoRole::Start)
            } else {
                MarkerSet::continuation(kind)
            };
            layout.lines.push(doc.line_text(line));
            layout.markers.push(start);
        }
        layout
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn markers(&self) -> &[MarkerSet] {
        &self.markers
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Lines that open a grouping.
    #[must_use]
    pub fn grouping_starts(&self) -> Vec<usize> {
        self.positions(MarkerSet::is_grouping_start)
    }

    /// Lines that open an I/O-slice, grouping starts included.
    #[must_use]
    pub fn io_starts(&self) -> Vec<usize> {
        self.positions(|m| m.is_grouping_start() || m.is_io_start())
    }

    fn positions(&self, pred: impl Fn(MarkerSet) -> bool) -> Vec<usize> {
        self.markers
            .iter()
            .enumerate()
            .filter(|(_, m)| pred(**m))
            .map(|(i, _)| i)
            .collect()
    }

    /// Markers with every derived marker filled in.
    #[must_use]
    pub fn to_markers(&self) -> MarkerStore {
        MarkerStore::from_sets(self.markers.clone())
    }

    /// First line breaking a document invariant once markers are derived.
    #[must_use]
    pub fn first_invalid_line(&self) -> Option<usize> {
        self.to_markers().first_invalid_line()
    }

    pub fn validate(&self) -> Result<()> {
        match self.first_invalid_line() {
            Some(line) => Err(Error::CorruptMarkerState { line }),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        self.write_into(&mut doc);
        doc
    }

    /// Replace `doc`'s text and markers with this layout. The caret moves to the end.
    pub fn write_into<B: TextBuffer>(&self, doc: &mut Document<B>) {
        doc.set_content(&self.text(), self.to_markers());
    }
}

/// A successfully parsed session file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedSession {
    pub layout: SessionLayout,
    pub version: FormatVersion,
}

fn format_error(line: usize, reason: impl Into<String>) -> Error {
    Error::FileFormat {
        line,
        reason: reason.into(),
    }
}

/// Parse a session file. Line numbers in errors are zero-based file lines.
pub fn parse(text: &str) -> Result<ParsedSession> {
    let text = fix_line_endings(text);
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;

    let mut n = usize::from(lines.first() == Some(&SHEBANG));
    let version = lines
        .get(n)
        .and_then(|line| FormatVersion::from_header(line))
        .ok_or_else(|| format_error(n, "missing format header"))?;
    n += 1;

    let mut layout = SessionLayout::new();
    // File line of every document line, for error reporting.
    let mut sources = Vec::new();
    let mut kind: Option<IoKind> = None;
    let mut next_start: Option<MarkerSet> = None;
    let mut grouping_open = false;
    // Sentinel line of an I/O-slice that has no lines yet.
    let mut empty_since: Option<usize> = None;

    for (i, &line) in lines.iter().enumerate().skip(n) {
        if line == GROUPING_SENTINEL {
            if grouping_open {
                return Err(format_error(i - 1, "grouping without an I/O-slice"));
            }
            if let Some(at) = empty_since {
                return Err(format_error(at, "empty slice"));
            }
            grouping_open = true;
            continue;
        }
        if let Some(k) = sentinel_kind(line) {
            if let Some(at) = empty_since {
                return Err(format_error(at, "empty slice"));
            }
            if !grouping_open && kind.is_none() {
                return Err(format_error(i, "slice outside a grouping"));
            }
            next_start = Some(if grouping_open {
                MarkerSet::grouping_start(k)
            } else {
                MarkerSet::GROUP_MIDDLE | k.marker(IoRole::Start)
            });
            grouping_open = false;
            kind = Some(k);
            empty_since = Some(i);
            continue;
        }
        if grouping_open {
            return Err(format_error(i, "expected an I/O-slice marker"));
        }
        let Some(k) = kind else {
            return Err(format_error(i, "text before the first grouping"));
        };
        let data = match k {
            IoKind::Input => line,
            IoKind::Output => match line.strip_prefix('#') {
                Some(data) => data,
                // A trailing newline after the last output line.
                None if i == last && line.is_empty() => continue,
                None => {
                    return Err(format_error(
                        i,
                        format!("output line {} lacks the '#' prefix: {line:?}", i + 1),
                    ));
                }
            },
        };
        let markers = next_start
            .take()
            .unwrap_or_else(|| MarkerSet::continuation(k));
        layout.lines.push(data.to_string());
        layout.markers.push(markers);
        sources.push(i);
        empty_since = None;
    }

    if grouping_open {
        return Err(format_error(last, "grouping without an I/O-slice"));
    }
    if let Some(at) = empty_since {
        return Err(format_error(at, "empty slice"));
    }
    if layout.is_empty() {
        return Err(format_error(n.min(last), "no slices"));
    }
    if let Some(bad) = layout.first_invalid_line() {
        let line = sources.get(bad).copied().unwrap_or(last);
        return Err(format_error(line, "illegal slice layout"));
    }
    Ok(ParsedSession { layout, version })
}

/// Serialize `doc` in the 1.2 format.
#[must_use]
pub fn save<B: TextBuffer>(doc: &Document<B>) -> String {
    let mut out = vec![SHEBANG.to_string(), HEADER_V1_2.to_string()];
    for line in 0..doc.line_count() {
        let m = doc.markers_of(line);
        let kind = doc.kind_of(line);
        if line == 0 || m.is_grouping_start() {
            out.push(GROUPING_SENTINEL.to_string());
            out.push(sentinel_for(kind).to_string());
        } else if m.is_io_start() {
            out.push(sentinel_for(kind).to_string());
        }
        let text = doc.line_text(line);
        out.push(match kind {
            IoKind::Input => text,
            IoKind::Output => format!("#{text}"),
        });
    }
    out.join("\n")
}

impl<B: TextBuffer> Editor<B> {
    /// Replace the document with `layout`, dropping the journal.
    pub(crate) fn load_layout(&mut self, layout: &SessionLayout) {
        layout.write_into(self.document_mut());
        self.clear_journal();
    }

    /// Replace the document with a parsed session file.
    ///
    /// On failure the document is left untouched.
    pub fn load_session(&mut self, text: &str) -> Result<FormatVersion> {
        let parsed = parse(text).inspect_err(|e| {
            emit_log(LogLevel::Warn, &format!("session not loaded: {e}"));
        })?;
        self.load_layout(&parsed.layout);
        self.mark_saved();
        emit_event(SESSION_LOADED, parsed.version.as_str());
        Ok(parsed.version)
    }

    #[must_use]
    pub fn save_session(&self) -> String {
        save(self.document())
    }

    pub fn save_session_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.save_session())?;
        self.mark_saved();
        emit_log(LogLevel::Info, &format!("session saved to {}", path.display()));
        emit_event(SESSION_SAVED, &path.display().to_string());
        Ok(())
    }

    pub fn load_session_file(&mut self, path: impl AsRef<Path>) -> Result<FormatVersion> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).inspect_err(|e| {
            emit_log(LogLevel::Warn, &format!("cannot read {}: {e}", path.display()));
        })?;
        self.load_session(&text)
    }

    /// Insert `text` as a new input grouping after the grouping under the caret.
    ///
    /// One undo record. The caret ends after the inserted text.
    pub fn load_file_as_slice(&mut self, text: &str) -> Result<()> {
        let text = fix_line_endings(text);
        let text = text.trim_end_matches('\n');
        let doc = self.document();
        let grouping = doc.grouping_slice(doc.caret_line());
        let pos = doc.line_end(grouping.end);
        let inserted = format!("\n{text}");

        let pending = self.begin();
        let doc = self.document_mut();
        let end = doc.raw_insert(pos, &inserted);
        let edit = Edit::insert(pos, grouping.end, &inserted);
        let first = grouping.end + 1;
        let last = grouping.end + edit.num_lines;
        let markers = doc.markers_mut();
        markers.mark_grouping_start(first, IoKind::Input);
        for line in first + 1..=last {
            markers.mark_continuation(line, IoKind::Input);
        }
        markers.reflow(first, last + 1);
        self.finish(pending, first, last + 1, edit, Coalesce::Never)?;
        self.set_caret(end);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layout() -> SessionLayout {
        SessionLayout::new()
            .grouping(IoKind::Input, "a = 1\nprint a")
            .slice(IoKind::Output, "1")
            .grouping(IoKind::Input, "")
    }

    fn file(body: &[&str]) -> String {
        let mut lines = vec![SHEBANG, HEADER_V1_2];
        lines.extend_from_slice(body);
        lines.join("\n")
    }

    #[test]
    fn layout_builder_positions() {
        let layout = sample_layout();
        assert_eq!(layout.line_count(), 4);
        assert_eq!(layout.grouping_starts(), vec![0, 3]);
        assert_eq!(layout.io_starts(), vec![0, 2, 3]);
        let doc = layout.to_document();
        assert_eq!(doc.kind_of(2), IoKind::Output);
        assert!(doc.markers_of(2).contains(MarkerSet::OUTPUT_BACKGROUND));
        assert!(doc.markers_of(1).contains(MarkerSet::INPUT_END));
    }

    #[test]
    fn save_emits_sentinels_and_comments_output() {
        let saved = save(&sample_layout().to_document());
        let expected = file(&[
            GROUPING_SENTINEL,
            INPUT_SENTINEL,
            "a = 1",
            "print a",
            OUTPUT_SENTINEL,
            "#1",
            GROUPING_SENTINEL,
            INPUT_SENTINEL,
            "",
        ]);
        assert_eq!(saved, expected);
    }

    #[test]
    fn load_restores_layout() {
        let layout = sample_layout();
        let parsed = parse(&save(&layout.to_document())).unwrap();
        assert_eq!(parsed.version, FormatVersion::V1_2);
        assert_eq!(parsed.layout, layout);
    }

    #[test]
    fn accepts_old_header_without_shebang() {
        let text = [HEADER_V1_1, GROUPING_SENTINEL, INPUT_SENTINEL, "x"].join("\n");
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.version, FormatVersion::V1_1);
        assert_eq!(parsed.layout.text(), "x");
    }

    #[test]
    fn trailing_newline_after_output_is_ignored() {
        let text = file(&[GROUPING_SENTINEL, INPUT_SENTINEL, "x", OUTPUT_SENTINEL, "#1", ""]);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.layout.text(), "x\n1");
    }

    #[test]
    fn crlf_files_load() {
        let text = file(&[GROUPING_SENTINEL, INPUT_SENTINEL, "x"]).replace('\n', "\r\n");
        assert_eq!(parse(&text).unwrap().layout.text(), "x");
    }

    #[test]
    fn rejects_malformed_files() {
        let cases: Vec<(String, usize)> = vec![
            ("x = 1".to_string(), 0),
            (file(&["x"]), 2),
            (file(&[GROUPING_SENTINEL, "x"]), 3),
            (file(&[INPUT_SENTINEL, "x"]), 2),
            (file(&[GROUPING_SENTINEL, INPUT_SENTINEL, OUTPUT_SENTINEL, "#1"]), 3),
            (file(&[GROUPING_SENTINEL, INPUT_SENTINEL, "x", OUTPUT_SENTINEL, "1"]), 6),
            (file(&[GROUPING_SENTINEL, INPUT_SENTINEL, "x", GROUPING_SENTINEL]), 5),
            (file(&[]), 1),
        ];
        for (text, line) in cases {
            match parse(&text) {
                Err(Error::FileFormat { line: at, .. }) => assert_eq!(at, line, "{text:?}"),
                other => panic!("expected a format error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn bare_output_line_is_named_in_the_error() {
        let text = file(&[GROUPING_SENTINEL, INPUT_SENTINEL, "x", OUTPUT_SENTINEL, "#1", "2"]);
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, Error::FileFormat { line: 7, .. }));
        assert_eq!(
            err.to_string(),
            "invalid session file at line 8: output line 8 lacks the '#' prefix: \"2\""
        );
    }

    #[test]
    fn rejects_illegal_layout() {
        // An input slice may not follow an output slice inside one grouping.
        let text = file(&[
            GROUPING_SENTINEL,
            INPUT_SENTINEL,
            "x",
            OUTPUT_SENTINEL,
            "#1",
            INPUT_SENTINEL,
            "y",
        ]);
        assert!(matches!(parse(&text), Err(Error::FileFormat { line: 8, .. })));
    }

    #[test]
    fn failed_load_leaves_editor_unchanged() {
        let mut editor = Editor::new();
        editor.type_text("keep").unwrap();
        assert!(editor.load_session("garbage").is_err());
        assert_eq!(editor.document().text(), "keep");
        assert!(editor.journal().can_undo());
    }

    #[test]
    fn load_session_resets_state() {
        let mut editor = Editor::new();
        editor.type_text("old").unwrap();
        let saved = save(&sample_layout().to_document());
        assert_eq!(editor.load_session(&saved).unwrap(), FormatVersion::V1_2);
        assert_eq!(editor.document().text(), "a = 1\nprint a\n1\n");
        assert!(!editor.is_modified());
        assert!(!editor.journal().can_undo());
    }

    #[test]
    fn save_and_load_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.pyslices");
        let mut editor = Editor::new();
        editor.load_layout(&sample_layout());
        editor.type_text("x").unwrap();
        assert!(editor.is_modified());
        editor.save_session_file(&path).unwrap();
        assert!(!editor.is_modified());

        let mut other = Editor::new();
        other.load_session_file(&path).unwrap();
        assert!(other.document().same_content(editor.document()));
        assert!(matches!(
            other.load_session_file(dir.path().join("missing")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn file_as_slice_is_new_grouping() {
        let mut editor = Editor::new();
        editor.load_layout(&sample_layout());
        editor.set_caret(0);
        editor.load_file_as_slice("def f():\r\n    pass\n").unwrap();
        let doc = editor.document();
        assert_eq!(doc.text(), "a = 1\nprint a\n1\ndef f():\n    pass\n");
        assert!(doc.markers_of(3).is_grouping_start());
        assert_eq!(doc.kind_of(4), IoKind::Input);
        assert_eq!(doc.caret(), doc.line_end(4));
        assert!(editor.validate().is_ok());

        editor.undo();
        assert!(editor.document().same_content(&sample_layout().to_document()));
    }
}
