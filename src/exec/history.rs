//! Command history: recall, insertion and prefix search.

use crate::edit::Editor;
use crate::error::Result;
use crate::event::{HISTORY_ADD, HISTORY_CLEAR, emit_event};
use crate::slice::SliceRange;
use crate::text::TextBuffer;

/// Executed commands, newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<String>,
    /// Position of the last recalled entry. `None` means "not browsing";
    /// `Some(len)` is one past the oldest entry.
    index: Option<usize>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record `command` and stop browsing.
    ///
    /// Blank commands and repeats of the newest entry are not recorded.
    /// Returns whether an entry was added.
    pub fn add(&mut self, command: &str) -> bool {
        self.index = None;
        if command.is_empty() || self.entries.first().is_some_and(|e| e == command) {
            return false;
        }
        self.entries.insert(0, command.to_string());
        emit_event(HISTORY_ADD, command);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
        emit_event(HISTORY_CLEAR, "");
    }

    /// Move the browse position by `step` (positive = older).
    ///
    /// The position stays within "not browsing" and one past the oldest
    /// entry. Returns the entry at the new position, if there is one.
    fn step(&mut self, step: isize) -> Option<&str> {
        let current = self.index.map_or(-1, |i| i as isize);
        let next = current + step;
        let len = self.entries.len() as isize;
        if (-1..=len).contains(&next) {
            self.index = usize::try_from(next).ok();
        }
        if (0..len).contains(&next) {
            self.entries.get(next as usize).map(String::as_str)
        } else {
            None
        }
    }

    /// Entry indices in the order a prefix search visits them.
    ///
    /// Starts just past the current position and wraps around; from the
    /// newest end (or near the oldest) it scans the whole list.
    fn search_order(&self) -> Vec<usize> {
        let len = self.entries.len();
        match self.index {
            Some(i) if i + 2 < len => (i + 1..len).chain(0..i).collect(),
            _ => (0..len).collect(),
        }
    }

    /// Distinct words from every entry, sorted case-insensitively.
    ///
    /// Words are split on spaces, digits and common punctuation; single
    /// characters are dropped.
    #[must_use]
    pub fn words(&self) -> Vec<String> {
        let mut words: Vec<String> = self
            .entries
            .iter()
            .flat_map(|entry| entry.split(|c: char| c.is_ascii_digit() || " .[]=}()\\,\"\n\t".contains(c)))
            .filter(|w| w.chars().count() > 1)
            .map(str::to_string)
            .collect();
        words.sort_by_key(|w| w.to_lowercase());
        words.dedup();
        words
    }
}

impl<B: TextBuffer> Editor<B> {
    /// Replace the current command with an older (`step > 0`) or newer entry.
    pub fn history_replace(&mut self, history: &mut History, step: isize) -> Result<bool> {
        self.check_editable(self.document().caret_line())?;
        self.clear_command()?;
        self.replace_from_history(history, step)
    }

    /// Insert an entry at the caret and select it.
    pub fn history_insert(&mut self, history: &mut History, step: isize) -> Result<bool> {
        self.check_editable(self.document().caret_line())?;
        let start = self.document().caret();
        let inserted = self.replace_from_history(history, step)?;
        let end = self.document().caret();
        self.set_selection(end, start);
        Ok(inserted)
    }

    fn replace_from_history(&mut self, history: &mut History, step: isize) -> Result<bool> {
        self.replace_selection("")?;
        match history.step(step).map(str::to_string) {
            Some(entry) => {
                self.replace_selection(&entry)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Complete the command from the newest entry sharing the text before the caret.
    ///
    /// The completed remainder replaces everything after the caret and is
    /// left selected, so repeating the search cycles through matches.
    pub fn history_search(&mut self, history: &mut History) -> Result<bool> {
        let caret = self.document().caret();
        let line = self.document().line_of(caret);
        self.check_editable(line)?;
        let range = match self.readline_line() {
            Some(readline) => SliceRange::new(readline, readline),
            None => self.document().io_slice(line),
        };
        let start = self.document().line_start(range.start);
        let end = self.document().line_end(range.end);
        let prefix = self.document().text_range(start, caret);
        if prefix.is_empty() {
            return Ok(false);
        }

        let found = history
            .search_order()
            .into_iter()
            .find(|&i| history.entries[i].starts_with(&prefix));
        let Some(i) = found else {
            return Ok(false);
        };
        let rest = history.entries[i][prefix.len()..].to_string();
        self.set_selection(caret, end);
        self.replace_selection(&rest)?;
        let new_end = self.document().caret();
        self.set_selection(new_end, caret);
        history.index = Some(i);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(entries: &[&str]) -> History {
        let mut h = History::new();
        for e in entries.iter().rev() {
            h.add(e);
        }
        h
    }

    #[test]
    fn add_skips_blank_and_repeat() {
        let mut h = History::new();
        assert!(h.add("a=1"));
        assert!(!h.add("a=1"));
        assert!(!h.add(""));
        assert!(h.add("b=2"));
        assert!(h.add("a=1"));
        assert_eq!(h.entries(), ["a=1", "b=2", "a=1"]);
    }

    #[test]
    fn step_clamps_browse_position() {
        let mut h = history(&["new", "old"]);
        assert_eq!(h.step(1), Some("new"));
        assert_eq!(h.step(1), Some("old"));
        assert_eq!(h.step(1), None);
        assert_eq!(h.index(), Some(2));
        assert_eq!(h.step(1), None);
        assert_eq!(h.index(), Some(2));
        assert_eq!(h.step(-1), Some("old"));
        assert_eq!(h.step(-2), None);
        assert_eq!(h.index(), None);
    }

    #[test]
    fn replace_cycles_entries() {
        let mut h = history(&["x = 2", "x = 1"]);
        let mut editor = Editor::new();
        editor.type_text("junk").unwrap();
        assert!(editor.history_replace(&mut h, 1).unwrap());
        assert_eq!(editor.document().text(), "x = 2");
        assert!(editor.history_replace(&mut h, 1).unwrap());
        assert_eq!(editor.document().text(), "x = 1");
        assert!(editor.history_replace(&mut h, -1).unwrap());
        assert_eq!(editor.document().text(), "x = 2");
        assert!(!editor.history_replace(&mut h, -1).unwrap());
        assert_eq!(editor.document().text(), "");
    }

    #[test]
    fn insert_selects_entry() {
        let mut h = history(&["abc"]);
        let mut editor = Editor::new();
        editor.type_text("> ").unwrap();
        assert!(editor.history_insert(&mut h, 1).unwrap());
        assert_eq!(editor.document().text(), "> abc");
        assert_eq!(editor.document().selection(), (2, 5));
        assert_eq!(editor.document().caret(), 2);
    }

    #[test]
    fn search_completes_and_cycles() {
        let mut h = history(&["print 1", "pass", "print 2"]);
        let mut editor = Editor::new();
        editor.type_text("pr").unwrap();
        assert!(editor.history_search(&mut h).unwrap());
        assert_eq!(editor.document().text(), "print 1");
        assert_eq!(editor.document().selected_text(), "int 1");
        assert_eq!(editor.document().caret(), 2);

        assert!(editor.history_search(&mut h).unwrap());
        assert_eq!(editor.document().text(), "print 2");
        assert_eq!(h.index(), Some(2));
    }

    #[test]
    fn search_without_prefix_or_match() {
        let mut h = history(&["a"]);
        let mut editor = Editor::new();
        assert!(!editor.history_search(&mut h).unwrap());
        editor.type_text("zz").unwrap();
        assert!(!editor.history_search(&mut h).unwrap());
        assert_eq!(editor.document().text(), "zz");
    }

    #[test]
    fn words_are_split_and_sorted() {
        let h = history(&["print foo.Bar(x1)", "alpha = [beta, foo]"]);
        assert_eq!(h.words(), vec!["alpha", "Bar", "beta", "foo", "print"]);
    }

    #[test]
    fn clear_resets() {
        let mut h = history(&["a", "b"]);
        h.step(1);
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.index(), None);
    }
}
