//! Execution coordinator.
//!
//! [`ShellSession`] owns the editor, the interpreter and the host's event
//! pump. Running an input slice:
//!
//! 1. deletes the outputs left by its previous run,
//! 2. opens an output slice right below it,
//! 3. splits the command into statements and pushes them one by one,
//!    appending everything the interpreter writes to the output slice,
//! 4. records the command in the history and moves the caret to the next
//!    prompt, clearing the undo journal.
//!
//! When the interpreter asks for input, a readline line is opened at the end
//! of the output and the pump is spun until the user submits it.

mod history;
mod interpreter;
mod magic;
mod readline;
mod splitter;
mod throttle;

pub use history::History;
pub use interpreter::{CallTip, CompletionOptions, Interpreter, InterpreterIo};
pub use magic::{magic, magic_single};
pub use readline::{EventPump, NoPump, PumpStatus, ReadlineContext, ScriptedPump};
pub use splitter::{
    LineContinuation, SplitResult, SyntaxFailure, break_into_commands, continuations, is_complete,
};
pub use throttle::RefreshThrottle;

use std::path::Path;

use crate::clipboard::{Clipboard, strip_prompts};
use crate::codec::FormatVersion;
use crate::edit::Editor;
use crate::error::{Error, Result};
use crate::event::{LogLevel, READLINE_BEGIN, READLINE_END, emit_event, emit_log};
use crate::intro;
use crate::journal::Coalesce;
use crate::marker::{IoKind, MarkerSet, allowed_adjacency};
use crate::options::{ShellMode, ShellOptions};
use crate::text::{RopeBuffer, TextBuffer, fix_line_endings};

/// Script lines starting with this run without being echoed.
const QUIET_PREFIX: &str = "shell.";

/// Help offered after a keystroke.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Assist {
    /// Completion candidates for the text before the caret.
    Completions(Vec<String>),
    CallTip(CallTip),
}

/// Where the running command's output goes.
#[derive(Clone, Copy, Debug)]
struct OutputCursor {
    /// First line of the output slice.
    start: usize,
    /// Line the next write appends to.
    line: usize,
    wrote: bool,
}

/// Stream endpoints for one run, writing into the document.
struct SessionIo<'a, B: TextBuffer, P: EventPump<B> + ?Sized> {
    editor: &'a mut Editor<B>,
    pump: &'a mut P,
    throttle: &'a mut RefreshThrottle,
    out: OutputCursor,
}

impl<B: TextBuffer, P: EventPump<B> + ?Sized> SessionIo<'_, B, P> {
    fn append(&mut self, text: &str) {
        let text = fix_line_endings(text);
        if text.is_empty() {
            return;
        }
        let doc = self.editor.document_mut();
        let first = self.out.line;
        let pos = doc.line_end(first);
        doc.raw_insert(pos, &text);
        self.out.line += text.matches('\n').count();
        doc.markers_mut().reflow(first, self.out.line + 1);
        self.out.wrote = true;
        if self.throttle.tick() {
            self.pump.refresh(self.editor.document());
        }
    }

    fn open_readline_line(&mut self) -> usize {
        let doc = self.editor.document_mut();
        if !doc.line_text(self.out.line).is_empty() {
            let pos = doc.line_end(self.out.line);
            doc.raw_insert(pos, "\n");
            self.out.line += 1;
        }
        let line = self.out.line;
        let markers = doc.markers_mut();
        markers.mark_io_start(line, IoKind::Input);
        markers.add(line, MarkerSet::READLINE);
        markers.reflow(line, line + 1);
        line
    }

    /// Retype the answered readline line as output and open a fresh output line below it.
    fn close_readline_line(&mut self, line: usize) {
        let doc = self.editor.document_mut();
        let markers = doc.markers_mut();
        markers.remove(line, MarkerSet::READLINE);
        if line == self.out.start {
            markers.mark_io_start(line, IoKind::Output);
        } else {
            markers.mark_continuation(line, IoKind::Output);
        }
        let pos = doc.line_end(line);
        doc.raw_insert(pos, "\n");
        doc.markers_mut().reflow(line, line + 2);
        self.out.line = line + 1;
        self.out.wrote = true;
    }

    /// Drop the output slice if nothing was written, else its trailing empty line.
    fn close_output(&mut self) {
        let doc = self.editor.document_mut();
        let out = self.out;
        if !out.wrote {
            let start = doc.line_end(out.start - 1);
            let end = doc.line_end(out.start);
            doc.raw_remove(start, end);
        } else if out.line > out.start && doc.line_text(out.line).is_empty() {
            let start = doc.line_end(out.line - 1);
            let end = doc.line_end(out.line);
            doc.raw_remove(start, end);
        }
        doc.markers_mut().reflow(out.start - 1, out.line + 1);
    }
}

impl<B: TextBuffer, P: EventPump<B> + ?Sized> InterpreterIo for SessionIo<'_, B, P> {
    fn write_out(&mut self, text: &str) {
        self.append(text);
    }

    fn write_err(&mut self, text: &str) {
        self.append(text);
    }

    fn write_in(&mut self, text: &str) {
        self.append(text);
    }

    fn readline(&mut self) -> String {
        let line = self.open_readline_line();
        emit_log(LogLevel::Debug, &format!("readline waiting on line {line}"));
        emit_event(READLINE_BEGIN, "");
        self.pump.refresh(self.editor.document());
        let input = readline::wait_for_line(&mut *self.editor, &mut *self.pump, line);
        self.close_readline_line(line);
        emit_event(READLINE_END, input.trim_end_matches('\n'));
        input
    }
}

/// An interactive slice shell bound to one interpreter.
pub struct ShellSession<I: Interpreter, B: TextBuffer = RopeBuffer> {
    editor: Editor<B>,
    interpreter: I,
    pump: Box<dyn EventPump<B>>,
    options: ShellOptions,
    history: History,
    clipboard: Clipboard,
    throttle: RefreshThrottle,
    more: bool,
}

impl<I: Interpreter> ShellSession<I, RopeBuffer> {
    /// A session over an empty in-memory document, with no interactive input.
    pub fn new(interpreter: I, options: ShellOptions) -> Self {
        Self::with_editor(interpreter, options, Editor::new())
    }
}

impl<I: Interpreter, B: TextBuffer + 'static> ShellSession<I, B> {
    pub fn with_editor(interpreter: I, options: ShellOptions, mut editor: Editor<B>) -> Self {
        editor.set_max_journal_depth(options.max_journal_depth);
        let throttle = RefreshThrottle::new(options.print_update_interval());
        Self {
            editor,
            interpreter,
            pump: Box::new(NoPump),
            options,
            history: History::new(),
            clipboard: Clipboard::new(),
            throttle,
            more: false,
        }
    }

    /// Use `pump` to serve readline requests and refreshes.
    #[must_use]
    pub fn with_pump(mut self, pump: impl EventPump<B> + 'static) -> Self {
        self.pump = Box::new(pump);
        self
    }

    pub fn set_pump(&mut self, pump: Box<dyn EventPump<B>>) -> Box<dyn EventPump<B>> {
        std::mem::replace(&mut self.pump, pump)
    }

    #[must_use]
    pub fn editor(&self) -> &Editor<B> {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor<B> {
        &mut self.editor
    }

    #[must_use]
    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut I {
        &mut self.interpreter
    }

    #[must_use]
    pub fn options(&self) -> &ShellOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ShellOptions) {
        self.editor.set_max_journal_depth(options.max_journal_depth);
        self.throttle.set_interval(options.print_update_interval());
        self.options = options;
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut Clipboard {
        &mut self.clipboard
    }

    /// Whether the interpreter is waiting for the rest of a compound statement.
    #[must_use]
    pub fn is_more(&self) -> bool {
        self.more
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.editor.is_modified()
    }

    /// Show the intro banner and tutorial, then run the startup script.
    pub fn startup(&mut self) -> Result<()> {
        let banner = self.interpreter.intro_text();
        let layout = intro::startup_layout(&banner, self.options.show_tutorial)?;
        self.editor.load_layout(&layout);
        if self.options.exec_startup_script {
            if let Some(script) = self.interpreter.startup_script() {
                self.run(&script)?;
            }
        }
        self.editor.clear_journal();
        self.editor.mark_saved();
        emit_log(LogLevel::Info, "session started");
        Ok(())
    }

    /// Run the input slice under the caret.
    pub fn run_current(&mut self) -> Result<()> {
        let line = self.editor.document().caret_line();
        self.run_slice(line)
    }

    /// Run the input I/O-slice containing `line`.
    pub fn run_slice(&mut self, line: usize) -> Result<()> {
        self.run_slice_as(line, true)
    }

    fn run_slice_as(&mut self, line: usize, record_history: bool) -> Result<()> {
        if let Some(readline) = self.editor.readline_line() {
            return Err(Error::ReadOnlyRegion { line: readline });
        }
        let doc = self.editor.document();
        if line > doc.last_line() || doc.kind_of(line) != IoKind::Input {
            return Err(Error::ReadOnlyRegion { line });
        }
        let input = doc.io_slice(line);
        self.editor.delete_outputs_after(input.end)?;

        let doc = self.editor.document();
        let original = (input.start..=input.end)
            .map(|l| doc.line_text(l).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        let command = if self.options.use_magic {
            magic(&original)
        } else {
            original.clone()
        };
        emit_log(
            LogLevel::Info,
            &format!("running lines {}..={}", input.start, input.end),
        );

        let out = self.open_output(input.end);
        let syntax_line = self.push_command(&command, out);
        self.throttle.reset();

        self.pump.refresh(self.editor.document());
        if record_history && !self.more {
            self.history.add(original.trim_end());
        }
        self.finish_run(input.start, syntax_line.map(|l| input.start + l))
    }

    fn open_output(&mut self, input_end: usize) -> OutputCursor {
        let doc = self.editor.document_mut();
        let pos = doc.line_end(input_end);
        doc.raw_insert(pos, "\n");
        doc.markers_mut().mark_io_start(input_end + 1, IoKind::Output);
        doc.markers_mut().reflow(input_end, input_end + 1);
        OutputCursor {
            start: input_end + 1,
            line: input_end + 1,
            wrote: false,
        }
    }

    /// Push every statement of `command`. Returns the offending line on a syntax failure.
    fn push_command(&mut self, command: &str, out: OutputCursor) -> Option<usize> {
        let Self {
            editor,
            interpreter,
            pump,
            throttle,
            more,
            ..
        } = &mut *self;
        throttle.reset();
        let mut io = SessionIo {
            editor,
            pump: pump.as_mut(),
            throttle,
            out,
        };
        *more = false;
        let failure = match break_into_commands(command) {
            SplitResult::SyntaxFailure { line } => {
                let text = command.split('\n').nth(line).unwrap_or_default();
                io.write_err(&format!(
                    "  File \"<input>\", line {}\n    {text}\n    ^\nSyntaxError: invalid syntax\n",
                    line + 1
                ));
                emit_log(LogLevel::Info, &format!("syntax error on line {}", line + 1));
                Some(line)
            }
            SplitResult::Ok(statements) => {
                for statement in &statements {
                    *more = interpreter.push(&format!("{statement}\n"), &mut io);
                }
                if *more {
                    *more = interpreter.push("\n", &mut io);
                }
                None
            }
        };
        io.close_output();
        failure
    }

    /// Place the next prompt, then check the markers and drop the journal.
    fn finish_run(&mut self, input_start: usize, syntax_line: Option<usize>) -> Result<()> {
        let doc = self.editor.document_mut();
        let grouping = doc.grouping_slice(input_start);
        if grouping.end == doc.last_line() {
            let end = doc.len_chars();
            doc.raw_insert(end, "\n");
            let line = doc.last_line();
            doc.markers_mut().mark_grouping_start(line, IoKind::Input);
            doc.markers_mut().reflow(line, line);
            let caret = doc.len_chars();
            doc.set_caret(caret);
        } else {
            let caret = doc.line_end(grouping.end + 1);
            doc.set_caret(caret);
        }
        if let Some(line) = syntax_line {
            let caret = doc.line_end(line);
            doc.set_caret(caret);
        }

        self.settle_markers()
    }

    fn settle_markers(&mut self) -> Result<()> {
        self.editor.restore_first_marker();
        if let Err(e) = self.editor.validate() {
            emit_log(LogLevel::Warn, &format!("{e} after run; repairing"));
            self.editor.clean_all_markers()?;
        }
        self.editor.clear_journal();
        self.editor.mark_modified();
        Ok(())
    }

    /// The return gesture.
    ///
    /// In [`ShellMode::Slices`] it always breaks the line. In
    /// [`ShellMode::Shell`] it runs the slice once the command is complete.
    pub fn on_return(&mut self) -> Result<()> {
        if self.options.mode == ShellMode::Shell {
            let doc = self.editor.document();
            let line = doc.caret_line();
            if doc.kind_of(line) == IoKind::Input && self.editor.readline_line().is_none() {
                let command = doc.range_text(doc.io_slice(line));
                if is_complete(&command) {
                    return self.run_slice(line);
                }
            }
        }
        self.editor.insert_line_break(self.options.auto_indent)
    }

    /// Run `command` in a fresh slice at the end of the document.
    pub fn run(&mut self, command: &str) -> Result<()> {
        let line = self.fresh_prompt_line();
        self.set_slice_text(line, command.trim_end());
        self.run_slice(line)
    }

    /// Run every line of the script at `path` as if typed at one prompt.
    ///
    /// Lines starting with `shell.` run quietly: the command is neither
    /// echoed nor added to the history, and any output it writes becomes a
    /// grouping of its own.
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fix_line_endings(&std::fs::read_to_string(path)?);
        emit_log(LogLevel::Info, &format!("running script {}", path.display()));
        let mut block = Vec::new();
        for line in text.lines() {
            if line.starts_with(QUIET_PREFIX) {
                self.run_block(&block.join("\n"))?;
                block.clear();
                self.run_quiet(line)?;
            } else {
                block.push(line);
            }
        }
        self.run_block(&block.join("\n"))
    }

    /// Run each statement of `text` in its own grouping.
    fn run_block(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let statements = match break_into_commands(text) {
            SplitResult::Ok(statements) => statements,
            SplitResult::SyntaxFailure { .. } => vec![text.to_string()],
        };
        for statement in statements.iter().filter(|s| !s.trim().is_empty()) {
            self.run(statement)?;
        }
        Ok(())
    }

    fn run_quiet(&mut self, command: &str) -> Result<()> {
        let line = self.fresh_prompt_line();
        self.set_slice_text(line, command.trim_end());
        self.run_slice_as(line, false)?;

        let doc = self.editor.document();
        let input = doc.io_slice(line);
        let has_output =
            input.end < doc.last_line() && doc.kind_of(input.end + 1) == IoKind::Output;
        // An output grouping cannot follow every grouping end; the command stays visible there.
        if has_output
            && input.start > 0
            && !allowed_adjacency(
                doc.markers_of(input.start - 1),
                MarkerSet::grouping_start(IoKind::Output),
            )
        {
            emit_log(LogLevel::Debug, &format!("quiet command kept on line {}", input.start));
            return Ok(());
        }

        let doc = self.editor.document_mut();
        doc.raw_remove_lines(input.start, input.end);
        if has_output {
            doc.markers_mut().mark_grouping_start(input.start, IoKind::Output);
        }
        doc.markers_mut().reflow(input.start, input.start + 1);
        self.settle_markers()
    }

    /// Delete the whole session, leaving one empty prompt.
    pub fn clear(&mut self) {
        self.more = false;
        self.editor.clear_all();
    }

    /// Replace the current command with `text` and run it statement by statement.
    ///
    /// Each statement after the first gets its own grouping.
    pub fn execute(&mut self, text: &str) -> Result<()> {
        let text = strip_prompts(&fix_line_endings(text));
        let statements = match break_into_commands(&text) {
            SplitResult::Ok(statements) => statements,
            SplitResult::SyntaxFailure { .. } => vec![text],
        };
        let mut line = self.prepare_prompt();
        for (i, statement) in statements.iter().enumerate() {
            if i > 0 {
                line = self.insert_grouping_after(line);
            }
            self.set_slice_text(line, statement.trim_end());
            self.run_slice(line)?;
        }
        Ok(())
    }

    /// Run the text clipboard.
    pub fn paste_and_run(&mut self) -> Result<bool> {
        let Some(text) = self.clipboard.text().map(str::to_string) else {
            return Ok(false);
        };
        self.execute(&text)?;
        Ok(true)
    }

    /// Empty the input slice under the caret, or open a fresh one at the end.
    fn prepare_prompt(&mut self) -> usize {
        let doc = self.editor.document();
        let line = doc.caret_line();
        if doc.kind_of(line) != IoKind::Input {
            return self.fresh_prompt_line();
        }
        let io = doc.io_slice(line);
        let start = doc.line_start(io.start);
        let end = doc.line_end(io.end);
        let doc = self.editor.document_mut();
        doc.raw_remove(start, end);
        doc.markers_mut().reflow(io.start, io.start);
        io.start
    }

    /// The last line if it is an empty prompt, else a new grouping after it.
    fn fresh_prompt_line(&mut self) -> usize {
        let doc = self.editor.document();
        let last = doc.last_line();
        let m = doc.markers_of(last);
        if m.is_grouping_start() && m.is_input() && doc.line_text(last).is_empty() {
            return last;
        }
        self.insert_grouping_after(last)
    }

    fn insert_grouping_after(&mut self, line: usize) -> usize {
        let doc = self.editor.document_mut();
        let end = doc.grouping_slice(line).end;
        let pos = doc.line_end(end);
        doc.raw_insert(pos, "\n");
        doc.markers_mut().mark_grouping_start(end + 1, IoKind::Input);
        doc.markers_mut().reflow(end, end + 1);
        end + 1
    }

    fn set_slice_text(&mut self, line: usize, text: &str) {
        let doc = self.editor.document_mut();
        let pos = doc.line_end(line);
        doc.raw_insert(pos, text);
        let last = line + text.matches('\n').count();
        doc.markers_mut().reflow(line, last + 1);
    }

    /// Type at the caret and offer completions or a call tip.
    ///
    /// Completions follow an autocomplete key; a call tip follows `(`.
    pub fn type_text(&mut self, text: &str) -> Result<Option<Assist>> {
        self.editor.type_text(text)?;
        if text == "(" && self.options.auto_call_tip {
            return Ok(self.call_tip(false)?.map(Assist::CallTip));
        }
        let mut chars = text.chars();
        if let (Some(key), None) = (chars.next(), chars.next()) {
            if self.options.auto_complete && self.interpreter.autocomplete_keys().contains(&key) {
                let items = self.completions();
                if !items.is_empty() {
                    return Ok(Some(Assist::Completions(items)));
                }
            }
        }
        Ok(None)
    }

    fn command_before_caret(&self) -> String {
        let doc = self.editor.document();
        let caret = doc.caret();
        doc.text_range(doc.line_start(doc.caret_line()), caret)
    }

    /// Completion candidates for the text before the caret.
    #[must_use]
    pub fn completions(&self) -> Vec<String> {
        let options = CompletionOptions {
            include_magic: self.options.auto_complete_include_magic,
            include_single: self.options.auto_complete_include_single,
            include_double: self.options.auto_complete_include_double,
        };
        self.interpreter
            .autocomplete_list(&self.command_before_caret(), &options)
    }

    /// Complete the word of `prefix_len` characters before the caret.
    ///
    /// When `completion` extends the typed prefix only the missing part is
    /// inserted, as a single undo record.
    pub fn accept_completion(&mut self, prefix_len: usize, completion: &str) -> Result<()> {
        let doc = self.editor.document();
        let caret = doc.caret();
        let start = caret
            .saturating_sub(prefix_len)
            .max(doc.line_start(doc.caret_line()));
        let typed = doc.text_range(start, caret);
        let end = if let Some(rest) = completion.strip_prefix(typed.as_str()) {
            self.editor.insert(caret, rest, Coalesce::Never)?
        } else {
            self.editor.delete(start, caret)?;
            self.editor.insert(start, completion, Coalesce::Never)?
        };
        self.editor.set_caret(end);
        Ok(())
    }

    /// Ask the interpreter for a call tip for the callable before the caret.
    ///
    /// With call-tip insertion on, the argument list and a closing `)` are
    /// inserted after the caret as one undo record and left selected.
    pub fn call_tip(&mut self, force: bool) -> Result<Option<CallTip>> {
        if !force && !self.options.auto_call_tip {
            return Ok(None);
        }
        let command = self.command_before_caret();
        let command = command.strip_suffix('(').unwrap_or(&command);
        let Some(tip) = self.interpreter.call_tip(command) else {
            return Ok(None);
        };
        if !tip.argspec.is_empty() && self.options.call_tip_insert {
            let caret = self.editor.document().caret();
            let end = self
                .editor
                .insert(caret, &format!("{})", tip.argspec), Coalesce::Never)?;
            self.editor.set_selection(caret, end);
        }
        Ok(Some(tip))
    }

    pub fn history_prev(&mut self) -> Result<bool> {
        self.editor.history_replace(&mut self.history, 1)
    }

    pub fn history_next(&mut self) -> Result<bool> {
        self.editor.history_replace(&mut self.history, -1)
    }

    /// Insert an older (`step > 0`) or newer history entry at the caret.
    pub fn history_insert(&mut self, step: isize) -> Result<bool> {
        self.editor.history_insert(&mut self.history, step)
    }

    pub fn history_search(&mut self) -> Result<bool> {
        self.editor.history_search(&mut self.history)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    #[must_use]
    pub fn history_words(&self) -> Vec<String> {
        self.history.words()
    }

    pub fn copy(&mut self) -> bool {
        self.editor.copy(&mut self.clipboard)
    }

    pub fn cut(&mut self) -> Result<bool> {
        self.editor.cut(&mut self.clipboard)
    }

    pub fn paste(&mut self) -> Result<bool> {
        self.editor.paste(&self.clipboard)
    }

    pub fn copy_with_prompts(&mut self) -> bool {
        self.editor.copy_with_prompts(&mut self.clipboard)
    }

    pub fn copy_with_prompts_prefixed(&mut self) -> bool {
        self.editor.copy_with_prompts_prefixed(&mut self.clipboard)
    }

    pub fn copy_selected_slices(&mut self) -> bool {
        self.editor.copy_selected_slices(&mut self.clipboard)
    }

    pub fn cut_selected_slices(&mut self) -> Result<bool> {
        self.editor.cut_selected_slices(&mut self.clipboard)
    }

    pub fn paste_slices(&mut self) -> Result<bool> {
        self.editor.paste_slices(&self.clipboard)
    }

    /// Save the session to `path` and mark it unmodified.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.editor.save_session_file(path)
    }

    /// Replace the document with the session stored at `path`.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<FormatVersion> {
        self.more = false;
        self.editor.load_session_file(path)
    }

    /// Append a script file as a new input grouping after the current one.
    pub fn load_file_as_slice(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let text = std::fs::read_to_string(path)?;
        self.editor.load_file_as_slice(&text)
    }
}
