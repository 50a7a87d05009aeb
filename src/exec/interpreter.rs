//! The interpreter capability the shell drives.

/// Stream endpoints handed to the interpreter for the duration of one push.
///
/// Everything written lands in the output region of the running slice
/// before the write call returns.
pub trait InterpreterIo {
    /// Standard output.
    fn write_out(&mut self, text: &str);

    /// Standard error.
    fn write_err(&mut self, text: &str);

    /// Echo of user-supplied text. It is shown in the output region too.
    fn write_in(&mut self, text: &str);

    /// Block until the user submits a line.
    ///
    /// Returns the line with a trailing `\n`, or an empty string when the
    /// user cancelled.
    fn readline(&mut self) -> String;

    /// Read lines until an empty one (or a cancel).
    fn readlines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let line = self.readline();
            let done = line.is_empty() || line == "\n";
            lines.push(line);
            if done {
                return lines;
            }
        }
    }

    /// Show `prompt`, then read one line without its trailing newline.
    fn raw_input(&mut self, prompt: &str) -> String {
        if !prompt.is_empty() {
            self.write_out(prompt);
        }
        let mut line = self.readline();
        if line.ends_with('\n') {
            line.pop();
        }
        line
    }
}

/// Which names a completion list should include.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletionOptions {
    pub include_magic: bool,
    pub include_single: bool,
    pub include_double: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            include_magic: true,
            include_single: true,
            include_double: true,
        }
    }
}

/// Call tip for the callable before the caret.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallTip {
    pub name: String,
    /// Argument list, inserted after `(` when call-tip insertion is on.
    pub argspec: String,
    pub tip: String,
}

/// An interpreter the shell can push commands to.
pub trait Interpreter {
    /// Execute `source`, which ends with a newline.
    ///
    /// Returns `true` when the interpreter needs more lines to complete a
    /// compound statement. Errors raised by the code are reported through
    /// `io.write_err` and are not returned.
    fn push(&mut self, source: &str, io: &mut dyn InterpreterIo) -> bool;

    /// Banner shown at startup.
    fn intro_text(&self) -> String {
        String::new()
    }

    /// Completions for the expression `command`.
    fn autocomplete_list(&self, _command: &str, _options: &CompletionOptions) -> Vec<String> {
        Vec::new()
    }

    /// Characters after which completions are offered.
    fn autocomplete_keys(&self) -> Vec<char> {
        vec!['.']
    }

    fn call_tip(&self, _command: &str) -> Option<CallTip> {
        None
    }

    /// Source to run once before the first prompt.
    fn startup_script(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Scripted {
        out: String,
        answers: VecDeque<String>,
    }

    impl InterpreterIo for Scripted {
        fn write_out(&mut self, text: &str) {
            self.out.push_str(text);
        }

        fn write_err(&mut self, text: &str) {
            self.out.push_str(text);
        }

        fn write_in(&mut self, text: &str) {
            self.out.push_str(text);
        }

        fn readline(&mut self) -> String {
            self.answers.pop_front().unwrap_or_default()
        }
    }

    #[test]
    fn raw_input_writes_prompt_and_strips_newline() {
        let mut io = Scripted {
            answers: VecDeque::from(vec!["hello\n".to_string()]),
            ..Scripted::default()
        };
        assert_eq!(io.raw_input("> "), "hello");
        assert_eq!(io.out, "> ");
    }

    #[test]
    fn readlines_stops_at_blank_line() {
        let mut io = Scripted {
            answers: VecDeque::from(vec!["a\n".into(), "b\n".into(), "\n".into(), "c\n".into()]),
            ..Scripted::default()
        };
        assert_eq!(io.readlines(), vec!["a\n", "b\n", "\n"]);
    }

    #[test]
    fn readlines_stops_on_cancel() {
        let mut io = Scripted::default();
        assert_eq!(io.readlines(), vec![String::new()]);
    }
}
