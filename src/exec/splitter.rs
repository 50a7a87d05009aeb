//! Splitting a block of source into separately pushed commands.
//!
//! A line-oriented scanner records, for every line, whether the next line
//! continues it lexically. A new command starts at any line that is not
//! blank, not indented, does not begin with `else`/`elif`/`except`/`finally`
//! and does not follow a continued line.

use crate::clipboard::strip_prompts;
use crate::text::fix_line_endings;

/// How a line carries over to the next one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineContinuation {
    /// Ends inside a string literal.
    pub string: bool,
    /// Ends with `:` outside brackets, opening an indented block.
    pub block: bool,
    /// Ends with a backslash outside strings.
    pub line: bool,
    /// Ends with unclosed brackets.
    pub paren: bool,
}

impl LineContinuation {
    /// Whether the next line must join this one.
    #[must_use]
    pub const fn joins_next(self) -> bool {
        self.string || self.line || self.paren
    }

    #[must_use]
    pub const fn any(self) -> bool {
        self.string || self.block || self.line || self.paren
    }
}

/// Text rejected by the scanner, with the 0-based line it failed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyntaxFailure {
    pub line: usize,
}

/// Outcome of splitting a block of source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitResult {
    Ok(Vec<String>),
    SyntaxFailure { line: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenString {
    quote: char,
    triple: bool,
}

/// Scan `text` line by line.
///
/// Fails on a closing bracket that does not match, and on a single-quoted
/// string left open at the end of a line without a backslash. Inside every
/// string, including triple-quoted ones, a backslash escapes the next
/// character, raw strings included; a backslash ending a line inside a
/// string continues the string, not the line.
pub fn continuations(text: &str) -> Result<Vec<LineContinuation>, SyntaxFailure> {
    let mut out = Vec::new();
    let mut open: Option<OpenString> = None;
    let mut brackets: Vec<char> = Vec::new();

    for (index, line) in text.split('\n').enumerate() {
        let chars: Vec<char> = line.chars().collect();
        let mut state = LineContinuation::default();
        let mut last_code: Option<char> = None;
        let mut escaped_eol = false;
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            if let Some(string) = open {
                if ch == '\\' {
                    escaped_eol = i + 1 == chars.len();
                    i += 2;
                    continue;
                }
                if ch == string.quote {
                    if !string.triple {
                        open = None;
                    } else if chars.get(i + 1) == Some(&ch) && chars.get(i + 2) == Some(&ch) {
                        open = None;
                        i += 2;
                    }
                }
                i += 1;
                continue;
            }

            match ch {
                '#' => break,
                '\'' | '"' => {
                    let triple = chars.get(i + 1) == Some(&ch) && chars.get(i + 2) == Some(&ch);
                    open = Some(OpenString { quote: ch, triple });
                    i += if triple { 3 } else { 1 };
                    last_code = Some(ch);
                    continue;
                }
                '(' | '[' | '{' => brackets.push(ch),
                ')' | ']' | '}' => {
                    let expected = match ch {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    if brackets.pop() != Some(expected) {
                        return Err(SyntaxFailure { line: index });
                    }
                }
                _ => {}
            }
            if !ch.is_whitespace() {
                last_code = Some(ch);
            }
            i += 1;
        }

        match open {
            Some(string) if !string.triple => {
                // Only an escaped newline lets a short string span lines.
                if escaped_eol {
                    state.string = true;
                } else {
                    return Err(SyntaxFailure { line: index });
                }
            }
            Some(_) => state.string = true,
            None => {
                state.line = last_code == Some('\\') && line.ends_with('\\');
                state.block = brackets.is_empty() && last_code == Some(':');
            }
        }
        state.paren = !brackets.is_empty();
        out.push(state);
    }
    Ok(out)
}

fn first_word(line: &str) -> &str {
    let trimmed = line.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_alphanumeric())
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

/// Split a block of source into commands that can be pushed one at a time.
pub fn break_into_commands(text: &str) -> SplitResult {
    let text = fix_line_endings(text);
    let text = strip_leading_prompt(&text);
    let states = match continuations(text) {
        Ok(states) => states,
        Err(failure) => return SplitResult::SyntaxFailure { line: failure.line },
    };

    let mut commands = Vec::new();
    let mut command = String::new();
    for (j, line) in text.split('\n').enumerate() {
        let continued = j > 0 && states[j - 1].joins_next();
        let joins = j > 0
            && (line.trim().is_empty()
                || line.trim_start().len() != line.len()
                || matches!(first_word(line), "else" | "elif" | "except" | "finally")
                || continued);
        if joins {
            command.push('\n');
            command.push_str(line);
        } else {
            if j > 0 {
                commands.push(std::mem::take(&mut command));
            }
            command.push_str(line);
        }
    }
    commands.push(command);
    SplitResult::Ok(commands)
}

fn strip_leading_prompt(text: &str) -> &str {
    text.strip_prefix(crate::clipboard::PS1)
        .or_else(|| text.strip_prefix(crate::clipboard::PS2))
        .unwrap_or(text)
}

/// Whether `text` is a complete command that can run on return.
///
/// Incomplete means: the last line continues lexically or opens a block,
/// or a multi-line command ends on an indented, non-blank line. Text the
/// scanner rejects counts as complete so the error is reported.
#[must_use]
pub fn is_complete(text: &str) -> bool {
    let text = strip_prompts(&fix_line_endings(text));
    let Ok(states) = continuations(&text) else {
        return true;
    };
    if states.last().is_some_and(|s| s.any()) {
        return false;
    }
    let last = text.rsplit('\n').next().unwrap_or_default();
    let multi = text.contains('\n');
    !(multi && !last.trim().is_empty() && last.starts_with([' ', '\t']))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(text: &str) -> Vec<String> {
        match break_into_commands(text) {
            SplitResult::Ok(commands) => commands,
            SplitResult::SyntaxFailure { line } => panic!("unexpected failure on line {line}"),
        }
    }

    #[test]
    fn top_level_lines_split() {
        assert_eq!(ok("a=1\nb=2\nprint a+b"), vec!["a=1", "b=2", "print a+b"]);
    }

    #[test]
    fn indented_and_clause_lines_join() {
        let text = "if x:\n    y = 1\nelse:\n    y = 2\nprint y";
        assert_eq!(ok(text), vec!["if x:\n    y = 1\nelse:\n    y = 2", "print y"]);
        let text = "try:\n  f()\nexcept E:\n  pass\nfinally:\n  g()";
        assert_eq!(ok(text).len(), 1);
    }

    #[test]
    fn blank_lines_stay_with_previous_command() {
        assert_eq!(ok("a=1\n\nb=2"), vec!["a=1\n", "b=2"]);
    }

    #[test]
    fn brackets_strings_and_backslashes_continue() {
        assert_eq!(ok("x = (1,\n2)\ny"), vec!["x = (1,\n2)", "y"]);
        assert_eq!(ok("s = '''a\nb'''\nt"), vec!["s = '''a\nb'''", "t"]);
        assert_eq!(ok("z = 1 + \\\n2"), vec!["z = 1 + \\\n2"]);
        assert_eq!(ok("s = 'a\\\nb'"), vec!["s = 'a\\\nb'"]);
    }

    #[test]
    fn comments_hide_brackets_and_quotes() {
        assert_eq!(ok("a = 1  # (don't\nb = 2"), vec!["a = 1  # (don't", "b = 2"]);
    }

    #[test]
    fn backslash_inside_triple_string_escapes() {
        let states = continuations("s = '''x\\'''\ny'''\nz").unwrap();
        assert!(states[0].string);
        assert!(!states[0].line);
        assert!(!states[1].string);
        let states = continuations("s = \"\"\"x\\\nmore\"\"\"").unwrap();
        assert!(states[0].string);
        assert!(!states[0].line);
    }

    #[test]
    fn prompts_are_stripped() {
        assert_eq!(ok(">>> a=1"), vec!["a=1"]);
    }

    #[test]
    fn syntax_failures_report_line() {
        assert_eq!(
            break_into_commands("a = 1\nb = (2]"),
            SplitResult::SyntaxFailure { line: 1 }
        );
        assert_eq!(break_into_commands("x = 'open"), SplitResult::SyntaxFailure { line: 0 });
        assert_eq!(break_into_commands(")"), SplitResult::SyntaxFailure { line: 0 });
    }

    #[test]
    fn doubled_backslash_does_not_continue_short_string() {
        assert_eq!(break_into_commands("s = 'a\\\\\nb'"), SplitResult::SyntaxFailure { line: 0 });
        assert_eq!(ok("s = r'a\\'b'"), vec!["s = r'a\\'b'"]);
    }

    #[test]
    fn completeness() {
        assert!(is_complete("a = 1"));
        assert!(!is_complete("if a:"));
        assert!(!is_complete("if a:\n    b = 1"));
        assert!(is_complete("if a:\n    b = 1\n"));
        assert!(!is_complete("f(1,"));
        assert!(is_complete("f(1,\n2)"));
        assert!(is_complete("x = )"));
    }
}
