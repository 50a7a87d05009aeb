//! Shorthand rewriting applied to commands before they are pushed.
//!
//! | typed          | pushed            |
//! |----------------|-------------------|
//! | `?x`           | `help(x)`         |
//! | `!cmd`         | `sx("cmd")`       |
//! | `ls`, `pwd`    | `ls()`, `pwd()`   |
//! | `cd path`      | `cd("path")`      |
//! | `close all`    | `close("all")`    |
//! | `name arg ...` | `name(arg ...)`   |

use super::splitter::continuations;

const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "break", "class", "continue", "def", "del", "elif", "else", "except",
    "exec", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda", "not", "or",
    "pass", "print", "raise", "return", "try", "while", "with", "yield", "None", "True", "False",
    "nonlocal", "async", "await",
];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Rewrite one top-level line.
#[must_use]
pub fn magic_single(command: &str) -> String {
    let Some(first) = command.chars().next() else {
        return String::new();
    };
    if first == ' ' {
        return command.to_string();
    }
    if let Some(rest) = command.strip_prefix('?') {
        return format!("help({rest})");
    }
    if let Some(rest) = command.strip_prefix('!') {
        return format!("sx(\"{rest}\")");
    }
    if command == "ls" || command == "pwd" {
        return format!("{command}()");
    }
    if let Some(rest) = command.strip_prefix("ls ").or_else(|| command.strip_prefix("cd ")) {
        return format!("{}(\"{rest}\")", &command[..2]);
    }
    if let Some(rest) = command.strip_prefix("close ") {
        return if rest.trim() == "all" {
            "close(\"all\")".to_string()
        } else {
            format!("close({rest})")
        };
    }
    call_shorthand(command).unwrap_or_else(|| command.to_string())
}

/// `name arg ...` becomes `name(arg ...)` when `name` is a dotted
/// identifier, neither word is a keyword, and the argument starts like an
/// expression.
fn call_shorthand(command: &str) -> Option<String> {
    let space = command.find(' ')?;
    let name = &command[..space];
    let arg_word = command[space..].split(' ').find(|w| !w.is_empty())?;

    let name_start = name.chars().next()?;
    let arg_start = arg_word.chars().next()?;
    let name_ok = (name_start.is_alphabetic() || name_start == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '_');
    let arg_ok = arg_start.is_alphanumeric() || matches!(arg_start, '.' | '"' | '\'' | '_');
    if name_ok && arg_ok && !is_keyword(name) && !is_keyword(arg_word) {
        Some(format!("{name}({})", &command[space + 1..]))
    } else {
        None
    }
}

/// Rewrite every line of `command` that does not continue the line above.
///
/// Text the scanner rejects is returned unchanged.
#[must_use]
pub fn magic(command: &str) -> String {
    let Ok(states) = continuations(command) else {
        return command.to_string();
    };
    command
        .split('\n')
        .enumerate()
        .map(|(j, line)| {
            if j == 0 || !states[j - 1].any() {
                magic_single(line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
