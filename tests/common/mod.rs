#![allow(dead_code)] // Each test binary uses a different subset
#![allow(clippy::nursery)] // Test infra prioritizes clarity over pedantry
#![allow(clippy::pedantic)] // Test infra prioritizes clarity over pedantry

use std::collections::HashMap;
use std::fmt;
use std::sync::Once;

use sliceshell::{Interpreter, InterpreterIo, LogLevel, ShellOptions, ShellSession};

/// Install a tracing subscriber and route the crate's log callback into it.
pub fn setup_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
        sliceshell::set_log_callback(|level, message| match level {
            LogLevel::Debug => tracing::debug!(target: "sliceshell", "{message}"),
            LogLevel::Info => tracing::info!(target: "sliceshell", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "sliceshell", "{message}"),
            LogLevel::Error => tracing::error!(target: "sliceshell", "{message}"),
        });
    });
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// A deterministic toy interpreter.
///
/// Understands `name = expr`, `print expr` and bare expressions, where an
/// expression is a `+`-separated list of integers, double-quoted strings,
/// names, or a single `raw_input("prompt")` call.
#[derive(Debug, Default)]
pub struct Calc {
    pub vars: HashMap<String, Value>,
    pub pushed: Vec<String>,
    pub inputs: Vec<String>,
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Calc {
    fn term(&self, term: &str) -> Result<Value, String> {
        if let Ok(n) = term.parse::<i64>() {
            return Ok(Value::Int(n));
        }
        if term.len() >= 2 && term.starts_with('"') && term.ends_with('"') {
            return Ok(Value::Str(term[1..term.len() - 1].to_string()));
        }
        self.vars
            .get(term)
            .cloned()
            .ok_or_else(|| format!("NameError: name '{term}' is not defined"))
    }

    fn eval(&mut self, expr: &str, io: &mut dyn InterpreterIo) -> Result<Value, String> {
        let expr = expr.trim();
        if let Some(rest) = expr.strip_prefix("raw_input(") {
            let prompt = rest.trim_end_matches(')').trim().trim_matches('"');
            let line = io.raw_input(prompt);
            self.inputs.push(line.clone());
            return Ok(Value::Str(line));
        }
        let mut total: Option<Value> = None;
        for term in expr.split('+') {
            let value = self.term(term.trim())?;
            total = Some(match (total, value) {
                (None, v) => v,
                (Some(Value::Int(a)), Value::Int(b)) => Value::Int(a + b),
                (Some(Value::Str(a)), Value::Str(b)) => Value::Str(a + &b),
                _ => return Err("TypeError: unsupported operand types for +".to_string()),
            });
        }
        total.ok_or_else(|| "SyntaxError: invalid syntax".to_string())
    }

    fn exec(&mut self, statement: &str, io: &mut dyn InterpreterIo) -> Result<Option<Value>, String> {
        if let Some(expr) = statement.strip_prefix("print ") {
            let value = self.eval(expr, io)?;
            io.write_out(&format!("{value}\n"));
            return Ok(None);
        }
        if let Some((name, expr)) = statement.split_once('=') {
            if is_identifier(name.trim()) {
                let value = self.eval(expr, io)?;
                self.vars.insert(name.trim().to_string(), value);
                return Ok(None);
            }
        }
        self.eval(statement, io).map(Some)
    }
}

impl Interpreter for Calc {
    fn push(&mut self, source: &str, io: &mut dyn InterpreterIo) -> bool {
        self.pushed.push(source.to_string());
        for line in source.lines() {
            let statement = line.trim();
            if statement.is_empty() {
                continue;
            }
            match self.exec(statement, io) {
                Ok(Some(Value::Str(s))) => io.write_out(&format!("'{s}'\n")),
                Ok(Some(value)) => io.write_out(&format!("{value}\n")),
                Ok(None) => {}
                Err(e) => io.write_err(&format!("Traceback (most recent call last):\n{e}\n")),
            }
        }
        false
    }

    fn intro_text(&self) -> String {
        "Calc 1.0\n".to_string()
    }
}

pub fn calc_session() -> ShellSession<Calc> {
    setup_test_logging();
    ShellSession::new(Calc::default(), ShellOptions::default())
}
