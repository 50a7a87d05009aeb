//! Shell configuration.
//!
//! [`ShellOptions`] holds every user preference the core consults. Options
//! are stored as JSON; unknown keys are ignored and missing keys fall back to
//! their defaults, so option files written by older versions keep loading.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How the return gesture behaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellMode {
    /// Return inserts a line break; running a slice is a separate gesture.
    #[default]
    Slices,
    /// Return runs the slice once the command is complete, like a classic REPL.
    Shell,
}

/// Shell preferences.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellOptions {
    /// Return-key behavior.
    pub mode: ShellMode,
    /// Rewrite shell-like commands (`ls`, `?name`, `!cmd`) before execution.
    pub use_magic: bool,
    /// Minimum seconds between host refreshes while a command writes output.
    pub print_update_max_secs: f64,
    /// Maximum number of undo records kept.
    pub max_journal_depth: usize,
    /// Offer completions after an autocomplete key is typed.
    pub auto_complete: bool,
    /// Include magic commands in completion lists.
    pub auto_complete_include_magic: bool,
    /// Include `_single` underscore names in completion lists.
    pub auto_complete_include_single: bool,
    /// Include `__double` underscore names in completion lists.
    pub auto_complete_include_double: bool,
    /// Offer a call tip after `(` is typed.
    pub auto_call_tip: bool,
    /// Insert the call tip arguments into the slice.
    pub call_tip_insert: bool,
    /// Load the tutorial session at startup.
    pub show_tutorial: bool,
    /// Run the interpreter's startup script at startup.
    pub exec_startup_script: bool,
    /// Indent new lines to match the line above.
    pub auto_indent: bool,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            mode: ShellMode::Slices,
            use_magic: true,
            print_update_max_secs: 2.0,
            max_journal_depth: 1000,
            auto_complete: true,
            auto_complete_include_magic: true,
            auto_complete_include_single: true,
            auto_complete_include_double: true,
            auto_call_tip: true,
            call_tip_insert: true,
            show_tutorial: false,
            exec_startup_script: true,
            auto_indent: true,
        }
    }
}

impl ShellOptions {
    /// Parse options from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize options as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read options from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Write options to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Refresh interval for output written during execution.
    #[must_use]
    pub fn print_update_interval(&self) -> Duration {
        Duration::from_secs_f64(self.print_update_max_secs.max(0.0))
    }
}
