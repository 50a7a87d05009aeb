//! Error types for the slice shell core.

use std::fmt;
use std::io;

/// Result type alias for slice shell operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for slice shell operations.
///
/// Syntax errors and interpreter exceptions are not represented here: both
/// are written into the document as output slices.
#[derive(Debug)]
pub enum Error {
    /// I/O error while reading or writing a session or options file.
    Io(io::Error),
    /// Options file could not be parsed or serialized.
    Config(serde_json::Error),
    /// Edit attempted inside an output slice or a locked readline region.
    ReadOnlyRegion { line: usize },
    /// Structural operation would place an illegal marker pair at `line - 1`/`line`.
    IllegalAdjacency { line: usize },
    /// Session file rejected by the loader.
    FileFormat { line: usize, reason: String },
    /// Marker state could not be repaired.
    CorruptMarkerState { line: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Config(e) => write!(f, "invalid options: {e}"),
            Self::ReadOnlyRegion { line } => write!(f, "line {line} is read-only"),
            Self::IllegalAdjacency { line } => {
                write!(f, "illegal slice layout between lines {} and {line}", line.saturating_sub(1))
            }
            Self::FileFormat { line, reason } => {
                write!(f, "invalid session file at line {}: {reason}", line + 1)
            }
            Self::CorruptMarkerState { line } => write!(f, "corrupt markers at line {line}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e)
    }
}

impl Error {
    /// Whether the host should signal a refused edit (beep) rather than report a failure.
    #[must_use]
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::ReadOnlyRegion { .. } | Self::IllegalAdjacency { .. })
    }
}
