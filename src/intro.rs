//! Startup document: intro banner, optional tutorial and the first prompt.

use crate::codec::{self, SessionLayout};
use crate::error::Result;
use crate::marker::IoKind;

/// Session shown on startup when the tutorial is enabled.
pub const TUTORIAL: &str = include_str!("../resources/tutorial.pyslices");

/// The tutorial session, parsed by the regular loader.
pub fn tutorial() -> Result<SessionLayout> {
    codec::parse(TUTORIAL).map(|parsed| parsed.layout)
}

/// Banner output (if any), the tutorial (if wanted), then an empty prompt.
pub fn startup_layout(banner: &str, show_tutorial: bool) -> Result<SessionLayout> {
    let mut layout = SessionLayout::new();
    let banner = banner.trim_end_matches('\n');
    if !banner.is_empty() {
        layout = layout.grouping(IoKind::Output, banner);
    }
    if show_tutorial {
        layout = layout.append(tutorial()?);
    }
    Ok(layout.grouping(IoKind::Input, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tutorial_is_a_valid_session() {
        let layout = tutorial().unwrap();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.grouping_starts().len(), 4);
        assert!(layout.lines().iter().any(|l| l == "print a * b"));
    }

    #[test]
    fn startup_without_tutorial() {
        let layout = startup_layout("Python 2.7\nType help\n", false).unwrap();
        assert_eq!(layout.text(), "Python 2.7\nType help\n");
        assert_eq!(layout.grouping_starts(), vec![0, 2]);
        let doc = layout.to_document();
        assert_eq!(doc.kind_of(1), IoKind::Output);
        assert_eq!(doc.kind_of(2), IoKind::Input);
    }

    #[test]
    fn startup_with_tutorial_ends_in_prompt() {
        let layout = startup_layout("", true).unwrap();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.lines().last().map(String::as_str), Some(""));
        assert_eq!(layout.grouping_starts()[0], 0);
        assert_eq!(layout.grouping_starts().len(), 5);
    }
}
