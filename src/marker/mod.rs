//! Line markers: the structural layer of a slice document.
//!
//! Every line carries a [`MarkerSet`] with exactly one grouping marker and
//! one I/O marker, plus optional flags:
//!
//! - [`MarkerSet`]: the bitset and its axis helpers
//! - [`MarkerStore`]: the array of sets kept parallel to the text lines
//! - [`allowed_adjacency`]: the table of legal line-to-line transitions
//!
//! # Examples
//!
//! ```
//! use sliceshell::marker::{IoKind, MarkerSet, allowed_adjacency};
//!
//! let input = MarkerSet::grouping_start(IoKind::Input);
//! let output = MarkerSet::GROUP_END | MarkerSet::OUTPUT_START;
//! assert!(allowed_adjacency(input, output));
//! assert!(!allowed_adjacency(input, MarkerSet::grouping_start(IoKind::Output)));
//! ```

mod adjacency;
mod set;
mod store;

pub use adjacency::{Composite, allowed_adjacency};
pub use set::{Grouping, IoKind, IoRole, MarkerSet};
pub use store::{MarkerSnapshot, MarkerStore};
