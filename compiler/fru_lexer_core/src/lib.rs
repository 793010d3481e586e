//! Low-level source access for the Frugurt parsing engine.
//!
//! This crate owns the byte-level view of a document:
//!
//! - [`SourceBuffer`] copies the text into a sentinel-terminated buffer and
//!   indexes line starts once, so points can be computed in O(log n).
//! - [`Cursor`] is a `Copy` byte cursor handed to external scanners. Copying
//!   it is the checkpoint mechanism for speculative scanning.
//! - [`Point`] is a row/column pair with the extent arithmetic that the tree
//!   layer uses to store positions relative to a parent.
//!
//! Nothing here knows about grammars or trees.

mod cursor;
mod position;
mod source_buffer;

pub use cursor::Cursor;
pub use position::{LineIndex, Point};
pub use source_buffer::SourceBuffer;
