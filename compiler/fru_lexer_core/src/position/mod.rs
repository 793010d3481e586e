//! Row/column positions.
//!
//! A [`Point`] is used two ways: as an absolute position in a document, and
//! as an *extent* (the row/column distance covered by a span of text). Green
//! syntax nodes store extents so that their positions stay valid when text
//! before them is edited; absolute points are recovered by adding extents
//! with [`Point::add_extent`].

use std::fmt;

/// A zero-based row and byte column.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub const ZERO: Point = Point { row: 0, column: 0 };

    #[inline]
    pub const fn new(row: u32, column: u32) -> Self {
        Point { row, column }
    }

    /// Position reached by starting at `self` and covering `extent`.
    ///
    /// If the extent spans rows, the column restarts at the extent's column.
    #[inline]
    #[must_use]
    pub const fn add_extent(self, extent: Point) -> Point {
        if extent.row > 0 {
            Point::new(self.row + extent.row, extent.column)
        } else {
            Point::new(self.row, self.column + extent.column)
        }
    }

    /// Extent covered between `start` and `self` (`self >= start`).
    ///
    /// Saturates to zero if `start` is after `self`.
    #[inline]
    #[must_use]
    pub fn extent_from(self, start: Point) -> Point {
        if self.row > start.row {
            Point::new(self.row - start.row, self.column)
        } else if self.row == start.row {
            Point::new(0, self.column.saturating_sub(start.column))
        } else {
            Point::ZERO
        }
    }

    /// Extent of a run of bytes.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "callers pass slices of a source whose length fits in u32"
    )]
    pub fn extent_of(bytes: &[u8]) -> Point {
        let rows = memchr::memchr_iter(b'\n', bytes).count() as u32;
        let column = match memchr::memrchr(b'\n', bytes) {
            Some(nl) => (bytes.len() - nl - 1) as u32,
            None => bytes.len() as u32,
        };
        Point::new(rows, column)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// Line-start table for byte offset → [`Point`] conversion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset at which each line starts. Always contains `0`.
    starts: Vec<u32>,
}

impl LineIndex {
    /// Index the line starts of `source`.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "SourceBuffer truncates sources to u32::MAX bytes"
    )]
    pub fn new(source: &[u8]) -> Self {
        let mut starts = Vec::with_capacity(source.len() / 32 + 1);
        starts.push(0);
        starts.extend(memchr::memchr_iter(b'\n', source).map(|nl| nl as u32 + 1));
        LineIndex { starts }
    }

    /// Number of lines (a trailing newline starts an empty last line).
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Byte offset where `row` starts, if it exists.
    pub fn line_start(&self, row: u32) -> Option<u32> {
        self.starts.get(row as usize).copied()
    }

    /// Point for a byte offset. O(log lines).
    #[allow(
        clippy::cast_possible_truncation,
        reason = "row index is bounded by the number of lines in a u32-sized source"
    )]
    pub fn point_at(&self, offset: u32) -> Point {
        let row = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        Point::new(row as u32, offset - self.starts[row])
    }
}
