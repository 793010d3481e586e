//! The document being parsed, followed by a zero sentinel.
//!
//! The allocation is padded with zeros to a 64-byte multiple, so a
//! [`Cursor`] peeking just past the end reads zeros instead of leaving the
//! buffer. Construction also builds the [`LineIndex`] that turns token
//! offsets into [`Point`]s.

use crate::{Cursor, LineIndex, Point};

const ALIGN: usize = 64;

/// Owned source bytes plus sentinel padding and a line index.
///
/// ```text
/// [ source ... | 0x00 | 0x00 ... ]
///   0            len    padded to ALIGN
/// ```
#[derive(Clone, Debug)]
pub struct SourceBuffer {
    bytes: Vec<u8>,
    len: u32,
    lines: LineIndex,
}

const _: () = assert!(std::mem::size_of::<SourceBuffer>() <= 64);

impl SourceBuffer {
    /// Node ranges are 32-bit, so sources past `u32::MAX` bytes are cut
    /// there.
    pub fn new(source: &str) -> Self {
        Self::from_bytes(source.as_bytes())
    }

    /// Buffer arbitrary bytes. Callback-driven parsing may hand over chunks
    /// that split a UTF-8 sequence; bytes no token accepts become lex errors.
    pub fn from_bytes(source: &[u8]) -> Self {
        let len = u32::try_from(source.len()).unwrap_or(u32::MAX);
        let source = &source[..len as usize];

        let padded = (source.len() / ALIGN + 1) * ALIGN;
        let mut bytes = Vec::with_capacity(padded);
        bytes.extend_from_slice(source);
        bytes.resize(padded, 0);

        Self {
            bytes,
            len,
            lines: LineIndex::new(source),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&self.bytes, self.len)
    }

    /// A cursor at `pos`, clamped to the end of the source.
    pub fn cursor_at(&self, pos: u32) -> Cursor<'_> {
        self.cursor().with_pos(pos)
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    /// Row and column of `offset`, clamped to the end of the source.
    #[inline]
    pub fn point_at(&self, offset: u32) -> Point {
        self.lines.point_at(offset.min(self.len))
    }

    /// Source bytes in `start..end`, clamped to the source.
    pub fn slice(&self, start: u32, end: u32) -> &[u8] {
        let end = end.min(self.len) as usize;
        &self.bytes[(start as usize).min(end)..end]
    }

    #[cfg(test)]
    fn padded_len(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests;
