//! Byte cursor handed to external scanners.
//!
//! Reads past the end of the source return `0x00`, so scanners can look
//! ahead without bounds checks. End of input is decided by position, not by
//! the byte value: a NUL inside the source is ordinary content.
//!
//! The cursor is [`Copy`]. A scanner that wants to try a match speculatively
//! copies it, scans the copy, and keeps it only on success.
//!
//! A cursor can carry a shared high-water mark (see [`Cursor::track_reach`]).
//! Every read raises it to the end of the bytes read, copies included, so
//! the lexer learns how far a scanner looked even when the scan failed.

use std::cell::Cell;

/// Position in a [`SourceBuffer`](crate::SourceBuffer).
///
/// Created via [`SourceBuffer::cursor`](crate::SourceBuffer::cursor) or
/// [`SourceBuffer::cursor_at`](crate::SourceBuffer::cursor_at). The position
/// never moves past the end of the source.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    /// Source bytes followed by the zero sentinel.
    buf: &'a [u8],
    pos: u32,
    end: u32,
    reach: Option<&'a Cell<u32>>,
}

const _: () = assert!(std::mem::size_of::<Cursor<'static>>() <= 32);

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8], end: u32) -> Self {
        debug_assert!((end as usize) < buf.len(), "buffer lacks its sentinel");
        Self {
            buf,
            pos: 0,
            end,
            reach: None,
        }
    }

    pub(crate) fn with_pos(mut self, pos: u32) -> Self {
        self.pos = pos.min(self.end);
        self
    }

    /// Record into `reach` the end of every byte range read from here on.
    /// The mark only grows and never passes the end of the source.
    pub fn track_reach(mut self, reach: &'a Cell<u32>) -> Self {
        self.reach = Some(reach);
        self
    }

    #[inline]
    fn note(&self, upto: u32) {
        if let Some(reach) = self.reach {
            reach.set(reach.get().max(upto.min(self.end)));
        }
    }

    /// The byte under the cursor; `0x00` at end of input.
    #[inline]
    pub fn current(&self) -> u8 {
        self.byte_at(self.pos)
    }

    /// The byte after the current one.
    #[inline]
    pub fn peek(&self) -> u8 {
        self.byte_at(self.pos.saturating_add(1))
    }

    #[inline]
    fn byte_at(&self, pos: u32) -> u8 {
        self.note(pos.saturating_add(1));
        self.buf.get(pos as usize).copied().unwrap_or(0)
    }

    #[inline]
    pub fn advance(&mut self) {
        if self.pos < self.end {
            self.pos += 1;
        }
    }

    #[inline]
    pub fn advance_n(&mut self, n: u32) {
        self.pos = self.pos.saturating_add(n).min(self.end);
    }

    /// Step over one UTF-8 character, judged by its lead byte.
    #[inline]
    pub fn advance_char(&mut self) {
        self.advance_n(Self::utf8_char_width(self.current()));
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.end
    }

    /// Byte offset from the start of the source.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Source bytes in `start..end`, clamped to the source.
    pub fn slice(&self, start: u32, end: u32) -> &'a [u8] {
        self.note(end);
        let end = end.min(self.end) as usize;
        let start = (start as usize).min(end);
        &self.buf[start..end]
    }

    /// Source bytes from `start` up to the cursor.
    pub fn slice_from(&self, start: u32) -> &'a [u8] {
        self.slice(start, self.pos)
    }

    fn rest(&self) -> &'a [u8] {
        let end = self.end as usize;
        &self.buf[(self.pos as usize).min(end)..end]
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "the compared length is bounded by the source length"
    )]
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        let rest = self.rest();
        let common = prefix.iter().zip(rest).take_while(|(a, b)| a == b).count();
        let read = if common == prefix.len() { common } else { common + 1 };
        self.note(self.pos.saturating_add(read as u32));
        common == prefix.len()
    }

    /// Consume `prefix` if the input continues with it.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "a prefix of the source is shorter than the source"
    )]
    pub fn eat(&mut self, prefix: &[u8]) -> bool {
        let matched = self.starts_with(prefix);
        if matched {
            self.pos += prefix.len() as u32;
        }
        matched
    }

    /// Consume bytes while `pred` holds. Stops at end of input.
    #[inline]
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while !self.is_eof() && pred(self.current()) {
            self.pos += 1;
        }
    }

    /// Move to the next occurrence of `byte`, or to end of input.
    ///
    /// Returns how many bytes were skipped.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "offsets into the source fit in u32"
    )]
    pub fn eat_until(&mut self, byte: u8) -> u32 {
        let skipped = memchr::memchr(byte, self.rest())
            .map_or(self.end - self.pos, |offset| offset as u32);
        self.pos += skipped;
        self.note(self.pos.saturating_add(1));
        skipped
    }

    /// Bytes between the start of the current line and the cursor.
    ///
    /// Indentation-sensitive scanners compare this against their saved
    /// indent stack.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "offsets into the source fit in u32"
    )]
    pub fn column(&self) -> u32 {
        let line_start = memchr::memrchr(b'\n', &self.buf[..self.pos as usize])
            .map_or(0, |newline| newline as u32 + 1);
        self.pos - line_start
    }

    /// Length in bytes of the UTF-8 sequence that `lead` starts. Continuation
    /// and invalid bytes count as one.
    #[inline]
    pub fn utf8_char_width(lead: u8) -> u32 {
        match lead {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        }
    }
}
