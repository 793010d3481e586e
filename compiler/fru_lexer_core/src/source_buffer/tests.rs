use super::*;
use pretty_assertions::assert_eq;

#[test]
fn empty_source() {
    let buf = SourceBuffer::new("");
    assert_eq!(buf.len(), 0);
    assert!(buf.is_empty());
    assert_eq!(buf.as_bytes(), b"");
    assert_eq!(buf.cursor().current(), 0);
}

#[test]
fn multibyte_source_keeps_its_bytes() {
    let source = "print(\"\u{1F34A}\");";
    let buf = SourceBuffer::new(source);
    assert_eq!(buf.len() as usize, source.len());
    assert_eq!(buf.as_bytes(), source.as_bytes());
}

#[test]
fn padding_reaches_the_next_multiple() {
    for (len, padded) in [(0, 64), (1, 64), (63, 64), (64, 128), (65, 128), (200, 256)] {
        let buf = SourceBuffer::new(&"a".repeat(len));
        assert_eq!(buf.padded_len(), padded, "source of {len} bytes");
    }
}

#[test]
fn reads_past_the_end_are_zero() {
    let buf = SourceBuffer::new("fn");
    let end = buf.cursor_at(2);
    assert!(end.is_eof());
    assert_eq!(end.current(), 0);
    assert_eq!(end.peek(), 0);
}

#[test]
fn cursor_at_clamps_to_source() {
    let buf = SourceBuffer::new("abc");
    assert_eq!(buf.cursor_at(1).current(), b'b');
    assert_eq!(buf.cursor_at(99).pos(), 3);
}

#[test]
fn slice_clamps_out_of_range() {
    let buf = SourceBuffer::new("let x");
    assert_eq!(buf.slice(0, 3), b"let");
    assert_eq!(buf.slice(4, 100), b"x");
    assert_eq!(buf.slice(10, 12), b"");
}

#[test]
fn point_at_tracks_rows_and_columns() {
    let buf = SourceBuffer::new("a\nbc\n\nd");
    assert_eq!(buf.point_at(0), Point::new(0, 0));
    assert_eq!(buf.point_at(1), Point::new(0, 1));
    assert_eq!(buf.point_at(2), Point::new(1, 0));
    assert_eq!(buf.point_at(4), Point::new(1, 2));
    assert_eq!(buf.point_at(5), Point::new(2, 0));
    assert_eq!(buf.point_at(6), Point::new(3, 0));
    assert_eq!(buf.point_at(7), Point::new(3, 1));
    assert_eq!(buf.point_at(70), Point::new(3, 1));
}

#[test]
fn from_bytes_accepts_invalid_utf8() {
    let buf = SourceBuffer::from_bytes(&[b'a', 0xFF, b'b']);
    assert_eq!(buf.len(), 3);
    assert_eq!(buf.slice(1, 2), &[0xFF]);
}
