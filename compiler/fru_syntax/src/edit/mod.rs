//! Text edits and their application to green trees.
//!
//! An [`InputEdit`] replaces the old range `[start_byte, old_end_byte)` with
//! new text ending at `new_end_byte`. Applying it to a tree produces a tree
//! in new-text coordinates:
//!
//! - nodes whose dependency range (their bytes plus the bytes they looked
//!   ahead at) touches the edit are path-copied and flagged `HAS_CHANGES`;
//! - leaves that overlap the replaced text are resized to the mapped range;
//! - everything else is shared with the old tree. Subtrees after the edit
//!   move only through their parent's child offsets.

use fru_lexer_core::Point;

use crate::green::{GreenChild, GreenNode};

/// A single text replacement, in bytes and points.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct InputEdit {
    pub start_byte: u32,
    pub old_end_byte: u32,
    pub new_end_byte: u32,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

impl InputEdit {
    /// Edit that replaces `old_text[start..old_end]` with `inserted`,
    /// computing the points from the old text.
    ///
    /// Byte offsets are clamped to the old text.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "documents are limited to u32::MAX bytes"
    )]
    pub fn replace(old_text: &str, start: u32, old_end: u32, inserted: &str) -> InputEdit {
        let bytes = old_text.as_bytes();
        let len = bytes.len() as u32;
        let start = start.min(len);
        let old_end = old_end.clamp(start, len);
        let start_point = Point::ZERO.add_extent(Point::extent_of(&bytes[..start as usize]));
        let old_end_point =
            start_point.add_extent(Point::extent_of(&bytes[start as usize..old_end as usize]));
        let new_end_point = start_point.add_extent(Point::extent_of(inserted.as_bytes()));
        InputEdit {
            start_byte: start,
            old_end_byte: old_end,
            new_end_byte: start.saturating_add(inserted.len() as u32),
            start_point,
            old_end_point,
            new_end_point,
        }
    }

    /// Net change in document length.
    #[inline]
    pub fn delta(&self) -> i64 {
        i64::from(self.new_end_byte) - i64::from(self.old_end_byte)
    }

    /// Whether the old range `[start, end)` shares bytes with the replaced
    /// text. Insertions intersect only ranges they fall strictly inside.
    #[inline]
    pub fn intersects(&self, start: u32, end: u32) -> bool {
        if self.is_insertion() {
            start < self.start_byte && self.start_byte < end
        } else {
            start < self.old_end_byte && self.start_byte < end
        }
    }

    fn is_insertion(&self) -> bool {
        self.start_byte == self.old_end_byte
    }

    fn shift_byte(&self, offset: u32) -> u32 {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "offsets after the edit stay within the new document"
        )]
        let shifted = (i64::from(offset) + self.delta()).max(0) as u32;
        shifted
    }

    fn shift_point(&self, point: Point) -> Point {
        if point.row == self.old_end_point.row {
            Point::new(
                self.new_end_point.row,
                self.new_end_point.column + point.column.saturating_sub(self.old_end_point.column),
            )
        } else {
            Point::new(
                self.new_end_point.row + (point.row - self.old_end_point.row),
                point.column,
            )
        }
    }

    /// Map the old start offset of a range into the new text. Starts inside
    /// the replaced text collapse onto the end of the inserted text; a start
    /// exactly at an insertion moves past the inserted text.
    pub fn map_start(&self, offset: u32) -> u32 {
        if offset < self.start_byte || (offset == self.start_byte && !self.is_insertion()) {
            offset
        } else if offset >= self.old_end_byte {
            self.shift_byte(offset)
        } else {
            self.new_end_byte
        }
    }

    /// Map the old end offset of a range into the new text. An end exactly
    /// at the edit start stays put.
    pub fn map_end(&self, offset: u32) -> u32 {
        if offset <= self.start_byte {
            offset
        } else if offset >= self.old_end_byte {
            self.shift_byte(offset)
        } else {
            self.new_end_byte
        }
    }

    /// [`map_start`](Self::map_start) for points.
    pub fn map_start_point(&self, point: Point) -> Point {
        if point < self.start_point || (point == self.start_point && !self.is_insertion()) {
            point
        } else if point >= self.old_end_point {
            self.shift_point(point)
        } else {
            self.new_end_point
        }
    }

    /// [`map_end`](Self::map_end) for points.
    pub fn map_end_point(&self, point: Point) -> Point {
        if point <= self.start_point {
            point
        } else if point >= self.old_end_point {
            self.shift_point(point)
        } else {
            self.new_end_point
        }
    }

    /// Clamp the edit to a document of `len` bytes ending at `end`.
    #[must_use]
    pub fn clamped(&self, len: u32, end: Point) -> InputEdit {
        if self.start_byte <= len && self.old_end_byte <= len {
            return *self;
        }
        let shift = self.new_end_byte.saturating_sub(self.start_byte);
        let start_byte = self.start_byte.min(len);
        let start_point = self.start_point.min(end);
        InputEdit {
            start_byte,
            old_end_byte: self.old_end_byte.clamp(start_byte, len),
            new_end_byte: start_byte.saturating_add(shift),
            start_point,
            old_end_point: self.old_end_point.clamp(start_point, end),
            new_end_point: start_point.add_extent(self.new_end_point.extent_from(self.start_point)),
        }
    }

    /// Whether a nonterminal at `[start, end)` that looked `lookahead`
    /// bytes past its end depends on the replaced text.
    #[inline]
    fn touches(&self, start: u32, end: u32, lookahead: u32) -> bool {
        start <= self.old_end_byte && end.saturating_add(lookahead) >= self.start_byte
    }
}

/// Apply `edit` to a root node. The root keeps covering the whole
/// document, including text inserted at either end.
pub(crate) fn edit_root(root: &GreenNode, edit: &InputEdit) -> GreenNode {
    let edit = edit.clamped(root.len(), root.extent());
    let new_len = edit.shift_byte(root.len());
    let new_extent = edit.shift_point(root.extent());
    edit_node(root, 0, Point::ZERO, (0, Point::ZERO), (new_len, new_extent), &edit)
}

/// Path-copy `node`, which starts at `start`/`point` in old coordinates.
/// Its new start and end are computed by the caller.
fn edit_node(
    node: &GreenNode,
    start: u32,
    point: Point,
    (new_start, new_point): (u32, Point),
    (new_end, new_end_point): (u32, Point),
    edit: &InputEdit,
) -> GreenNode {
    let new_len = new_end.saturating_sub(new_start);
    let new_extent = new_end_point.extent_from(new_point);

    if node.is_leaf() {
        return node.edited(new_len, new_extent, Vec::new());
    }

    let ambiguous = node.is_ambiguous();
    let children = fru_stack::ensure_sufficient_stack(|| {
        node.children()
            .iter()
            .map(|child| {
                let (child_start, child_point) = if ambiguous {
                    (start, point)
                } else {
                    (
                        start.saturating_add(child.offset()),
                        point.add_extent(child.start()),
                    )
                };
                let (child_new_start, child_new_point) = if ambiguous {
                    (new_start, new_point)
                } else {
                    (
                        edit.map_start(child_start).max(new_start),
                        edit.map_start_point(child_point).max(new_point),
                    )
                };
                let child_node = child.node();
                let child_end = child_start.saturating_add(child_node.len());

                let changed = if child_node.is_leaf() {
                    edit.intersects(child_start, child_end)
                } else {
                    edit.touches(child_start, child_end, child_node.lookahead_bytes())
                };
                let replacement = if changed {
                    let child_end_point = child_point.add_extent(child_node.extent());
                    edit_node(
                        child_node,
                        child_start,
                        child_point,
                        (child_new_start, child_new_point),
                        if ambiguous {
                            (new_end, new_end_point)
                        } else {
                            (
                                edit.map_end(child_end).max(child_new_start),
                                edit.map_end_point(child_end_point).max(child_new_point),
                            )
                        },
                        edit,
                    )
                } else {
                    child_node.clone()
                };
                GreenChild::new(
                    child_new_start - new_start,
                    child_new_point.extent_from(new_point),
                    child.field(),
                    replacement,
                )
            })
            .collect()
    });
    node.edited(new_len, new_extent, children)
}
