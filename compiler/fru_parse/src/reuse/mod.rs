//! Reuse cursor over the previous (edited) tree.
//!
//! The cursor walks the old tree in document order, in the new document's
//! coordinates, while the driver moves forward through the new source. At
//! each position the driver asks for the outermost old node starting there,
//! checks whether it can be pushed as-is, and otherwise descends into it.
//! Leaves are compared against freshly lexed tokens instead.
//!
//! Queries must come in non-decreasing position order; a query behind the
//! cursor simply finds nothing.

use fru_syntax::GreenNode;

#[derive(Clone, Debug)]
struct Frame {
    node: GreenNode,
    start: u32,
    /// Index of `node` among its parent's children.
    index: usize,
}

/// Statistics for the reuse cursor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CursorStats {
    /// Nodes examined as reuse candidates.
    pub candidates: usize,
    /// Nodes stepped over without being reused.
    pub skipped: usize,
    /// Nodes entered because they could not be reused whole.
    pub descended: usize,
}

pub(crate) struct ReuseCursor {
    /// Path from the root to the current node.
    stack: Vec<Frame>,
    stats: CursorStats,
}

impl ReuseCursor {
    pub(crate) fn new(root: GreenNode) -> Self {
        ReuseCursor {
            stack: vec![Frame {
                node: root,
                start: 0,
                index: 0,
            }],
            stats: CursorStats::default(),
        }
    }

    pub(crate) fn stats(&self) -> CursorStats {
        self.stats
    }

    /// The outermost unvisited node starting exactly at `pos`, if any.
    /// Empty nodes are never returned.
    pub(crate) fn node_at(&mut self, pos: u32) -> Option<GreenNode> {
        loop {
            let frame = self.stack.last()?;
            let start = frame.start;
            let end = start + frame.node.len();
            if start > pos {
                return None;
            }
            if start == pos && !frame.node.is_empty() {
                self.stats.candidates += 1;
                return Some(frame.node.clone());
            }
            if end <= pos {
                self.stats.skipped += 1;
                self.advance();
            } else if !self.descend() {
                // A leaf straddling `pos`: nothing starts inside it.
                self.advance();
            }
        }
    }

    /// The old leaf starting at `pos`, descending through any nodes that
    /// start there.
    pub(crate) fn leaf_at(&mut self, pos: u32) -> Option<GreenNode> {
        loop {
            let node = self.node_at(pos)?;
            if node.is_leaf() {
                return Some(node);
            }
            self.descend();
        }
    }

    /// Enter the current node's first child.
    pub(crate) fn descend(&mut self) -> bool {
        let Some(frame) = self.stack.last() else {
            return false;
        };
        let Some(first) = frame.node.children().first() else {
            return false;
        };
        let child = Frame {
            node: first.node().clone(),
            start: frame.start + first.offset(),
            index: 0,
        };
        self.stats.descended += 1;
        self.stack.push(child);
        true
    }

    /// Move past the current node to the next one in document order.
    pub(crate) fn advance(&mut self) {
        while let Some(done) = self.stack.pop() {
            let Some(parent) = self.stack.last() else {
                return;
            };
            // Only the preferred alternative of an ambiguous node is walked.
            if parent.node.is_ambiguous() {
                continue;
            }
            let next = done.index + 1;
            if let Some(sibling) = parent.node.children().get(next) {
                let frame = Frame {
                    node: sibling.node().clone(),
                    start: parent.start + sibling.offset(),
                    index: next,
                };
                self.stack.push(frame);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests;
