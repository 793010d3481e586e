//! Depth-first tree walking without red-node allocation.
//!
//! A [`TreeCursor`] keeps a stack of green nodes with their absolute
//! positions. Moving costs a `Vec` push or pop; a positioned
//! [`SyntaxNode`] is only materialized when asked for.

use fru_grammar::{Language, Symbol};
use fru_lexer_core::Point;

use crate::green::GreenNode;
use crate::node::SyntaxNode;

#[derive(Clone, Debug)]
struct Frame {
    node: GreenNode,
    index: usize,
    start_byte: u32,
    start_point: Point,
}

/// A cursor over all nodes of a tree, extras and hidden tokens included.
#[derive(Clone, Debug)]
pub struct TreeCursor {
    language: Language,
    stack: Vec<Frame>,
}

impl TreeCursor {
    pub(crate) fn new(root: GreenNode, language: Language) -> TreeCursor {
        TreeCursor {
            language,
            stack: vec![Frame {
                node: root,
                index: 0,
                start_byte: 0,
                start_point: Point::ZERO,
            }],
        }
    }

    fn top(&self) -> &Frame {
        // The root frame is never popped.
        &self.stack[self.stack.len() - 1]
    }

    pub fn green(&self) -> &GreenNode {
        &self.top().node
    }

    pub fn symbol(&self) -> Symbol {
        self.top().node.symbol()
    }

    pub fn kind(&self) -> &str {
        self.language.symbol_name(self.symbol())
    }

    /// Field the parent's rule gave the current node.
    pub fn field_name(&self) -> Option<&str> {
        let parent = self.stack.len().checked_sub(2).map(|i| &self.stack[i])?;
        let field = parent.node.children().get(self.top().index)?.field()?;
        self.language.field_name(field)
    }

    pub fn start_byte(&self) -> u32 {
        self.top().start_byte
    }

    pub fn end_byte(&self) -> u32 {
        self.top().start_byte.saturating_add(self.top().node.len())
    }

    pub fn start_point(&self) -> Point {
        self.top().start_point
    }

    pub fn end_point(&self) -> Point {
        self.top().start_point.add_extent(self.top().node.extent())
    }

    /// Distance from the root.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn goto_first_child(&mut self) -> bool {
        self.goto_child(0)
    }

    pub fn goto_last_child(&mut self) -> bool {
        match self.top().node.child_count().checked_sub(1) {
            Some(last) => self.goto_child(last),
            None => false,
        }
    }

    fn goto_child(&mut self, index: usize) -> bool {
        let top = self.top();
        let Some(child) = top.node.children().get(index) else {
            return false;
        };
        let frame = Frame {
            node: child.node().clone(),
            index,
            start_byte: top.start_byte.saturating_add(child.offset()),
            start_point: top.start_point.add_extent(child.start()),
        };
        self.stack.push(frame);
        true
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        let Some(parent) = self.stack.len().checked_sub(2).map(|i| &self.stack[i]) else {
            return false;
        };
        let index = self.top().index + 1;
        let Some(child) = parent.node.children().get(index) else {
            return false;
        };
        let frame = Frame {
            node: child.node().clone(),
            index,
            start_byte: parent.start_byte.saturating_add(child.offset()),
            start_point: parent.start_point.add_extent(child.start()),
        };
        let last = self.stack.len() - 1;
        self.stack[last] = frame;
        true
    }

    /// Move to the first child that ends after `byte`. Returns the child's
    /// index.
    pub fn goto_first_child_for_byte(&mut self, byte: u32) -> Option<usize> {
        let top = self.top();
        let index = top.node.children().iter().position(|c| {
            top.start_byte
                .saturating_add(c.offset())
                .saturating_add(c.node().len())
                > byte
        })?;
        self.goto_child(index).then_some(index)
    }

    /// Advance in pre-order: into the first child, else to the next sibling
    /// of the nearest ancestor that has one. Returns `false` at the end.
    pub fn goto_next(&mut self) -> bool {
        if self.goto_first_child() {
            return true;
        }
        loop {
            if self.goto_next_sibling() {
                return true;
            }
            if !self.goto_parent() {
                return false;
            }
        }
    }

    /// The current node as a positioned [`SyntaxNode`]. O(depth).
    pub fn node(&self) -> SyntaxNode {
        let mut node = SyntaxNode::new_root(self.stack[0].node.clone(), self.language.clone());
        for frame in &self.stack[1..] {
            match node.child(frame.index) {
                Some(child) => node = child,
                None => break,
            }
        }
        node
    }
}
