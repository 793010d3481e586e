//! A parsed document: a root green node and the language it was parsed with.
//!
//! Trees are immutable values. Cloning one is two reference-count bumps,
//! and [`Tree::edit`] returns a new tree that shares every subtree the edit
//! did not touch.

use std::fmt;

use fru_grammar::Language;
use fru_lexer_core::Point;

use crate::cursor::TreeCursor;
use crate::edit::{edit_root, InputEdit};
use crate::green::GreenNode;
use crate::node::SyntaxNode;

#[derive(Clone)]
pub struct Tree {
    root: GreenNode,
    language: Language,
}

impl Tree {
    pub fn new(root: GreenNode, language: Language) -> Tree {
        Tree { root, language }
    }

    pub fn root(&self) -> &GreenNode {
        &self.root
    }

    pub fn root_node(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.root.clone(), self.language.clone())
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Length of the source the tree covers.
    pub fn len(&self) -> u32 {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }

    /// The tree in the coordinates of the edited text. Nodes that depend on
    /// the replaced range are copied and marked as changed; the rest are
    /// shared with `self`. Until the edited tree is reparsed, inserted text
    /// may lie between leaves.
    #[must_use]
    #[tracing::instrument(
        level = "trace",
        skip_all,
        fields(start = edit.start_byte, old_end = edit.old_end_byte, new_end = edit.new_end_byte)
    )]
    pub fn edit(&self, edit: &InputEdit) -> Tree {
        Tree {
            root: edit_root(&self.root, edit),
            language: self.language.clone(),
        }
    }

    pub fn walk(&self) -> TreeCursor {
        TreeCursor::new(self.root.clone(), self.language.clone())
    }

    pub fn to_sexp(&self) -> String {
        crate::sexp::render(&self.root, &self.language)
    }

    /// Leaves in document order with their absolute start, following the
    /// preferred alternative of ambiguous nodes.
    pub fn leaves(&self) -> Leaves {
        Leaves {
            stack: vec![(self.root.clone(), 0, Point::ZERO)],
        }
    }

    /// Whether both trees have the same shape (see
    /// [`GreenNode::same_shape`]).
    pub fn same_shape(&self, other: &Tree) -> bool {
        self.root.same_shape(&other.root)
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("language", &self.language.name())
            .field("len", &self.len())
            .field("sexp", &self.to_sexp())
            .finish()
    }
}

/// A leaf and where it starts.
#[derive(Clone, Debug)]
pub struct LeafEntry {
    pub start_byte: u32,
    pub start_point: Point,
    pub node: GreenNode,
}

/// Iterator returned by [`Tree::leaves`].
pub struct Leaves {
    stack: Vec<(GreenNode, u32, Point)>,
}

impl Iterator for Leaves {
    type Item = LeafEntry;

    fn next(&mut self) -> Option<LeafEntry> {
        while let Some((node, start_byte, start_point)) = self.stack.pop() {
            if node.is_leaf() {
                return Some(LeafEntry {
                    start_byte,
                    start_point,
                    node,
                });
            }
            for child in node.content_children().iter().rev() {
                self.stack.push((
                    child.node().clone(),
                    start_byte.saturating_add(child.offset()),
                    start_point.add_extent(child.start()),
                ));
            }
        }
        None
    }
}
