//! Positioned views over green nodes.
//!
//! A [`SyntaxNode`] pairs a green node with its absolute position, its
//! parent and its index in the parent. Red nodes are created on demand
//! while navigating and are cheap to clone; the green tree underneath is
//! never copied.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use fru_grammar::{Language, Symbol};
use fru_lexer_core::Point;

use crate::green::GreenNode;

#[derive(Clone)]
pub struct SyntaxNode(Arc<RedData>);

struct RedData {
    green: GreenNode,
    parent: Option<SyntaxNode>,
    index: u32,
    start_byte: u32,
    start_point: Point,
    language: Language,
}

impl SyntaxNode {
    pub(crate) fn new_root(green: GreenNode, language: Language) -> SyntaxNode {
        SyntaxNode(Arc::new(RedData {
            green,
            parent: None,
            index: 0,
            start_byte: 0,
            start_point: Point::ZERO,
            language,
        }))
    }

    #[inline]
    pub fn green(&self) -> &GreenNode {
        &self.0.green
    }

    pub fn language(&self) -> &Language {
        &self.0.language
    }

    // === Identity ===

    #[inline]
    pub fn symbol(&self) -> Symbol {
        self.0.green.symbol()
    }

    /// Symbol name, `"ERROR"` for error nodes.
    pub fn kind(&self) -> &str {
        self.0.language.symbol_name(self.symbol())
    }

    pub fn is_named(&self) -> bool {
        self.0.green.is_named()
    }

    pub fn is_visible(&self) -> bool {
        self.0.green.is_visible()
    }

    pub fn is_extra(&self) -> bool {
        self.0.green.is_extra()
    }

    pub fn is_error(&self) -> bool {
        self.0.green.is_error()
    }

    pub fn is_missing(&self) -> bool {
        self.0.green.is_missing()
    }

    pub fn has_error(&self) -> bool {
        self.0.green.has_error()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.0.green.is_ambiguous()
    }

    // === Position ===

    #[inline]
    pub fn start_byte(&self) -> u32 {
        self.0.start_byte
    }

    #[inline]
    pub fn end_byte(&self) -> u32 {
        self.0.start_byte.saturating_add(self.0.green.len())
    }

    pub fn byte_range(&self) -> Range<u32> {
        self.start_byte()..self.end_byte()
    }

    pub fn start_point(&self) -> Point {
        self.0.start_point
    }

    pub fn end_point(&self) -> Point {
        self.0.start_point.add_extent(self.0.green.extent())
    }

    /// The node's text, if `source` is the text it was parsed from and
    /// the range is valid UTF-8.
    pub fn utf8_text<'s>(&self, source: &'s [u8]) -> Option<&'s str> {
        let bytes = source.get(self.start_byte() as usize..self.end_byte() as usize)?;
        std::str::from_utf8(bytes).ok()
    }

    // === Navigation ===

    pub fn parent(&self) -> Option<SyntaxNode> {
        self.0.parent.clone()
    }

    /// Position among the parent's children.
    pub fn index(&self) -> usize {
        self.0.index as usize
    }

    /// Number of children, counting extras and hidden tokens. For an
    /// ambiguous node the children are the alternatives.
    pub fn child_count(&self) -> usize {
        self.0.green.child_count()
    }

    /// The `index`-th child, counting extras and hidden tokens. O(1).
    pub fn child(&self, index: usize) -> Option<SyntaxNode> {
        let child = self.0.green.children().get(index)?;
        #[allow(clippy::cast_possible_truncation, reason = "child counts fit in u32")]
        let index = index as u32;
        Some(SyntaxNode(Arc::new(RedData {
            green: child.node().clone(),
            parent: Some(self.clone()),
            index,
            start_byte: self.0.start_byte.saturating_add(child.offset()),
            start_point: self.0.start_point.add_extent(child.start()),
            language: self.0.language.clone(),
        })))
    }

    pub fn children(&self) -> impl Iterator<Item = SyntaxNode> + '_ {
        (0..self.child_count()).filter_map(move |i| self.child(i))
    }

    /// Children shown in the tree: hidden tokens (such as whitespace) are
    /// skipped.
    pub fn visible_children(&self) -> impl Iterator<Item = SyntaxNode> + '_ {
        self.children().filter(SyntaxNode::is_visible)
    }

    pub fn named_children(&self) -> impl Iterator<Item = SyntaxNode> + '_ {
        self.children().filter(|c| c.is_visible() && c.is_named())
    }

    pub fn named_child_count(&self) -> usize {
        self.0
            .green
            .children()
            .iter()
            .filter(|c| c.node().is_visible() && c.node().is_named())
            .count()
    }

    pub fn named_child(&self, index: usize) -> Option<SyntaxNode> {
        self.named_children().nth(index)
    }

    pub fn next_sibling(&self) -> Option<SyntaxNode> {
        self.0.parent.as_ref()?.child(self.index() + 1)
    }

    pub fn prev_sibling(&self) -> Option<SyntaxNode> {
        let index = self.index().checked_sub(1)?;
        self.0.parent.as_ref()?.child(index)
    }

    pub fn next_named_sibling(&self) -> Option<SyntaxNode> {
        let mut node = self.next_sibling()?;
        while !(node.is_visible() && node.is_named()) {
            node = node.next_sibling()?;
        }
        Some(node)
    }

    pub fn prev_named_sibling(&self) -> Option<SyntaxNode> {
        let mut node = self.prev_sibling()?;
        while !(node.is_visible() && node.is_named()) {
            node = node.prev_sibling()?;
        }
        Some(node)
    }

    // === Fields ===

    /// Field the parent's rule gave this node.
    pub fn field_name(&self) -> Option<&str> {
        self.0.parent.as_ref()?.field_name_for_child(self.index())
    }

    /// Field of the `index`-th child, counting as [`SyntaxNode::child`] does.
    pub fn field_name_for_child(&self, index: usize) -> Option<&str> {
        let field = self.0.green.children().get(index)?.field()?;
        self.0.language.field_name(field)
    }

    /// First child with the field `name`.
    pub fn child_by_field_name(&self, name: &str) -> Option<SyntaxNode> {
        self.children_by_field_name(name).next()
    }

    /// Every child with the field `name`, in order.
    pub fn children_by_field_name(&self, name: &str) -> impl Iterator<Item = SyntaxNode> + '_ {
        let field = self.0.language.field_for_name(name);
        self.0
            .green
            .children()
            .iter()
            .enumerate()
            .filter(move |(_, child)| field.is_some() && child.field() == field)
            .filter_map(move |(index, _)| self.child(index))
    }

    /// Index of the child spanning `start..end`, by binary search over the
    /// child offsets. Ambiguous nodes descend into their preferred
    /// alternative.
    fn child_index_at(&self, start: u32, end: u32) -> Option<usize> {
        let green = &self.0.green;
        if green.is_ambiguous() {
            return (green.child_count() > 0).then_some(0);
        }
        let children = green.children();
        let rel_start = start.checked_sub(self.0.start_byte)?;
        let rel_end = end.checked_sub(self.0.start_byte)?;
        let index = children.partition_point(|c| c.offset() <= rel_start).checked_sub(1)?;
        let child = &children[index];
        let child_end = child.offset().saturating_add(child.node().len());
        (rel_end <= child_end).then_some(index)
    }

    /// The smallest node spanning `start..end`, preferring visible nodes.
    /// O(depth · log fanout).
    pub fn descendant_for_byte_range(&self, start: u32, end: u32) -> Option<SyntaxNode> {
        if start > end || start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut node = self.clone();
        let mut best = self.clone();
        while let Some(index) = node.child_index_at(start, end) {
            let Some(child) = node.child(index) else {
                break;
            };
            if child.is_visible() {
                best = child.clone();
            }
            node = child;
        }
        Some(best)
    }

    /// The smallest named node spanning `start..end`.
    pub fn named_descendant_for_byte_range(&self, start: u32, end: u32) -> Option<SyntaxNode> {
        let mut node = self.descendant_for_byte_range(start, end)?;
        while !(node.is_named() && node.is_visible()) {
            node = node.parent()?;
        }
        Some(node)
    }

    /// S-expression of this subtree.
    pub fn to_sexp(&self) -> String {
        crate::sexp::render(&self.0.green, &self.0.language)
    }
}

impl PartialEq for SyntaxNode {
    /// Same green node at the same position.
    fn eq(&self, other: &Self) -> bool {
        self.0.green.ptr_eq(&other.0.green) && self.0.start_byte == other.0.start_byte
    }
}

impl Eq for SyntaxNode {}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}-{}] {}..{}",
            self.kind(),
            self.start_point(),
            self.end_point(),
            self.start_byte(),
            self.end_byte()
        )
    }
}
