//! Green nodes: immutable, position-independent syntax nodes.
//!
//! A [`GreenNode`] knows its symbol, its byte length and row/column extent,
//! and its children with offsets relative to itself. It does not know where
//! it sits in the document, so one node can appear in many tree versions:
//! an edit path-copies the spine above the changed region and every other
//! subtree is shared by `Arc`.
//!
//! Besides the structural data, each node records what the incremental
//! parser needs to decide whether it may be reused: the parse state at its
//! left edge, how far past its end the parser looked while building it, and
//! the external scanner checkpoints at both edges.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use fru_grammar::{FieldId, Language, ScannerState, StateId, Symbol};
use fru_lexer_core::Point;

bitflags! {
    /// Per-node properties, fixed at construction.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct NodeFlags: u16 {
        /// Produced by the lexer (leaves, including `MISSING` and lex errors).
        const TERMINAL = 1 << 0;
        /// Rule or pattern token, as opposed to an anonymous literal.
        const NAMED = 1 << 1;
        /// Shown by visible navigation and in S-expressions.
        const VISIBLE = 1 << 2;
        /// Whitespace, comments and other tokens allowed anywhere.
        const EXTRA = 1 << 3;
        /// An `ERROR` node or an unmatchable byte.
        const ERROR = 1 << 4;
        /// Zero-width token inserted by error recovery.
        const MISSING = 1 << 5;
        /// This node or a descendant is an error or missing node.
        const HAS_ERROR = 1 << 6;
        /// Touched by an edit since it was parsed.
        const HAS_CHANGES = 1 << 7;
        /// Built while several stack versions were alive.
        const FRAGILE = 1 << 8;
        /// Children are alternative interpretations of the same text.
        const AMBIGUOUS = 1 << 9;
        /// Contains a token produced by the external scanner.
        const HAS_EXTERNAL = 1 << 10;
    }
}

impl NodeFlags {
    /// Flags a parent inherits from any child.
    pub const PROPAGATE_MASK: Self = Self::from_bits_truncate(
        Self::HAS_ERROR.bits() | Self::HAS_EXTERNAL.bits(),
    );

    /// Flags that structural equality compares.
    const SHAPE_MASK: Self = Self::from_bits_truncate(
        Self::TERMINAL.bits()
            | Self::NAMED.bits()
            | Self::VISIBLE.bits()
            | Self::EXTRA.bits()
            | Self::ERROR.bits()
            | Self::MISSING.bits()
            | Self::AMBIGUOUS.bits(),
    );

    /// Display flags of `symbol` in `language`.
    pub fn for_symbol(language: &Language, symbol: Symbol) -> NodeFlags {
        let mut flags = NodeFlags::empty();
        flags.set(NodeFlags::VISIBLE, language.is_visible(symbol));
        flags.set(NodeFlags::NAMED, language.is_named(symbol));
        flags.set(NodeFlags::EXTRA, language.is_extra(symbol));
        flags
    }
}

/// A shared, immutable syntax node.
#[derive(Clone)]
pub struct GreenNode(Arc<GreenData>);

struct GreenData {
    symbol: Symbol,
    flags: NodeFlags,
    len: u32,
    extent: Point,
    parse_state: StateId,
    lookahead_bytes: u32,
    error_cost: u32,
    /// Non-extra leaves in this subtree (preferred alternative only).
    leaf_count: u32,
    scanner_before: ScannerState,
    scanner_after: ScannerState,
    children: Box<[GreenChild]>,
}

/// A child, its position relative to the parent's start, and the field
/// the parent's rule gave it.
#[derive(Clone)]
pub struct GreenChild {
    offset: u32,
    start: Point,
    field: Option<FieldId>,
    node: GreenNode,
}

impl GreenChild {
    pub(crate) fn new(offset: u32, start: Point, field: Option<FieldId>, node: GreenNode) -> Self {
        GreenChild {
            offset,
            start,
            field,
            node,
        }
    }

    /// Byte offset from the parent's start.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Row/column extent from the parent's start to this child's start.
    #[inline]
    pub fn start(&self) -> Point {
        self.start
    }

    #[inline]
    pub fn field(&self) -> Option<FieldId> {
        self.field
    }

    #[inline]
    pub fn node(&self) -> &GreenNode {
        &self.node
    }
}

/// Everything the lexer knows about a token when it becomes a leaf.
#[derive(Clone, Debug)]
pub struct LeafInfo {
    pub symbol: Symbol,
    /// Display flags; `TERMINAL` is added by [`GreenNode::leaf`].
    pub flags: NodeFlags,
    pub len: u32,
    pub extent: Point,
    /// State the parser was in when the token was lexed.
    pub parse_state: StateId,
    /// Bytes past the token's end the lexer examined.
    pub lookahead_bytes: u32,
    pub scanner_before: ScannerState,
    pub scanner_after: ScannerState,
}

impl GreenNode {
    /// A token.
    pub fn leaf(info: LeafInfo) -> GreenNode {
        let mut flags = info.flags | NodeFlags::TERMINAL;
        let is_error = info.symbol.is_error() || flags.contains(NodeFlags::ERROR);
        if is_error {
            flags |= NodeFlags::ERROR | NodeFlags::HAS_ERROR;
        }
        let counted = !flags.contains(NodeFlags::EXTRA);
        GreenNode(Arc::new(GreenData {
            symbol: info.symbol,
            flags,
            len: info.len,
            extent: info.extent,
            parse_state: info.parse_state,
            lookahead_bytes: info.lookahead_bytes,
            error_cost: u32::from(is_error),
            leaf_count: u32::from(counted),
            scanner_before: info.scanner_before,
            scanner_after: info.scanner_after,
            children: Box::new([]),
        }))
    }

    /// A zero-width token inserted by error recovery.
    pub fn missing(symbol: Symbol, flags: NodeFlags, parse_state: StateId, scanner: ScannerState) -> GreenNode {
        GreenNode(Arc::new(GreenData {
            symbol,
            flags: flags | NodeFlags::TERMINAL | NodeFlags::MISSING | NodeFlags::HAS_ERROR,
            len: 0,
            extent: Point::ZERO,
            parse_state,
            lookahead_bytes: 0,
            error_cost: 1,
            leaf_count: 0,
            scanner_before: scanner.clone(),
            scanner_after: scanner,
            children: Box::new([]),
        }))
    }

    /// A nonterminal over `children`, laid out back to back.
    ///
    /// `trailing_lookahead` is how far past the node's end the parser looked
    /// when it decided to build it. The recorded lookahead is the larger of
    /// that and whatever the children already looked past the end.
    pub fn node(
        symbol: Symbol,
        flags: NodeFlags,
        parse_state: StateId,
        children: Vec<GreenNode>,
        trailing_lookahead: u32,
    ) -> GreenNode {
        let children = children.into_iter().map(|child| (child, None)).collect();
        Self::node_with_fields(symbol, flags, parse_state, children, trailing_lookahead)
    }

    /// [`GreenNode::node`] with a field, or none, for every child.
    pub fn node_with_fields(
        symbol: Symbol,
        flags: NodeFlags,
        parse_state: StateId,
        children: Vec<(GreenNode, Option<FieldId>)>,
        trailing_lookahead: u32,
    ) -> GreenNode {
        let mut offset = 0u32;
        let mut start = Point::ZERO;
        let mut placed = Vec::with_capacity(children.len());
        for (child, field) in children {
            let len = child.len();
            let extent = child.extent();
            placed.push(GreenChild::new(offset, start, field, child));
            offset = offset.saturating_add(len);
            start = start.add_extent(extent);
        }
        Self::from_parts(symbol, flags, parse_state, offset, start, placed, trailing_lookahead)
    }

    /// An `ERROR` node around `children`.
    ///
    /// Its cost is one plus the number of real tokens it swallowed.
    pub fn error(parse_state: StateId, children: Vec<GreenNode>, trailing_lookahead: u32) -> GreenNode {
        let flags = NodeFlags::ERROR | NodeFlags::VISIBLE | NodeFlags::NAMED;
        Self::node(Symbol::ERROR, flags, parse_state, children, trailing_lookahead)
    }

    /// Alternative interpretations of the same text, `preferred` first.
    ///
    /// Returns `preferred` unchanged when there are no other alternatives.
    pub fn ambiguous(preferred: GreenNode, others: Vec<GreenNode>) -> GreenNode {
        if others.is_empty() {
            return preferred;
        }
        let mut flags =
            (preferred.flags() & !NodeFlags::TERMINAL) | NodeFlags::AMBIGUOUS | NodeFlags::FRAGILE;
        let mut lookahead = preferred.lookahead_bytes();
        for alt in &others {
            flags |= alt.flags() & NodeFlags::PROPAGATE_MASK;
            lookahead = lookahead.max(alt.lookahead_bytes());
        }
        let data = GreenData {
            symbol: preferred.symbol(),
            flags,
            len: preferred.len(),
            extent: preferred.extent(),
            parse_state: preferred.parse_state(),
            lookahead_bytes: lookahead,
            error_cost: preferred.error_cost(),
            leaf_count: preferred.leaf_count(),
            scanner_before: preferred.scanner_before().clone(),
            scanner_after: preferred.scanner_after().clone(),
            children: std::iter::once(preferred)
                .chain(others)
                .map(|alt| GreenChild::new(0, Point::ZERO, None, alt))
                .collect(),
        };
        GreenNode(Arc::new(data))
    }

    fn from_parts(
        symbol: Symbol,
        mut flags: NodeFlags,
        parse_state: StateId,
        len: u32,
        extent: Point,
        children: Vec<GreenChild>,
        trailing_lookahead: u32,
    ) -> GreenNode {
        let is_error = flags.contains(NodeFlags::ERROR);
        let mut lookahead = trailing_lookahead;
        let mut cost = 0u32;
        let mut leaves = 0u32;
        for child in &children {
            let node = child.node();
            flags |= node.flags() & NodeFlags::PROPAGATE_MASK;
            if node.flags().intersects(NodeFlags::ERROR | NodeFlags::MISSING) {
                flags |= NodeFlags::HAS_ERROR;
            }
            let reach = child.offset().saturating_add(node.len()).saturating_add(node.lookahead_bytes());
            lookahead = lookahead.max(reach.saturating_sub(len));
            cost = cost.saturating_add(node.error_cost());
            leaves = leaves.saturating_add(node.leaf_count());
        }
        if is_error {
            flags |= NodeFlags::HAS_ERROR;
            cost = cost.saturating_add(1).saturating_add(leaves);
        }
        let scanner_before = children
            .first()
            .map(|c| c.node().scanner_before().clone())
            .unwrap_or_default();
        let scanner_after = children
            .last()
            .map(|c| c.node().scanner_after().clone())
            .unwrap_or_default();
        GreenNode(Arc::new(GreenData {
            symbol,
            flags: flags & !NodeFlags::TERMINAL,
            len,
            extent,
            parse_state,
            lookahead_bytes: lookahead,
            error_cost: cost,
            leaf_count: leaves,
            scanner_before,
            scanner_after,
            children: children.into_boxed_slice(),
        }))
    }

    /// Copy of this node with new geometry and children, marked as changed.
    /// Used by edits; every other property is kept.
    pub(crate) fn edited(&self, len: u32, extent: Point, children: Vec<GreenChild>) -> GreenNode {
        let data = &self.0;
        GreenNode(Arc::new(GreenData {
            symbol: data.symbol,
            flags: data.flags | NodeFlags::HAS_CHANGES,
            len,
            extent,
            parse_state: data.parse_state,
            lookahead_bytes: data.lookahead_bytes,
            error_cost: data.error_cost,
            leaf_count: data.leaf_count,
            scanner_before: data.scanner_before.clone(),
            scanner_after: data.scanner_after.clone(),
            children: children.into_boxed_slice(),
        }))
    }

    /// Copy of this node with `flags` added.
    #[must_use]
    pub fn with_flags(&self, flags: NodeFlags) -> GreenNode {
        if self.flags().contains(flags) {
            return self.clone();
        }
        let data = &self.0;
        GreenNode(Arc::new(GreenData {
            symbol: data.symbol,
            flags: data.flags | flags,
            len: data.len,
            extent: data.extent,
            parse_state: data.parse_state,
            lookahead_bytes: data.lookahead_bytes,
            error_cost: data.error_cost,
            leaf_count: data.leaf_count,
            scanner_before: data.scanner_before.clone(),
            scanner_after: data.scanner_after.clone(),
            children: data.children.clone(),
        }))
    }

    // === Accessors ===

    #[inline]
    pub fn symbol(&self) -> Symbol {
        self.0.symbol
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.0.flags
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.0.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.len == 0
    }

    /// Rows and columns covered.
    #[inline]
    pub fn extent(&self) -> Point {
        self.0.extent
    }

    /// Parse state at the node's left edge.
    #[inline]
    pub fn parse_state(&self) -> StateId {
        self.0.parse_state
    }

    /// Bytes past the node's end that influenced how it was built.
    #[inline]
    pub fn lookahead_bytes(&self) -> u32 {
        self.0.lookahead_bytes
    }

    /// Recovery cost of the errors in this subtree.
    #[inline]
    pub fn error_cost(&self) -> u32 {
        self.0.error_cost
    }

    /// Number of non-extra leaves (zero-width `MISSING` leaves excluded).
    #[inline]
    pub fn leaf_count(&self) -> u32 {
        self.0.leaf_count
    }

    pub fn scanner_before(&self) -> &ScannerState {
        &self.0.scanner_before
    }

    pub fn scanner_after(&self) -> &ScannerState {
        &self.0.scanner_after
    }

    #[inline]
    pub fn children(&self) -> &[GreenChild] {
        &self.0.children
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.0.children.len()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.0.flags.contains(NodeFlags::TERMINAL)
    }

    pub fn is_named(&self) -> bool {
        self.0.flags.contains(NodeFlags::NAMED)
    }

    pub fn is_visible(&self) -> bool {
        self.0.flags.contains(NodeFlags::VISIBLE)
    }

    pub fn is_extra(&self) -> bool {
        self.0.flags.contains(NodeFlags::EXTRA)
    }

    pub fn is_error(&self) -> bool {
        self.0.flags.contains(NodeFlags::ERROR)
    }

    pub fn is_missing(&self) -> bool {
        self.0.flags.contains(NodeFlags::MISSING)
    }

    pub fn has_error(&self) -> bool {
        self.0.flags.contains(NodeFlags::HAS_ERROR)
    }

    pub fn has_changes(&self) -> bool {
        self.0.flags.contains(NodeFlags::HAS_CHANGES)
    }

    pub fn is_fragile(&self) -> bool {
        self.0.flags.contains(NodeFlags::FRAGILE)
    }

    pub fn is_ambiguous(&self) -> bool {
        self.0.flags.contains(NodeFlags::AMBIGUOUS)
    }

    pub fn has_external(&self) -> bool {
        self.0.flags.contains(NodeFlags::HAS_EXTERNAL)
    }

    /// The children that make up this node's text: all of them, or the
    /// preferred alternative's for an ambiguous node.
    pub fn content_children(&self) -> &[GreenChild] {
        if self.is_ambiguous() {
            self.children()
                .first()
                .map_or(&[], |preferred| preferred.node().content_children())
        } else {
            self.children()
        }
    }

    /// Whether both handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &GreenNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Structural equality: symbols, geometry, display flags, fields and
    /// children.
    /// Parse states, lookahead, scanner checkpoints and change marks are
    /// ignored.
    pub fn same_shape(&self, other: &GreenNode) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (&self.0, &other.0);
        a.symbol == b.symbol
            && a.len == b.len
            && a.extent == b.extent
            && (a.flags & NodeFlags::SHAPE_MASK) == (b.flags & NodeFlags::SHAPE_MASK)
            && a.children.len() == b.children.len()
            && fru_stack::ensure_sufficient_stack(|| {
                a.children.iter().zip(b.children.iter()).all(|(x, y)| {
                    x.offset == y.offset
                        && x.start == y.start
                        && x.field == y.field
                        && x.node.same_shape(&y.node)
                })
            })
    }
}

impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        self.same_shape(other)
    }
}

impl Eq for GreenNode {}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol(), self.len())?;
        if !self.children().is_empty() {
            f.debug_list()
                .entries(self.children().iter().map(|c| &c.node))
                .finish()?;
        }
        Ok(())
    }
}

impl fmt::Debug for GreenChild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} {:?}", self.offset, self.node)
    }
}

/// Children are released iteratively so that dropping a very deep tree
/// does not recurse once per level.
impl Drop for GreenData {
    fn drop(&mut self) {
        if self.children.is_empty() {
            return;
        }
        let mut pending: Vec<GreenNode> = std::mem::take(&mut self.children)
            .into_vec()
            .into_iter()
            .map(|c| c.node)
            .collect();
        while let Some(node) = pending.pop() {
            if let Ok(mut data) = Arc::try_unwrap(node.0) {
                pending.extend(
                    std::mem::take(&mut data.children)
                        .into_vec()
                        .into_iter()
                        .map(|c| c.node),
                );
            }
        }
    }
}
