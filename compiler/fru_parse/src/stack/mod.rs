//! Stack versions for the GLR driver.
//!
//! Each [`Version`] is one complete parse stack: the entries pushed so far,
//! the input position after them, the external scanner checkpoint and the
//! lexed-but-unconsumed lookahead. Versions are plain values; forking clones
//! one (entries hold `Arc`-shared green nodes, so this copies pointers, not
//! subtrees).
//!
//! Extras and `ERROR` nodes sit on the stack without changing the state.
//! They do not count towards a rule's arity: a reduction wraps the ones
//! between its children and leaves trailing ones on the stack.

use fru_grammar::{FieldId, Language, ParseAction, ScannerState, StateId, Symbol};
use fru_lexer_core::Point;
use fru_syntax::{GreenNode, NodeFlags};
use smallvec::SmallVec;

use crate::lexer::Token;

/// A node on a stack version.
#[derive(Clone, Debug)]
pub(crate) struct Entry {
    pub(crate) node: GreenNode,
    /// State after pushing `node`.
    pub(crate) state: StateId,
    pub(crate) start: u32,
    pub(crate) start_point: Point,
}

impl Entry {
    /// Extras and error nodes, which never change the state.
    #[inline]
    pub(crate) fn is_transparent(&self) -> bool {
        is_transparent(&self.node)
    }
}

#[inline]
pub(crate) fn is_transparent(node: &GreenNode) -> bool {
    node.is_extra() || (node.is_error() && !node.is_missing())
}

/// Result of [`Version::pop_children`].
pub(crate) struct Popped {
    pub(crate) children: Vec<GreenNode>,
    pub(crate) trailing: Vec<Entry>,
    /// Where the new parent starts.
    pub(crate) start: u32,
    pub(crate) start_point: Point,
}

/// One live parse stack.
#[derive(Clone, Debug)]
pub(crate) struct Version {
    pub(crate) entries: Vec<Entry>,
    base: StateId,
    pub(crate) position: u32,
    pub(crate) point: Point,
    pub(crate) scanner: ScannerState,
    pub(crate) lookahead: Option<Token>,
    /// Action a fork must take before consulting the table again.
    pub(crate) pending: Option<ParseAction>,
    /// Tokens skipped by recovery since the last real shift.
    pub(crate) skips: u32,
}

impl Version {
    pub(crate) fn new(base: StateId) -> Self {
        Version {
            entries: Vec::new(),
            base,
            position: 0,
            point: Point::ZERO,
            scanner: ScannerState::EMPTY,
            lookahead: None,
            pending: None,
            skips: 0,
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> StateId {
        self.entries.last().map_or(self.base, |e| e.state)
    }

    /// Push `node` at the current position.
    pub(crate) fn push(&mut self, node: GreenNode, state: StateId) {
        let (start, start_point) = (self.position, self.point);
        self.push_at(node, state, start, start_point);
    }

    /// Push `node` starting at `start`, which must be where the stack's
    /// content ends once the entries above `start` are removed.
    pub(crate) fn push_at(&mut self, node: GreenNode, state: StateId, start: u32, start_point: Point) {
        self.position = start + node.len();
        self.point = start_point.add_extent(node.extent());
        self.entries.push(Entry {
            node,
            state,
            start,
            start_point,
        });
    }

    /// Pop the children of a rule with `arity` non-transparent symbols.
    ///
    /// Transparent entries on top of the last child are returned separately;
    /// they belong after the new parent.
    pub(crate) fn pop_children(&mut self, arity: u16) -> Popped {
        let mut trailing = Vec::new();
        while self.entries.last().is_some_and(Entry::is_transparent) {
            if let Some(entry) = self.entries.pop() {
                trailing.push(entry);
            }
        }
        trailing.reverse();

        let (mut start, mut start_point) = trailing
            .first()
            .map_or((self.position, self.point), |e| (e.start, e.start_point));
        let mut children = Vec::with_capacity(usize::from(arity));
        let mut remaining = arity;
        while remaining > 0 {
            let Some(entry) = self.entries.pop() else {
                break;
            };
            if !entry.is_transparent() {
                remaining -= 1;
            }
            start = entry.start;
            start_point = entry.start_point;
            children.push(entry.node);
        }
        children.reverse();
        Popped {
            children,
            trailing,
            start,
            start_point,
        }
    }

    /// States of the non-transparent entries, bottom first, starting with
    /// the base state.
    pub(crate) fn state_stack(&self) -> Vec<StateId> {
        std::iter::once(self.base)
            .chain(
                self.entries
                    .iter()
                    .filter(|e| !e.is_transparent())
                    .map(|e| e.state),
            )
            .collect()
    }

    pub(crate) fn error_cost(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |cost, e| cost.saturating_add(e.node.error_cost()))
    }

    /// Whether any real token is on the stack.
    pub(crate) fn has_content(&self) -> bool {
        self.entries.iter().any(|e| !e.node.is_extra())
    }

    /// Two versions that will behave identically from here on.
    pub(crate) fn can_merge(&self, other: &Version) -> bool {
        self.position == other.position
            && self.pending.is_none()
            && other.pending.is_none()
            && self.scanner == other.scanner
            && self.lookahead.as_ref().map(|t| (t.symbol, t.len))
                == other.lookahead.as_ref().map(|t| (t.symbol, t.len))
            && self.base == other.base
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.state == b.state)
    }

    /// Fold `other` (an equivalent version) into `self`, keeping `self`'s
    /// nodes as the preferred interpretation.
    pub(crate) fn absorb(&mut self, other: Version) {
        for (mine, theirs) in self.entries.iter_mut().zip(other.entries) {
            if mine.start == theirs.start {
                mine.node = combine(&mine.node, &theirs.node);
            }
        }
        self.skips = self.skips.min(other.skips);
    }
}

/// Merge two interpretations of the same text into one node.
///
/// Identical subtrees collapse; nodes with the same symbol and child layout
/// are merged child by child, so the ambiguity is recorded as deep in the
/// tree as possible. Anything else becomes an ambiguous node with
/// `preferred` first.
pub(crate) fn combine(preferred: &GreenNode, other: &GreenNode) -> GreenNode {
    if preferred.ptr_eq(other) || preferred.same_shape(other) {
        return preferred.clone();
    }
    if preferred.len() != other.len() {
        return preferred.clone();
    }
    let same_layout = !preferred.is_leaf()
        && !preferred.is_ambiguous()
        && !other.is_ambiguous()
        && preferred.symbol() == other.symbol()
        && preferred.child_count() == other.child_count()
        && preferred
            .children()
            .iter()
            .zip(other.children())
            .all(|(a, b)| a.offset() == b.offset() && a.node().len() == b.node().len());
    if same_layout {
        let children = fru_stack::ensure_sufficient_stack(|| {
            preferred
                .children()
                .iter()
                .zip(other.children())
                .map(|(a, b)| (combine(a.node(), b.node()), a.field()))
                .collect::<Vec<_>>()
        });
        return rebuild(preferred, children);
    }

    let mut alternatives: SmallVec<[GreenNode; 4]> = SmallVec::new();
    for node in [preferred, other] {
        if node.is_ambiguous() {
            alternatives.extend(node.children().iter().map(|c| c.node().clone()));
        } else {
            alternatives.push(node.clone());
        }
    }
    let mut iter = alternatives.into_iter();
    match iter.next() {
        Some(first) => GreenNode::ambiguous(first, iter.collect()),
        None => preferred.clone(),
    }
}

/// `node` with new children and its own symbol, state and lookahead.
pub(crate) fn rebuild(node: &GreenNode, children: Vec<(GreenNode, Option<FieldId>)>) -> GreenNode {
    let flags = node.flags()
        & (NodeFlags::VISIBLE | NodeFlags::NAMED | NodeFlags::EXTRA | NodeFlags::ERROR | NodeFlags::FRAGILE);
    GreenNode::node_with_fields(
        node.symbol(),
        flags,
        node.parse_state(),
        children,
        node.lookahead_bytes(),
    )
}

/// Merge equivalent versions, then keep at most `max` of them, cheapest
/// first. Among equal costs the earlier (preferred) version wins.
pub(crate) fn merge_versions(versions: Vec<Version>, max: usize) -> Vec<Version> {
    let mut out: Vec<Version> = Vec::with_capacity(versions.len());
    'next: for version in versions {
        for kept in &mut out {
            if kept.can_merge(&version) {
                tracing::debug!(position = version.position, "merging stack versions");
                if version.error_cost() < kept.error_cost() {
                    let previous = std::mem::replace(kept, version);
                    kept.absorb(previous);
                } else {
                    kept.absorb(version);
                }
                continue 'next;
            }
        }
        out.push(version);
    }
    out.sort_by_key(Version::error_cost);
    if out.len() > max {
        tracing::debug!(dropped = out.len() - max, "dropping stack versions over the limit");
        out.truncate(max);
    }
    out
}

/// Run the preferred reductions for `token` on a bare state stack.
///
/// Returns `true` if the stack ends up shifting or accepting the token (the
/// shift target is pushed), `false` if the token has no action.
pub(crate) fn simulate(language: &Language, states: &mut Vec<StateId>, token: Symbol) -> bool {
    // Reductions without a shift in between are bounded by the stack depth
    // plus chains of unit rules; anything longer is a broken table.
    let limit = states.len() + language.state_count() + 1;
    for _ in 0..limit {
        let Some(&state) = states.last() else {
            return false;
        };
        match language.actions(state, token).first() {
            Some(ParseAction::Shift { state }) => {
                states.push(*state);
                return true;
            }
            Some(ParseAction::Accept) => return true,
            Some(ParseAction::Reduce { rule }) => {
                let rule = language.rule(*rule);
                let keep = states.len().saturating_sub(usize::from(rule.arity)).max(1);
                states.truncate(keep);
                let exposed = states[keep - 1];
                match language.goto(exposed, rule.lhs) {
                    Some(next) => states.push(next),
                    None => return false,
                }
            }
            None => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests;
