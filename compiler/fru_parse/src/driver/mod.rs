//! The GLR driver.
//!
//! # Algorithm
//!
//! The driver keeps a set of stack versions and advances them in rounds. Each
//! round takes every version at the smallest input position and runs it until
//! it shifts one token, accepts, or finds no action:
//!
//! - The lookahead token is lexed once per version and position, in the
//!   state the version was in when it first needed a token, and kept across
//!   the reductions it triggers.
//! - When the table lists several actions, the first is taken and every
//!   other one starts a fork (bounded by `max_versions`). Forks make the
//!   parse fragile: nodes built while more than one version is alive carry
//!   [`NodeFlags::FRAGILE`] and are never reused whole.
//! - Extras without an action are pushed without a state change.
//!
//! After the round, equivalent versions merge (their nodes combine into
//! ambiguous nodes) and the cheapest `max_versions` survive. If every
//! version failed and none accepted, the cheapest failed version goes
//! through error recovery (see `recover`).
//!
//! # Reuse
//!
//! With a previous tree, shifts first look for an old subtree starting at the
//! current position that was built in the same state, then for an old leaf
//! identical to the freshly lexed token.

use fru_grammar::{Language, ParseAction, RuleId, StateId};
use fru_lexer_core::SourceBuffer;
use fru_syntax::{GreenNode, NodeFlags, Tree};

use crate::error::ParseError;
use crate::lexer::{Lexer, Token};
use crate::options::{Budget, ParseOptions};
use crate::reuse::ReuseCursor;
use crate::stack::{combine, is_transparent, merge_versions, rebuild, Version};
use crate::stats::ParseStats;

mod recover;

use recover::Recovered;

/// Versions waiting for the next round, and the ones that failed in this one.
struct Round {
    next: Vec<Version>,
    failed: Vec<Version>,
}

/// One parse of one source buffer.
pub(crate) struct Driver<'a> {
    language: &'a Language,
    lexer: Lexer<'a>,
    source_len: u32,
    reuse: Option<ReuseCursor>,
    budget: Budget<'a>,
    max_versions: usize,
    /// Versions alive in the current round, forks included.
    live: usize,
    fragile: bool,
    stats: ParseStats,
}

impl<'a> Driver<'a> {
    pub(crate) fn new(
        language: &'a Language,
        source: &'a SourceBuffer,
        old: Option<&Tree>,
        options: &'a ParseOptions,
    ) -> Self {
        let reuse = old.and_then(|tree| {
            if !tree.language().ptr_eq(language) {
                tracing::debug!("previous tree belongs to another language; parsing from scratch");
                return None;
            }
            if tree.len() != source.len() {
                tracing::debug!(
                    tree_len = tree.len(),
                    source_len = source.len(),
                    "previous tree does not match the source; parsing from scratch"
                );
                return None;
            }
            Some(ReuseCursor::new(tree.root().clone()))
        });
        Driver {
            language,
            lexer: Lexer::new(language, source),
            source_len: source.len(),
            reuse,
            budget: Budget::new(options),
            max_versions: options.max_versions.max(1),
            live: 1,
            fragile: false,
            stats: ParseStats::default(),
        }
    }

    pub(crate) fn run(mut self) -> Result<(GreenNode, ParseStats), ParseError> {
        let mut versions = vec![Version::new(self.language.start_state())];
        let mut accepted: Vec<GreenNode> = Vec::new();

        while let Some(position) = versions.iter().map(|v| v.position).min() {
            let (current, waiting): (Vec<Version>, Vec<Version>) =
                versions.into_iter().partition(|v| v.position == position);
            self.live = current.len() + waiting.len();
            self.fragile = self.live > 1;
            self.stats.max_versions = self.stats.max_versions.max(self.live);

            let mut round = Round {
                next: waiting,
                failed: Vec::new(),
            };
            for version in current {
                self.advance(version, &mut round, &mut accepted)?;
            }

            if round.next.is_empty() && accepted.is_empty() {
                // Among equal costs the earliest (preferred) version wins.
                if let Some(best) = round.failed.into_iter().min_by_key(Version::error_cost) {
                    match self.recover(best)? {
                        Recovered::Resume(version) => round.next.push(version),
                        Recovered::Done(root) => accepted.push(root),
                    }
                }
            } else if !round.failed.is_empty() {
                tracing::trace!(dropped = round.failed.len(), position, "dropping failed versions");
            }
            versions = merge_versions(round.next, self.max_versions);
        }

        let root = self.finish(accepted);
        self.stats.lexed_tokens = self.lexer.lexed();
        self.stats.operations = self.budget.operations();
        if let Some(cursor) = &self.reuse {
            self.stats.cursor = cursor.stats();
        }
        Ok((root, self.stats))
    }

    /// Run `version` (and any forks it spawns) until each shifts, accepts or
    /// fails.
    fn advance(
        &mut self,
        version: Version,
        round: &mut Round,
        accepted: &mut Vec<GreenNode>,
    ) -> Result<(), ParseError> {
        let language = self.language;
        let mut work = vec![version];
        while let Some(mut version) = work.pop() {
            // Reductions between two shifts are bounded by the stack depth
            // plus chains of unit rules.
            let limit = version.entries.len() + language.state_count() + 1;
            let mut reductions = 0usize;
            loop {
                let token = self.lookahead(&mut version);
                let action = match version.pending.take() {
                    Some(action) => action,
                    None => {
                        let actions = language.actions(version.state(), token.symbol);
                        let Some((&first, rest)) = actions.split_first() else {
                            if !token.is_end() && language.is_extra(token.symbol) {
                                self.shift_extra(&mut version, &token)?;
                                round.next.push(version);
                            } else {
                                tracing::trace!(
                                    position = version.position,
                                    state = version.state().0,
                                    token = language.symbol_name(token.symbol),
                                    "no action"
                                );
                                self.live = self.live.saturating_sub(1);
                                round.failed.push(version);
                            }
                            break;
                        };
                        // Reversed so the work list pops them in table order.
                        for &alternative in rest.iter().rev() {
                            self.fork(&version, alternative, &mut work);
                        }
                        first
                    }
                };

                match action {
                    ParseAction::Shift { state } => {
                        self.shift(&mut version, state, token)?;
                        round.next.push(version);
                        break;
                    }
                    ParseAction::Reduce { rule } => {
                        reductions += 1;
                        if reductions > limit || !self.reduce(&mut version, rule, &token) {
                            self.live = self.live.saturating_sub(1);
                            round.failed.push(version);
                            break;
                        }
                    }
                    ParseAction::Accept => {
                        self.live = self.live.saturating_sub(1);
                        accepted.push(self.accept(version));
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn fork(&mut self, version: &Version, action: ParseAction, work: &mut Vec<Version>) {
        if self.live >= self.max_versions {
            tracing::debug!(
                position = version.position,
                ?action,
                "version limit reached; dropping fork"
            );
            return;
        }
        tracing::debug!(
            position = version.position,
            state = version.state().0,
            ?action,
            "forking stack version"
        );
        let mut fork = version.clone();
        fork.pending = Some(action);
        self.live += 1;
        self.fragile = true;
        self.stats.max_versions = self.stats.max_versions.max(self.live);
        work.push(fork);
    }

    /// The token at the version's position, lexed on first use.
    fn lookahead(&mut self, version: &mut Version) -> Token {
        if let Some(token) = &version.lookahead {
            return token.clone();
        }
        let token = self
            .lexer
            .lex(version.position, version.state(), &version.scanner);
        tracing::trace!(
            start = token.start,
            len = token.len,
            state = version.state().0,
            symbol = self.language.symbol_name(token.symbol),
            "lexed"
        );
        version.lookahead = Some(token.clone());
        token
    }

    fn shift(&mut self, version: &mut Version, state: StateId, token: Token) -> Result<(), ParseError> {
        self.budget.tick()?;

        if let Some((node, goto)) = self.reusable_subtree(version, &token) {
            tracing::debug!(
                position = version.position,
                len = node.len(),
                symbol = self.language.symbol_name(node.symbol()),
                "reusing subtree"
            );
            let scanner = node.scanner_after().clone();
            version.push(node, goto);
            version.scanner = scanner;
            version.lookahead = None;
            version.skips = 0;
            self.stats.reused_subtrees += 1;
            return Ok(());
        }

        let parse_state = version.state();
        let leaf = match self.reusable_leaf(&token) {
            Some(leaf) => leaf,
            None => token.to_leaf(self.language, parse_state),
        };
        version.push(leaf, state);
        version.scanner = token.scanner_after;
        version.lookahead = None;
        version.skips = 0;
        Ok(())
    }

    /// Push an extra without changing the state.
    fn shift_extra(&mut self, version: &mut Version, token: &Token) -> Result<(), ParseError> {
        self.budget.tick()?;
        let state = version.state();
        let leaf = match self.reusable_leaf(token) {
            Some(leaf) => leaf,
            None => token.to_leaf(self.language, state),
        };
        version.push(leaf, state);
        version.scanner = token.scanner_after.clone();
        version.lookahead = None;
        Ok(())
    }

    /// An old subtree that can stand in for the input starting at the
    /// version's position, with the state to push it in.
    fn reusable_subtree(&mut self, version: &Version, token: &Token) -> Option<(GreenNode, StateId)> {
        if self.fragile || self.live > 1 {
            return None;
        }
        let language = self.language;
        let source_len = self.source_len;
        let cursor = self.reuse.as_mut()?;
        let state = version.state();
        loop {
            let node = cursor.node_at(version.position)?;
            if node.is_leaf() {
                return None;
            }
            let reusable = !node.has_changes()
                && !node.has_error()
                && !node.is_fragile()
                && !node.is_ambiguous()
                && node.parse_state() == state
                && node.scanner_before() == &version.scanner
                && version.position.saturating_add(node.len()) <= source_len
                && first_leaf(&node).is_some_and(|leaf| leaf.symbol() == token.symbol && leaf.len() == token.len);
            if reusable {
                if let Some(goto) = language.goto(state, node.symbol()) {
                    cursor.advance();
                    return Some((node, goto));
                }
            }
            if !cursor.descend() {
                return None;
            }
        }
    }

    /// The old leaf at the token's position, if it is the same token.
    fn reusable_leaf(&mut self, token: &Token) -> Option<GreenNode> {
        let cursor = self.reuse.as_mut()?;
        let leaf = cursor.leaf_at(token.start)?;
        if token.matches_leaf(&leaf) {
            self.stats.reused_leaves += 1;
            Some(leaf)
        } else {
            None
        }
    }

    /// Apply `rule`. Fails when the table has no goto for the result.
    ///
    /// Children get the fields the rule gives their positions. Children of
    /// inlined hidden nodes keep their own fields and otherwise inherit the
    /// hidden node's.
    fn reduce(&mut self, version: &mut Version, rule: RuleId, token: &Token) -> bool {
        let language = self.language;
        let rule = language.rule(rule);
        let lhs = rule.lhs;
        let popped = version.pop_children(rule.arity);
        let exposed = version.state();
        let Some(goto) = language.goto(exposed, lhs) else {
            tracing::warn!(
                state = exposed.0,
                symbol = language.symbol_name(lhs),
                "no goto after reduction"
            );
            return false;
        };

        let mut children = Vec::with_capacity(popped.children.len());
        let mut position = 0u16;
        for child in popped.children {
            let field = if is_transparent(&child) {
                None
            } else {
                position += 1;
                rule.field_at(position - 1)
            };
            if is_inlined(&child) {
                children.extend(child.children().iter().map(|c| {
                    let inherited = field.filter(|_| !is_transparent(c.node()));
                    (c.node().clone(), c.field().or(inherited))
                }));
            } else {
                children.push((child, field));
            }
        }
        let len = children
            .iter()
            .fold(0u32, |len, (child, _)| len.saturating_add(child.len()));
        let trailing = token
            .reach()
            .saturating_sub(popped.start.saturating_add(len));
        let mut flags = NodeFlags::for_symbol(language, lhs);
        if self.fragile {
            flags |= NodeFlags::FRAGILE;
        }
        let node = GreenNode::node_with_fields(lhs, flags, exposed, children, trailing);
        tracing::trace!(
            symbol = language.symbol_name(lhs),
            start = popped.start,
            len,
            "reduced"
        );

        version.push_at(node, goto, popped.start, popped.start_point);
        for entry in popped.trailing {
            version.push_at(entry.node, goto, entry.start, entry.start_point);
        }
        true
    }

    /// The finished tree of an accepting version: the start-symbol node with
    /// any extras and errors around it moved inside.
    fn accept(&self, version: Version) -> GreenNode {
        let start = self.language.start_symbol();
        let Some(index) = version
            .entries
            .iter()
            .rposition(|e| !e.is_transparent() && e.node.symbol() == start)
        else {
            return self.wrap_everything(version);
        };
        if version.entries.len() == 1 {
            tracing::debug!(cost = version.entries[0].node.error_cost(), "accepted");
            return version.entries[index].node.clone();
        }

        let root = version.entries[index].node.clone();
        let mut children = Vec::with_capacity(version.entries.len() + root.child_count());
        children.extend(version.entries[..index].iter().map(|e| (e.node.clone(), None)));
        children.extend(root.content_children().iter().map(|c| (c.node().clone(), c.field())));
        children.extend(version.entries[index + 1..].iter().map(|e| (e.node.clone(), None)));
        let root = rebuild(&root, children);
        tracing::debug!(cost = root.error_cost(), "accepted");
        root
    }

    /// The start symbol around an `ERROR` node holding the whole stack.
    fn wrap_everything(&self, version: Version) -> GreenNode {
        let start_state = self.language.start_state();
        let children = flatten_errors(version.entries.into_iter().map(|e| e.node));
        let error = GreenNode::error(start_state, children, 0);
        self.start_node(vec![error])
    }

    fn start_node(&self, children: Vec<GreenNode>) -> GreenNode {
        let symbol = self.language.start_symbol();
        GreenNode::node(
            symbol,
            NodeFlags::for_symbol(self.language, symbol),
            self.language.start_state(),
            children,
            0,
        )
    }

    /// Pick the cheapest accepted tree; equally cheap ones are combined.
    fn finish(&self, accepted: Vec<GreenNode>) -> GreenNode {
        let Some(cost) = accepted.iter().map(GreenNode::error_cost).min() else {
            return self.start_node(Vec::new());
        };
        let mut best = accepted.into_iter().filter(|root| root.error_cost() == cost);
        let Some(first) = best.next() else {
            return self.start_node(Vec::new());
        };
        best.fold(first, |root, other| combine(&root, &other))
    }
}

/// Hidden nonterminals are replaced by their children in the parent.
fn is_inlined(node: &GreenNode) -> bool {
    !node.is_leaf() && !node.is_visible() && !node.is_ambiguous() && !node.is_error()
}

fn first_leaf(node: &GreenNode) -> Option<&GreenNode> {
    let mut node = node;
    while !node.is_leaf() {
        node = node.content_children().first()?.node();
    }
    Some(node)
}

/// Nodes for a new `ERROR` node; existing `ERROR` nodes are opened up.
fn flatten_errors(nodes: impl IntoIterator<Item = GreenNode>) -> Vec<GreenNode> {
    let mut out = Vec::new();
    for node in nodes {
        if node.is_error() && !node.is_leaf() {
            out.extend(node.children().iter().map(|c| c.node().clone()));
        } else {
            out.push(node);
        }
    }
    out
}
