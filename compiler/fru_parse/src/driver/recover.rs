//! Error recovery.
//!
//! Runs on the cheapest version when no version can continue. Strategies, in
//! order:
//!
//! 1. Insert a zero-width `MISSING` token when that makes the lookahead
//!    valid. Only terminals the current state can shift are candidates.
//! 2. In a recoverable state, skip tokens until one is valid there.
//! 3. Otherwise skip the lookahead into an `ERROR` node, merging it with an
//!    `ERROR` node just before it. After [`MAX_SKIPS`] skips in a row, pop
//!    back to the nearest recoverable state and continue as in 2.
//! 4. At end of input, pop entries into an `ERROR` node until the exposed
//!    state accepts end of input, unless a `MISSING` token is cheaper.
//! 5. Otherwise wrap everything in the start symbol.
//!
//! Every strategy either consumes input, inserts a token that the next round
//! can shift, or finishes the parse, so recovery always terminates.

use fru_grammar::{ParseAction, Symbol};
use fru_syntax::{GreenNode, NodeFlags};

use super::{flatten_errors, Driver};
use crate::error::ParseError;
use crate::lexer::Token;
use crate::stack::{simulate, Version};

/// Consecutive skipped tokens before recovery gives up on the current state.
const MAX_SKIPS: u32 = 16;

pub(super) enum Recovered {
    /// The version can continue parsing.
    Resume(Version),
    /// The parse is over with this root.
    Done(GreenNode),
}

impl Driver<'_> {
    pub(super) fn recover(&mut self, mut version: Version) -> Result<Recovered, ParseError> {
        self.stats.recoveries += 1;
        let token = self.lookahead(&mut version);
        tracing::debug!(
            position = version.position,
            state = version.state().0,
            token = self.language.symbol_name(token.symbol),
            skips = version.skips,
            "recovering"
        );

        if token.is_end() {
            return Ok(self.recover_at_end(version, &token));
        }
        if !token.is_lex_error() && self.insert_missing(&mut version, &token) {
            return Ok(Recovered::Resume(version));
        }
        if self.language.is_recoverable(version.state()) {
            self.fast_forward(&mut version)?;
            return Ok(Recovered::Resume(version));
        }

        self.skip_token(&mut version, token)?;
        if version.skips >= MAX_SKIPS {
            tracing::debug!(position = version.position, "too many skipped tokens; unwinding");
            self.pop_to_recoverable(&mut version);
            self.fast_forward(&mut version)?;
            version.skips = 0;
        }
        Ok(Recovered::Resume(version))
    }

    fn recover_at_end(&mut self, mut version: Version, token: &Token) -> Recovered {
        if !version.has_content() {
            // Nothing but extras: an empty document, not an error.
            let children = version.entries.into_iter().map(|e| e.node).collect();
            return Recovered::Done(self.start_node(children));
        }

        let pop = self.cheapest_pop(&version);
        let missing_is_cheaper = pop.map_or(true, |(_, cost)| cost > 1);
        if missing_is_cheaper && self.insert_missing(&mut version, token) {
            return Recovered::Resume(version);
        }
        if let Some((count, cost)) = pop {
            tracing::debug!(count, cost, "wrapping unfinished input in an error node");
            self.pop_into_error(&mut version, count);
            return Recovered::Resume(version);
        }
        tracing::debug!("no recovery applies; wrapping the whole input");
        Recovered::Done(self.wrap_everything(version))
    }

    /// Insert a `MISSING` terminal after which `token` can be shifted (or
    /// accepted), applying the reductions it triggers.
    fn insert_missing(&mut self, version: &mut Version, token: &Token) -> bool {
        let language = self.language;
        let states = version.state_stack();
        let candidate = language.valid_tokens(version.state()).iter().find(|&symbol| {
            if symbol == Symbol::END || language.is_extra(symbol) {
                return false;
            }
            let mut trial = states.clone();
            simulate(language, &mut trial, symbol) && simulate(language, &mut trial, token.symbol)
        });
        let Some(symbol) = candidate else {
            return false;
        };

        loop {
            match language.actions(version.state(), symbol).first() {
                Some(&ParseAction::Reduce { rule }) => {
                    if !self.reduce(version, rule, token) {
                        return false;
                    }
                }
                Some(&ParseAction::Shift { state }) => {
                    tracing::debug!(
                        position = version.position,
                        symbol = language.symbol_name(symbol),
                        "inserting missing token"
                    );
                    let missing = GreenNode::missing(
                        symbol,
                        NodeFlags::for_symbol(language, symbol),
                        version.state(),
                        version.scanner.clone(),
                    );
                    version.push(missing, state);
                    return true;
                }
                Some(ParseAction::Accept) | None => return false,
            }
        }
    }

    /// Skip tokens until one can be shifted from the current stack, or the
    /// input ends.
    fn fast_forward(&mut self, version: &mut Version) -> Result<(), ParseError> {
        loop {
            let token = self.lookahead(version);
            if token.is_end() || simulate(self.language, &mut version.state_stack(), token.symbol) {
                return Ok(());
            }
            if self.language.is_extra(token.symbol) {
                self.shift_extra(version, &token)?;
            } else {
                self.skip_token(version, token)?;
            }
        }
    }

    /// Consume `token` into an `ERROR` node. An `ERROR` node on top of the
    /// stack (possibly followed by extras) absorbs it instead.
    fn skip_token(&mut self, version: &mut Version, token: Token) -> Result<(), ParseError> {
        self.budget.tick()?;
        let open_error = version
            .entries
            .iter()
            .rposition(|e| !e.node.is_extra())
            .filter(|&i| {
                let node = &version.entries[i].node;
                node.is_error() && !node.is_leaf()
            });

        let mut children = Vec::new();
        let (start, start_point) = match open_error {
            Some(index) => {
                let absorbed = version.entries.split_off(index);
                let first = (absorbed[0].start, absorbed[0].start_point);
                children = flatten_errors(absorbed.into_iter().map(|e| e.node));
                first
            }
            None => (version.position, version.point),
        };
        let state = version.state();
        children.push(token.to_leaf(self.language, state));
        tracing::trace!(
            start = token.start,
            len = token.len,
            symbol = self.language.symbol_name(token.symbol),
            "skipped token"
        );

        let error = GreenNode::error(state, children, token.lookahead_bytes);
        version.push_at(error, state, start, start_point);
        version.scanner = token.scanner_after;
        version.lookahead = None;
        version.skips += 1;
        Ok(())
    }

    /// Pop entries down to the nearest recoverable state into one `ERROR`
    /// node.
    fn pop_to_recoverable(&mut self, version: &mut Version) {
        let language = self.language;
        let keep = version
            .entries
            .iter()
            .rposition(|e| !e.is_transparent() && language.is_recoverable(e.state))
            .map_or(0, |i| i + 1);
        let popped = version.entries.split_off(keep);
        let Some(first) = popped.first() else {
            return;
        };
        let (start, start_point) = (first.start, first.start_point);
        let children = flatten_errors(popped.into_iter().map(|e| e.node));
        let state = version.state();
        version.push_at(GreenNode::error(state, children, 0), state, start, start_point);
    }

    /// The fewest non-transparent entries to pop so the exposed state can
    /// handle end of input, and the number of leaves that would be popped.
    fn cheapest_pop(&self, version: &Version) -> Option<(usize, u32)> {
        let states = version.state_stack();
        let mut cost = 0u32;
        let mut count = 0usize;
        for entry in version.entries.iter().rev() {
            cost = cost.saturating_add(entry.node.leaf_count());
            if entry.is_transparent() {
                continue;
            }
            count += 1;
            let mut remaining = states[..states.len() - count].to_vec();
            if simulate(self.language, &mut remaining, Symbol::END) {
                return Some((count, cost));
            }
        }
        None
    }

    /// Pop `count` non-transparent entries (and the transparent ones above
    /// them) into one `ERROR` node.
    fn pop_into_error(&mut self, version: &mut Version, count: usize) {
        let mut remaining = count;
        let mut nodes = Vec::new();
        let (mut start, mut start_point) = (version.position, version.point);
        while remaining > 0 {
            let Some(entry) = version.entries.pop() else {
                break;
            };
            if !entry.is_transparent() {
                remaining -= 1;
            }
            start = entry.start;
            start_point = entry.start_point;
            nodes.push(entry.node);
        }
        nodes.reverse();
        let state = version.state();
        let error = GreenNode::error(state, flatten_errors(nodes), 0);
        version.push_at(error, state, start, start_point);
    }
}
