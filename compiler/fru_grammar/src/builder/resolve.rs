//! Action tables and conflict resolution.
//!
//! For each state and lookahead the candidate actions are the shift (if a
//! transition on the token exists) and one reduce per completed item whose
//! lookahead set contains it. Conflicts are resolved in this order:
//!
//! 1. Reduce/reduce: keep the reductions with the highest precedence.
//! 2. Shift/reduce: compare the reduction's precedence with the highest
//!    precedence among the items that shift the token; on a tie, left
//!    associativity reduces and right associativity shifts.
//! 3. Anything still unresolved is kept as a multi-action entry (explored
//!    by the driver in parallel) when the rules involved are declared as an
//!    expected conflict, and otherwise resolved towards the shift (or the
//!    earliest rule) with a warning.

use smallvec::SmallVec;

use super::flatten::Bnf;
use super::lr::{Analysis, Automaton, Item};
use crate::symbol::{RuleId, StateId, Symbol, SymbolSet};
use crate::table::{ActionList, Associativity, ParseAction};

/// A state after resolution, before minimization.
pub(super) struct ResolvedState {
    /// Kernel item cores; states are only merged with same-core states.
    pub core: Vec<Item>,
    pub actions: Vec<(Symbol, ActionList)>,
    pub gotos: Vec<(Symbol, StateId)>,
    pub recoverable: bool,
}

#[derive(Default)]
pub(super) struct ConflictCounts {
    pub kept: usize,
    pub defaulted: usize,
}

#[allow(clippy::cast_possible_truncation, reason = "state and rule counts are bounded by u16")]
pub(super) fn resolve(
    analysis: &Analysis<'_>,
    automaton: &Automaton,
    counts: &mut ConflictCounts,
) -> Vec<ResolvedState> {
    let bnf = analysis.bnf;
    let augmented = analysis.augmented_production();
    let mut out = Vec::with_capacity(automaton.states.len());

    for (index, set) in automaton.states.iter().enumerate() {
        let mut actions: Vec<(Symbol, ActionList)> = Vec::new();
        let mut gotos = Vec::new();

        // Reductions per lookahead, in production order.
        let mut reductions: Vec<(Symbol, SmallVec<[u32; 2]>)> = Vec::new();
        for (item, lookahead) in &set.closure {
            if analysis.next_symbol(*item).is_some() {
                continue;
            }
            for token in lookahead.iter() {
                match reductions.iter_mut().find(|(t, _)| *t == token) {
                    Some((_, list)) => list.push(item.production),
                    None => reductions.push((token, SmallVec::from_slice(&[item.production]))),
                }
            }
        }

        let mut tokens: SymbolSet = reductions.iter().map(|(t, _)| *t).collect();
        for &(symbol, target) in &set.transitions {
            if bnf.is_terminal(symbol) {
                tokens.insert(symbol);
            } else {
                gotos.push((symbol, StateId(target as u16)));
            }
        }

        for token in tokens.iter() {
            let shift = set
                .transitions
                .iter()
                .find(|(s, _)| *s == token)
                .map(|&(_, target)| StateId(target as u16));
            let mut reduces: SmallVec<[u32; 2]> = reductions
                .iter()
                .find(|(t, _)| *t == token)
                .map(|(_, list)| list.clone())
                .unwrap_or_default();
            reduces.sort_unstable();
            reduces.dedup();

            let list = if reduces.contains(&augmented) {
                SmallVec::from_slice(&[ParseAction::Accept])
            } else {
                resolve_token(bnf, set, analysis, index, token, shift, reduces, counts)
            };
            if !list.is_empty() {
                actions.push((token, list));
            }
        }

        let recoverable = set.closure.iter().any(|(item, _)| {
            item.dot == 0
                && bnf
                    .productions
                    .get(item.production as usize)
                    .is_some_and(|p| bnf.boundaries.contains(bnf.origin[p.lhs.index()]))
        });

        out.push(ResolvedState {
            core: set.kernel.iter().map(|(item, _)| *item).collect(),
            actions,
            gotos,
            recoverable,
        });
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn resolve_token(
    bnf: &Bnf,
    set: &super::lr::ItemSet,
    analysis: &Analysis<'_>,
    state: usize,
    token: Symbol,
    shift: Option<StateId>,
    mut reduces: SmallVec<[u32; 2]>,
    counts: &mut ConflictCounts,
) -> ActionList {
    let production = |p: u32| &bnf.productions[p as usize];

    // Shifting items: the token follows the dot.
    let shifting: SmallVec<[Item; 4]> = set
        .closure
        .iter()
        .map(|(item, _)| *item)
        .filter(|item| analysis.next_symbol(*item) == Some(token))
        .collect();
    let shift_precedence = shifting
        .iter()
        .filter_map(|item| bnf.productions.get(item.production as usize))
        .map(|p| p.precedence)
        .max()
        .unwrap_or(0);

    // Reduce/reduce by precedence.
    if reduces.len() > 1 {
        let best = reduces
            .iter()
            .map(|&p| production(p).precedence)
            .max()
            .unwrap_or(0);
        reduces.retain(|p| production(*p).precedence == best);
    }

    let mut keep_shift = shift.is_some();
    if shift.is_some() {
        reduces.retain(|p| {
            let rule = production(*p);
            match rule.precedence.cmp(&shift_precedence) {
                std::cmp::Ordering::Less => false,
                std::cmp::Ordering::Greater => {
                    keep_shift = false;
                    true
                }
                std::cmp::Ordering::Equal => match rule.associativity {
                    Associativity::Left => {
                        keep_shift = false;
                        true
                    }
                    Associativity::Right => false,
                    Associativity::None => true,
                },
            }
        });
    }

    let ambiguous = reduces.len() + usize::from(keep_shift) > 1;
    if ambiguous {
        let mut involved: SymbolSet = reduces
            .iter()
            .map(|&p| bnf.origin[production(p).lhs.index()])
            .collect();
        if keep_shift {
            involved.extend(
                shifting
                    .iter()
                    .filter_map(|item| bnf.productions.get(item.production as usize))
                    .map(|p| bnf.origin[p.lhs.index()]),
            );
        }
        let declared = bnf
            .conflicts
            .iter()
            .any(|allowed| involved.iter().all(|s| allowed.contains(s)));

        if declared {
            counts.kept += 1;
            tracing::debug!(
                state,
                token = %bnf.symbols[token.index()].name,
                actions = reduces.len() + usize::from(keep_shift),
                "keeping declared conflict"
            );
        } else {
            counts.defaulted += 1;
            let names: Vec<&str> = involved
                .iter()
                .map(|s| bnf.symbols[s.index()].name.as_str())
                .collect();
            tracing::warn!(
                state,
                token = %bnf.symbols[token.index()].name,
                rules = ?names,
                "unresolved conflict, preferring {}",
                if keep_shift { "shift" } else { "the earliest rule" }
            );
            if keep_shift {
                reduces.clear();
            } else {
                reduces.truncate(1);
            }
        }
    }

    let mut list = ActionList::new();
    if keep_shift {
        if let Some(state) = shift {
            list.push(ParseAction::Shift { state });
        }
    }
    list.extend(reduces.into_iter().map(reduce_action));
    list
}

#[allow(clippy::cast_possible_truncation, reason = "rule count is bounded by u16")]
fn reduce_action(production: u32) -> ParseAction {
    ParseAction::Reduce {
        rule: RuleId(production as u16),
    }
}
