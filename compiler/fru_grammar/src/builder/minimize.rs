//! Folding canonical LR(1) states back together.
//!
//! Two states with the same kernel core are merged unless some lookahead
//! has different actions in them. Shift and goto targets are compared by
//! the group they end up in, so the partition is refined until no group
//! needs splitting. Lookaheads present in only one state are carried into
//! the merged state (the same widening an LALR table has).

use rustc_hash::FxHashMap;

use super::lr::Item;
use super::resolve::ResolvedState;
use crate::symbol::{StateId, Symbol};
use crate::table::{ActionList, ParseAction, ParseState};

pub(super) fn minimize(states: &[ResolvedState]) -> (Vec<ParseState>, StateId) {
    let mut class = initial_partition(states);

    loop {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut group_of_class: FxHashMap<usize, usize> = FxHashMap::default();
        for (state, &c) in class.iter().enumerate() {
            let g = *group_of_class.entry(c).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[g].push(state);
        }

        let mut next_class = vec![0usize; states.len()];
        let mut count = 0;
        for group in &groups {
            let mut subgroups: Vec<Vec<usize>> = Vec::new();
            for &state in group {
                let slot = subgroups.iter().position(|members| {
                    members
                        .iter()
                        .all(|&other| compatible(&states[state], &states[other], &class))
                });
                match slot {
                    Some(i) => subgroups[i].push(state),
                    None => subgroups.push(vec![state]),
                }
            }
            for members in subgroups {
                for state in members {
                    next_class[state] = count;
                }
                count += 1;
            }
        }

        let stable = count == groups.len();
        class = next_class;
        if stable {
            break;
        }
    }

    renumber(states, &class)
}

fn initial_partition(states: &[ResolvedState]) -> Vec<usize> {
    let mut ids: FxHashMap<&[Item], usize> = FxHashMap::default();
    states
        .iter()
        .map(|s| {
            let next = ids.len();
            *ids.entry(s.core.as_slice()).or_insert(next)
        })
        .collect()
}

fn same_actions(a: &ActionList, b: &ActionList, class: &[usize]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| match (x, y) {
            (ParseAction::Shift { state: s }, ParseAction::Shift { state: t }) => {
                class[s.index()] == class[t.index()]
            }
            _ => x == y,
        })
}

fn compatible(a: &ResolvedState, b: &ResolvedState, class: &[usize]) -> bool {
    let actions_agree = merge_join(&a.actions, &b.actions, |x, y| same_actions(x, y, class));
    let gotos_agree = merge_join(&a.gotos, &b.gotos, |x, y| class[x.index()] == class[y.index()]);
    actions_agree && gotos_agree
}

/// `agree` holds for every key present in both sorted lists.
fn merge_join<T>(a: &[(Symbol, T)], b: &[(Symbol, T)], agree: impl Fn(&T, &T) -> bool) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                if !agree(&a[i].1, &b[j].1) {
                    return false;
                }
                i += 1;
                j += 1;
            }
        }
    }
    true
}

/// Build the merged table, numbering groups by first appearance so the
/// start state (canonical state 0) stays state 0.
#[allow(clippy::cast_possible_truncation, reason = "merged count <= canonical count <= u16::MAX")]
fn renumber(states: &[ResolvedState], class: &[usize]) -> (Vec<ParseState>, StateId) {
    let mut number: FxHashMap<usize, u16> = FxHashMap::default();
    for &c in class {
        let next = number.len() as u16;
        number.entry(c).or_insert(next);
    }
    let id = |canonical: StateId| StateId(number[&class[canonical.index()]]);

    let mut merged: Vec<ParseState> = vec![ParseState::default(); number.len()];
    for (canonical, state) in states.iter().enumerate() {
        let target = &mut merged[usize::from(number[&class[canonical]])];
        target.recoverable |= state.recoverable;
        for (symbol, actions) in &state.actions {
            if target.actions.iter().any(|(s, _)| s == symbol) {
                continue;
            }
            let remapped: ActionList = actions
                .iter()
                .map(|action| match *action {
                    ParseAction::Shift { state } => ParseAction::Shift { state: id(state) },
                    other => other,
                })
                .collect();
            target.actions.push((*symbol, remapped));
        }
        for &(symbol, goto) in &state.gotos {
            if !target.gotos.iter().any(|(s, _)| *s == symbol) {
                target.gotos.push((symbol, id(goto)));
            }
        }
    }
    for state in &mut merged {
        state.actions.sort_by_key(|(s, _)| *s);
        state.gotos.sort_by_key(|(s, _)| *s);
    }
    (merged, StateId(0))
}
