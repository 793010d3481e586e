#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use fru_grammar::{ParseAction, StateId, Symbol};
use fru_syntax::GreenNode;

use super::{combine, merge_versions, simulate, Version};
use crate::test_helpers::{leaf, node, sums, symbol};

fn shift_target(language: &fru_grammar::Language, state: StateId, name: &str) -> StateId {
    match language.actions(state, symbol(language, name)).first() {
        Some(ParseAction::Shift { state }) => *state,
        other => panic!("expected a shift on {name}, got {other:?}"),
    }
}

#[test]
fn test_push_tracks_position() {
    let lang = sums();
    let mut version = Version::new(lang.start_state());
    version.push(leaf(&lang, "num", "ab"), StateId(3));
    version.push(leaf(&lang, "_ws", "\n "), StateId(3));
    assert_eq!(version.position, 5);
    assert_eq!(version.point, fru_lexer_core::Point::new(1, 1));
    assert_eq!(version.state(), StateId(3));
    assert_eq!(version.entries[1].start, 2);
}

#[test]
fn test_pop_children_leaves_trailing_extras() {
    let lang = sums();
    let mut version = Version::new(lang.start_state());
    version.push(leaf(&lang, "_ws", " "), StateId(0));
    version.push(leaf(&lang, "num", "a"), StateId(1));
    version.push(leaf(&lang, "_ws", " "), StateId(1));
    version.push(leaf(&lang, "+", "+"), StateId(2));
    version.push(leaf(&lang, "num", "b"), StateId(3));
    version.push(leaf(&lang, "comment", "# x"), StateId(3));

    let popped = version.pop_children(3);
    let kinds: Vec<&str> = popped
        .children
        .iter()
        .map(|n| lang.symbol_name(n.symbol()))
        .collect();
    assert_eq!(kinds, vec!["num", "_ws", "+", "num"]);
    assert_eq!(popped.trailing.len(), 1);
    assert_eq!(lang.symbol_name(popped.trailing[0].node.symbol()), "comment");
    assert_eq!(popped.start, 1);
    assert_eq!(popped.start_point, fru_lexer_core::Point::new(0, 1));
    // The leading whitespace stays where it was.
    assert_eq!(version.entries.len(), 1);
}

#[test]
fn test_state_stack_skips_transparent_entries() {
    let lang = sums();
    let mut version = Version::new(StateId(0));
    version.push(leaf(&lang, "num", "a"), StateId(4));
    version.push(GreenNode::error(StateId(4), vec![leaf(&lang, "*", "*")], 0), StateId(4));
    version.push(leaf(&lang, "_ws", " "), StateId(4));
    assert_eq!(version.state_stack(), vec![StateId(0), StateId(4)]);
    assert_eq!(version.error_cost(), 2);
    assert!(version.has_content());
}

#[test]
fn test_simulate_follows_preferred_actions() {
    let lang = sums();
    let start = lang.start_state();
    let after_num = shift_target(&lang, start, "num");

    let mut states = vec![start, after_num];
    assert!(simulate(&lang, &mut states, symbol(&lang, "+")));
    // `num` reduced to `_expr`, then `+` shifted.
    assert_eq!(states.len(), 3);

    let mut states = vec![start, after_num];
    assert!(simulate(&lang, &mut states, Symbol::END));

    let mut states = vec![start];
    assert!(!simulate(&lang, &mut states, symbol(&lang, "+")));
    assert_eq!(states, vec![start]);
}

#[test]
fn test_combine_merges_as_deep_as_possible() {
    let lang = sums();
    let left = node(
        &lang,
        "sum",
        vec![
            node(&lang, "product", vec![leaf(&lang, "num", "a"), leaf(&lang, "*", "*"), leaf(&lang, "num", "b")]),
            leaf(&lang, "+", "+"),
            leaf(&lang, "num", "c"),
        ],
    );
    let right = node(
        &lang,
        "sum",
        vec![
            node(&lang, "sum", vec![leaf(&lang, "num", "a"), leaf(&lang, "+", "+"), leaf(&lang, "num", "b")]),
            leaf(&lang, "+", "+"),
            leaf(&lang, "num", "c"),
        ],
    );
    let merged = combine(&left, &right);
    assert!(!merged.is_ambiguous());
    let first = merged.children()[0].node();
    assert!(first.is_ambiguous());
    assert_eq!(first.child_count(), 2);
    assert_eq!(lang.symbol_name(first.symbol()), "product");
    assert_eq!(merged.len(), 5);

    assert!(combine(&left, &left.clone()).ptr_eq(&left));
}

#[test]
fn test_merge_versions_folds_equivalent_stacks() {
    let lang = sums();
    let mut a = Version::new(StateId(0));
    a.push(node(&lang, "sum", vec![leaf(&lang, "num", "ab")]), StateId(2));
    let mut b = Version::new(StateId(0));
    b.push(
        node(&lang, "sum", vec![leaf(&lang, "num", "a"), leaf(&lang, "num", "b")]),
        StateId(2),
    );
    let mut c = Version::new(StateId(0));
    c.push(leaf(&lang, "num", "ab"), StateId(5));

    let merged = merge_versions(vec![a, b, c], 6);
    assert_eq!(merged.len(), 2);
    assert!(merged[0].entries[0].node.is_ambiguous());
    assert!(merged[0].entries[0].node.is_fragile());
    assert_eq!(merged[1].state(), StateId(5));

    let capped = merge_versions(merged, 1);
    assert_eq!(capped.len(), 1);
}

#[test]
fn test_cheaper_version_is_preferred_on_merge() {
    let lang = sums();
    let error = GreenNode::error(StateId(0), vec![leaf(&lang, "num", "ab")], 0);
    let mut costly = Version::new(StateId(0));
    costly.push(node(&lang, "sum", vec![error]), StateId(2));
    let mut clean = Version::new(StateId(0));
    clean.push(node(&lang, "sum", vec![leaf(&lang, "num", "ab")]), StateId(2));

    let merged = merge_versions(vec![costly, clean], 6);
    assert_eq!(merged.len(), 1);
    let top = &merged[0].entries[0].node;
    assert!(!top.is_ambiguous());
    let inner = top.children()[0].node();
    assert!(inner.is_ambiguous());
    // The error-free interpretation comes first.
    assert!(!inner.children()[0].node().has_error());
    assert_eq!(top.error_cost(), 0);
}
