#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use fru_syntax::{GreenNode, InputEdit, Tree};

use super::ReuseCursor;
use crate::test_helpers::{leaf, node, sums};

/// `a + b*c` as `(program (sum (num) "+" (product (num) "*" (num))))`.
fn tree() -> Tree {
    let lang = sums();
    let product = node(
        &lang,
        "product",
        vec![leaf(&lang, "num", "b"), leaf(&lang, "*", "*"), leaf(&lang, "num", "c")],
    );
    let sum = node(
        &lang,
        "sum",
        vec![
            leaf(&lang, "num", "a"),
            leaf(&lang, "_ws", " "),
            leaf(&lang, "+", "+"),
            leaf(&lang, "_ws", " "),
            product,
        ],
    );
    let root = node(&lang, "program", vec![sum]);
    Tree::new(root, lang)
}

fn kind(tree: &Tree, node: &GreenNode) -> String {
    tree.language().symbol_name(node.symbol()).to_owned()
}

#[test]
fn test_outermost_node_first() {
    let tree = tree();
    let mut cursor = ReuseCursor::new(tree.root().clone());
    let first = cursor.node_at(0).unwrap();
    assert!(first.ptr_eq(tree.root()));
    cursor.descend();
    assert_eq!(kind(&tree, &cursor.node_at(0).unwrap()), "sum");
    cursor.descend();
    assert_eq!(kind(&tree, &cursor.node_at(0).unwrap()), "num");
}

#[test]
fn test_seek_forward_descends_into_straddling_nodes() {
    let tree = tree();
    let mut cursor = ReuseCursor::new(tree.root().clone());
    // `product` starts at 4, inside `program` and `sum`.
    let product = cursor.node_at(4).unwrap();
    assert_eq!(kind(&tree, &product), "product");
    assert_eq!(product.len(), 3);
    // Nothing starts at 5 except the `*` leaf.
    let star = cursor.leaf_at(5).unwrap();
    assert_eq!(kind(&tree, &star), "*");
    assert!(cursor.stats().descended >= 3);
}

#[test]
fn test_advance_moves_past_reused_node() {
    let tree = tree();
    let mut cursor = ReuseCursor::new(tree.root().clone());
    cursor.leaf_at(0).unwrap();
    cursor.advance();
    let ws = cursor.node_at(1).unwrap();
    assert_eq!(kind(&tree, &ws), "_ws");
    cursor.advance();
    cursor.advance();
    cursor.advance();
    let product = cursor.node_at(4).unwrap();
    assert_eq!(kind(&tree, &product), "product");
    cursor.advance();
    assert!(cursor.node_at(7).is_none());
}

#[test]
fn test_query_inside_a_leaf_finds_nothing() {
    let lang = sums();
    let root = node(&lang, "program", vec![leaf(&lang, "num", "abc")]);
    let tree = Tree::new(root, lang);
    let mut cursor = ReuseCursor::new(tree.root().clone());
    assert!(cursor.node_at(1).is_none());
    assert!(cursor.node_at(3).is_none());
}

#[test]
fn test_gap_after_insertion() {
    let tree = tree();
    // Insert "xy" right after `a`: the old `a` leaf keeps its place and the
    // next leaf moves to 3, leaving a gap the parser has to fill.
    let edited = tree.edit(&InputEdit::replace("a + b*c", 1, 1, "xy"));
    let mut cursor = ReuseCursor::new(edited.root().clone());
    let a = cursor.leaf_at(0).unwrap();
    assert!(!a.has_changes());
    cursor.advance();
    assert!(cursor.node_at(1).is_none());
    let ws = cursor.node_at(3).unwrap();
    assert_eq!(kind(&edited, &ws), "_ws");
}

#[test]
fn test_only_preferred_alternative_is_walked() {
    let lang = sums();
    let preferred = node(&lang, "sum", vec![leaf(&lang, "num", "ab")]);
    let other = node(&lang, "sum", vec![leaf(&lang, "num", "a"), leaf(&lang, "num", "b")]);
    let root = node(
        &lang,
        "program",
        vec![GreenNode::ambiguous(preferred, vec![other]), leaf(&lang, "_ws", " ")],
    );
    let tree = Tree::new(root, lang);
    let mut cursor = ReuseCursor::new(tree.root().clone());
    let leaf = cursor.leaf_at(0).unwrap();
    assert_eq!(leaf.len(), 2);
    cursor.advance();
    let ws = cursor.node_at(2).unwrap();
    assert_eq!(kind(&tree, &ws), "_ws");
}
