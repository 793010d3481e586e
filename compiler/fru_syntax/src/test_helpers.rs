//! Shared fixtures for the syntax tree tests.
//!
//! Trees are assembled by hand from green leaves, the way the parser would
//! build them for a tiny `sum := num '+' num` language.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use fru_grammar::{
    choice, field, lit, prec_left, seq, sym, GrammarBuilder, Language, ScannerState, StateId, Symbol,
    TokenPattern,
};
use fru_lexer_core::Point;

use crate::{GreenNode, LeafInfo, NodeFlags};

/// `program := _expr`, `_expr := num | sum | product` with the usual
/// precedences, plus `num`, whitespace and `#` comments. `sum` names its
/// operands `left` and `right`.
pub(crate) fn sums() -> Language {
    let mut g = GrammarBuilder::new("sums");
    g.token("num", TokenPattern::Regex("[0-9a-z]+".into()))
        .token("_ws", TokenPattern::Regex(r"\s+".into()))
        .token("comment", TokenPattern::Regex("#[^\n]*".into()))
        .extra("_ws")
        .extra("comment")
        .rule("program", sym("_expr"))
        .rule("_expr", choice([sym("num"), sym("sum"), sym("product")]))
        .rule(
            "sum",
            prec_left(
                1,
                seq([field("left", sym("_expr")), lit("+"), field("right", sym("_expr"))]),
            ),
        )
        .rule("product", prec_left(2, seq([sym("_expr"), lit("*"), sym("_expr")])));
    Language::new(g.build().expect("fixture grammar builds")).expect("fixture table loads")
}

pub(crate) fn symbol(language: &Language, name: &str) -> Symbol {
    language
        .symbol_for_name(name, true)
        .or_else(|| language.symbol_for_name(name, false))
        .unwrap_or_else(|| panic!("no symbol {name}"))
}

/// A leaf for `text`, as the lexer would produce it.
pub(crate) fn leaf(language: &Language, name: &str, text: &str) -> GreenNode {
    let symbol = symbol(language, name);
    #[allow(clippy::cast_possible_truncation, reason = "test text is short")]
    let len = text.len() as u32;
    GreenNode::leaf(LeafInfo {
        symbol,
        flags: NodeFlags::for_symbol(language, symbol),
        len,
        extent: Point::extent_of(text.as_bytes()),
        parse_state: StateId(0),
        lookahead_bytes: 1,
        scanner_before: ScannerState::EMPTY,
        scanner_after: ScannerState::EMPTY,
    })
}

pub(crate) fn node(language: &Language, name: &str, children: Vec<GreenNode>) -> GreenNode {
    let symbol = symbol(language, name);
    GreenNode::node(
        symbol,
        NodeFlags::for_symbol(language, symbol),
        StateId(0),
        children,
        1,
    )
}

/// `a+b` as the parser builds it, with `left` and `right` on the operands.
pub(crate) fn a_plus_b_with_fields(language: &Language) -> GreenNode {
    let left = language.field_for_name("left").expect("sums has a left field");
    let right = language.field_for_name("right").expect("sums has a right field");
    let symbol = symbol(language, "sum");
    let sum = GreenNode::node_with_fields(
        symbol,
        NodeFlags::for_symbol(language, symbol),
        StateId(0),
        vec![
            (leaf(language, "num", "a"), Some(left)),
            (leaf(language, "+", "+"), None),
            (leaf(language, "num", "b"), Some(right)),
        ],
        1,
    );
    node(language, "program", vec![sum])
}

/// The tree for `a+b`: `(program (sum (num) "+" (num)))`.
pub(crate) fn a_plus_b(language: &Language) -> GreenNode {
    let sum = node(
        language,
        "sum",
        vec![
            leaf(language, "num", "a"),
            leaf(language, "+", "+"),
            leaf(language, "num", "b"),
        ],
    );
    node(language, "program", vec![sum])
}

/// The tree for `a + b\n# note\n* c`, with whitespace and a comment:
/// `(program (product (sum (num) "+" (num)) (comment) "*" (num)))`.
pub(crate) fn spaced(language: &Language) -> GreenNode {
    let sum = node(
        language,
        "sum",
        vec![
            leaf(language, "num", "a"),
            leaf(language, "_ws", " "),
            leaf(language, "+", "+"),
            leaf(language, "_ws", " "),
            leaf(language, "num", "b"),
        ],
    );
    let product = node(
        language,
        "product",
        vec![
            sum,
            leaf(language, "_ws", "\n"),
            leaf(language, "comment", "# note"),
            leaf(language, "_ws", "\n"),
            leaf(language, "*", "*"),
            leaf(language, "_ws", " "),
            leaf(language, "num", "c"),
        ],
    );
    node(language, "program", vec![product])
}

pub(crate) const SPACED: &str = "a + b\n# note\n* c";
