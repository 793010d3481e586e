//! Small grammars shared by the driver, lexer and reuse tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use fru_grammar::{
    choice, field, lit, optional, prec_left, repeat, seq, sym, ExternalScanner, GrammarBuilder, Language,
    ScannerState, StateId, Symbol, TokenPattern,
};
use fru_lexer_core::{Cursor, Point};
use fru_syntax::{GreenNode, LeafInfo, NodeFlags};

fn compile(g: &GrammarBuilder) -> Language {
    Language::new(g.build().expect("fixture grammar builds")).expect("fixture table loads")
}

/// `program := _expr` over `num`, `+` (1, left) and `*` (2, left), with
/// whitespace and `#` comments as extras. Both operators name their operands
/// `left` and `right`; `sum` also names its `operator`.
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
                seq([
                    field("left", sym("_expr")),
                    field("operator", lit("+")),
                    field("right", sym("_expr")),
                ]),
            ),
        )
        .rule(
            "product",
            prec_left(
                2,
                seq([field("left", sym("_expr")), lit("*"), field("right", sym("_expr"))]),
            ),
        );
    compile(&g)
}

/// Statements inside optional braces; `stmt` is a recovery boundary.
///
/// `program := repeat(_item)`, `_item := stmt | block`,
/// `block := "{" repeat(_item) "}"`, `stmt := "let" ident "=" ident ";"`.
pub(crate) fn statements() -> Language {
    let mut g = GrammarBuilder::new("statements");
    g.token("ident", TokenPattern::Regex("[a-z_][a-z0-9_]*".into()))
        .token("_ws", TokenPattern::Regex(r"\s+".into()))
        .extra("_ws")
        .rule("program", repeat(sym("_item")))
        .rule("_item", choice([sym("stmt"), sym("block")]))
        .rule("block", seq([lit("{"), repeat(sym("_item")), lit("}")]))
        .rule(
            "stmt",
            seq([lit("let"), sym("ident"), lit("="), sym("ident"), lit(";")]),
        )
        .recovery_boundary("stmt")
        .recovery_boundary("block");
    compile(&g)
}

/// `sum := _expr "+" _expr` without precedence; the conflict is declared, so
/// `a+b+c` is genuinely ambiguous.
pub(crate) fn ambiguous_sums() -> Language {
    let mut g = GrammarBuilder::new("ambiguous_sums");
    g.token("num", TokenPattern::Regex("[0-9a-z]+".into()))
        .rule("program", sym("_expr"))
        .rule("_expr", choice([sym("num"), sym("sum")]))
        .rule("sum", seq([sym("_expr"), lit("+"), sym("_expr")]))
        .conflict(&["sum"]);
    compile(&g)
}

/// Words and heredocs. `<<TAG` opens a heredoc whose body runs until a line
/// that is exactly `TAG`; both tokens come from [`Heredoc`].
pub(crate) fn heredocs() -> Language {
    let mut g = GrammarBuilder::new("heredocs");
    g.token("word", TokenPattern::Regex("[a-z]+".into()))
        .token("_ws", TokenPattern::Regex(r"\s+".into()))
        .external("heredoc_start")
        .external("heredoc_body")
        .extra("_ws")
        .rule("program", repeat(choice([sym("word"), sym("heredoc")])))
        .rule(
            "heredoc",
            seq([sym("heredoc_start"), optional(sym("heredoc_body"))]),
        );
    Language::new(g.build().expect("fixture grammar builds"))
        .expect("fixture table loads")
        .with_external_scanner(|| Box::new(Heredoc::default()))
}

/// Remembers the open heredoc tag between the two tokens.
#[derive(Default)]
pub(crate) struct Heredoc {
    tag: Vec<u8>,
}

impl ExternalScanner for Heredoc {
    fn scan(&mut self, cursor: &mut Cursor<'_>, valid: &[bool]) -> Option<usize> {
        if valid.get(1).copied().unwrap_or(false) && !self.tag.is_empty() {
            let start = cursor.pos();
            while !cursor.is_eof() {
                if cursor.current() == b'\n' {
                    cursor.advance();
                    let line = cursor.pos();
                    cursor.eat_until(b'\n');
                    if cursor.slice(line, cursor.pos()) == self.tag.as_slice() {
                        self.tag.clear();
                        return Some(1);
                    }
                } else {
                    cursor.eat_until(b'\n');
                }
            }
            return (cursor.pos() > start).then_some(1);
        }
        if valid.first().copied().unwrap_or(false) && cursor.eat(b"<<") {
            let start = cursor.pos();
            cursor.eat_while(|b| b.is_ascii_uppercase());
            if cursor.pos() == start {
                return None;
            }
            self.tag = cursor.slice(start, cursor.pos()).to_vec();
            return Some(0);
        }
        None
    }

    fn checkpoint(&self) -> ScannerState {
        ScannerState::new(&self.tag)
    }

    fn restore(&mut self, state: &ScannerState) {
        self.tag.clear();
        self.tag.extend_from_slice(state.as_bytes());
    }
}

pub(crate) fn symbol(language: &Language, name: &str) -> Symbol {
    language
        .symbol_for_name(name, true)
        .or_else(|| language.symbol_for_name(name, false))
        .unwrap_or_else(|| panic!("no symbol `{name}`"))
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
