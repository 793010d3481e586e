//! Grammars and assertions shared by the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use fru_grammar::{choice, lit, prec_left, repeat, seq, sym, GrammarBuilder, Language, TokenPattern};
use fru_syntax::{InputEdit, Tree};

fn compile(g: &GrammarBuilder) -> Language {
    Language::new(g.build().expect("grammar builds")).expect("table loads")
}

/// Arithmetic over identifiers and numbers: `+` and `-` bind looser than
/// `*`, all left-associative, with parentheses.
pub fn arith() -> Language {
    let mut g = GrammarBuilder::new("arith");
    g.token("num", TokenPattern::Regex("[0-9a-z]+".into()))
        .token("_ws", TokenPattern::Regex(r"\s+".into()))
        .extra("_ws")
        .rule("program", sym("_expr"))
        .rule(
            "_expr",
            choice([sym("num"), sym("sum"), sym("product"), sym("paren")]),
        )
        .rule(
            "sum",
            prec_left(1, seq([sym("_expr"), choice([lit("+"), lit("-")]), sym("_expr")])),
        )
        .rule("product", prec_left(2, seq([sym("_expr"), lit("*"), sym("_expr")])))
        .rule("paren", seq([lit("("), sym("_expr"), lit(")")]));
    compile(&g)
}

/// `let` statements, `stmt` being a recovery boundary.
pub fn statements() -> Language {
    let mut g = GrammarBuilder::new("statements");
    g.token("ident", TokenPattern::Regex("[a-z_][a-z0-9_]*".into()))
        .token("_ws", TokenPattern::Regex(r"\s+".into()))
        .extra("_ws")
        .rule("program", repeat(sym("stmt")))
        .rule(
            "stmt",
            seq([lit("let"), sym("ident"), lit("="), sym("ident"), lit(";")]),
        )
        .recovery_boundary("stmt");
    compile(&g)
}

/// Leaves are contiguous and cover exactly `source`.
pub fn assert_covers(tree: &Tree, source: &str) {
    let mut pos = 0u32;
    for entry in tree.leaves() {
        assert_eq!(entry.start_byte, pos, "gap or overlap before a leaf in {tree:?}");
        pos += entry.node.len();
    }
    assert_eq!(pos as usize, source.len(), "leaves do not reach the end of {source:?}");
    assert_eq!(tree.len() as usize, source.len());
}

/// The edit turning `old` into `new`, from their common prefix and suffix.
pub fn diff(old: &str, new: &str) -> InputEdit {
    let prefix = old
        .bytes()
        .zip(new.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old
        .bytes()
        .rev()
        .zip(new.bytes().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();
    let start = u32::try_from(prefix).unwrap();
    let old_end = u32::try_from(old.len() - suffix).unwrap();
    InputEdit::replace(old, start, old_end, &new[prefix..new.len() - suffix])
}
