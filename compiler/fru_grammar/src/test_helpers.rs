//! Small grammars and a token-level driver for table tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::{
    choice, lit, prec_left, prec_right, seq, sym, GrammarBuilder, GrammarTable, Language,
    ParseAction, Symbol, TokenPattern,
};

/// `program := _expr` over numbers with `+` (1, left), `*` (2, left) and
/// `^` (3, right); whitespace is a hidden extra.
pub fn arithmetic() -> GrammarTable {
    let mut g = GrammarBuilder::new("arith");
    g.token("num", TokenPattern::Regex("[0-9]+".into()))
        .token("_ws", TokenPattern::Regex(r"\s+".into()))
        .extra("_ws")
        .rule("program", sym("_expr"))
        .rule(
            "_expr",
            choice([sym("num"), sym("sum"), sym("product"), sym("power")]),
        )
        .rule("sum", prec_left(1, seq([sym("_expr"), lit("+"), sym("_expr")])))
        .rule("product", prec_left(2, seq([sym("_expr"), lit("*"), sym("_expr")])))
        .rule("power", prec_right(3, seq([sym("_expr"), lit("^"), sym("_expr")])));
    g.build().expect("arithmetic grammar builds")
}

/// Look up a symbol: named rules/tokens by name, literals by text.
pub fn symbol(language: &Language, name: &str) -> Symbol {
    language
        .symbol_for_name(name, true)
        .or_else(|| language.symbol_for_name(name, false))
        .unwrap_or_else(|| panic!("no symbol `{name}`"))
}

/// Drive the table over a token sequence, always taking the preferred
/// action. Returns `(rule name, tokens consumed)` for every visible
/// reduction, or the index of the token that had no action.
pub fn drive(language: &Language, tokens: &[&str]) -> Result<Vec<(String, usize)>, usize> {
    let input: Vec<Symbol> = tokens.iter().map(|t| symbol(language, t)).collect();
    let mut stack = vec![language.start_state()];
    let mut reductions = Vec::new();
    let mut pos = 0;
    loop {
        let lookahead = input.get(pos).copied().unwrap_or(Symbol::END);
        let state = *stack.last().unwrap();
        match language.actions(state, lookahead).first() {
            Some(ParseAction::Shift { state }) => {
                stack.push(*state);
                pos += 1;
            }
            Some(ParseAction::Reduce { rule }) => {
                let rule = language.rule(*rule);
                stack.truncate(stack.len() - usize::from(rule.arity));
                let top = *stack.last().unwrap();
                stack.push(language.goto(top, rule.lhs).unwrap());
                if language.is_visible(rule.lhs) {
                    reductions.push((language.symbol_name(rule.lhs).to_owned(), pos));
                }
            }
            Some(ParseAction::Accept) => return Ok(reductions),
            None => return Err(pos),
        }
    }
}
