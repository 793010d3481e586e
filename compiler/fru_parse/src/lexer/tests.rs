#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use fru_grammar::{
    choice, lit, repeat, seq, sym, GrammarBuilder, Language, ParseAction, ScannerState, Symbol,
    TokenPattern,
};
use fru_lexer_core::{Point, SourceBuffer};

use super::Lexer;
use crate::test_helpers::{heredocs, sums, symbol};

fn names(language: &Language, source: &str) -> Vec<String> {
    let buffer = SourceBuffer::new(source);
    let mut lexer = Lexer::new(language, &buffer);
    let mut pos = 0;
    let mut out = Vec::new();
    loop {
        let token = lexer.lex(pos, language.start_state(), &ScannerState::EMPTY);
        if token.is_end() {
            return out;
        }
        out.push(language.symbol_name(token.symbol).to_owned());
        pos = token.end();
    }
}

#[test]
fn test_extras_are_always_valid() {
    let lang = sums();
    let buffer = SourceBuffer::new("  # hi\n1");
    let mut lexer = Lexer::new(&lang, &buffer);
    let ws = lexer.lex(0, lang.start_state(), &ScannerState::EMPTY);
    assert_eq!(ws.symbol, symbol(&lang, "_ws"));
    assert_eq!(ws.len, 2);
    let comment = lexer.lex(2, lang.start_state(), &ScannerState::EMPTY);
    assert_eq!(comment.symbol, symbol(&lang, "comment"));
    assert_eq!(comment.end(), 6);
    assert_eq!(lexer.lexed(), 2);
}

#[test]
fn test_end_of_input() {
    let lang = sums();
    let buffer = SourceBuffer::new("a\n");
    let mut lexer = Lexer::new(&lang, &buffer);
    let end = lexer.lex(2, lang.start_state(), &ScannerState::EMPTY);
    assert!(end.is_end());
    assert_eq!(end.start, 2);
    assert_eq!(end.lookahead_bytes, 0);
}

#[test]
fn test_literal_beats_pattern_on_equal_length() {
    let mut g = GrammarBuilder::new("words");
    g.token("ident", TokenPattern::Regex("[a-z]+".into()))
        .token("_ws", TokenPattern::Regex(" +".into()))
        .extra("_ws")
        .rule("program", repeat(choice([sym("ident"), lit("let")])));
    let lang = Language::new(g.build().unwrap()).unwrap();
    let buffer = SourceBuffer::new("let letter");
    let mut lexer = Lexer::new(&lang, &buffer);
    let keyword = lexer.lex(0, lang.start_state(), &ScannerState::EMPTY);
    assert_eq!(keyword.symbol, symbol(&lang, "let"));
    assert_eq!(keyword.lookahead_bytes, 1);
    // The longer identifier wins over the keyword prefix.
    let word = lexer.lex(4, lang.start_state(), &ScannerState::EMPTY);
    assert_eq!(word.len, 6);
}

#[test]
fn test_contextual_validity() {
    // `x` is only a keyword after `go`.
    let mut g = GrammarBuilder::new("ctx");
    g.token("name", TokenPattern::Regex("[a-z]+".into()))
        .rule("program", seq([sym("name"), lit("go"), lit("x")]));
    let lang = Language::new(g.build().unwrap()).unwrap();
    let buffer = SourceBuffer::new("x");
    let mut lexer = Lexer::new(&lang, &buffer);
    let first = lexer.lex(0, lang.start_state(), &ScannerState::EMPTY);
    assert_eq!(first.symbol, symbol(&lang, "name"));
}

#[test]
fn test_error_mode_lexes_invalid_tokens() {
    let lang = sums();
    // `*` is not valid at the start, but it is a real token.
    let buffer = SourceBuffer::new("*");
    let mut lexer = Lexer::new(&lang, &buffer);
    let token = lexer.lex(0, lang.start_state(), &ScannerState::EMPTY);
    assert_eq!(token.symbol, symbol(&lang, "*"));
    assert!(!token.is_lex_error());
}

#[test]
fn test_unmatchable_character_is_one_utf8_char() {
    let lang = sums();
    let buffer = SourceBuffer::new("é!");
    let mut lexer = Lexer::new(&lang, &buffer);
    let token = lexer.lex(0, lang.start_state(), &ScannerState::EMPTY);
    assert!(token.is_lex_error());
    assert_eq!(token.symbol, Symbol::ERROR);
    assert_eq!(token.len, 2);
    let leaf = token.to_leaf(&lang, lang.start_state());
    assert!(leaf.is_error());
    assert_eq!(leaf.error_cost(), 1);
}

#[test]
fn test_token_sequence() {
    let lang = sums();
    assert_eq!(
        names(&lang, "ab + 1 # c"),
        vec!["num", "_ws", "+", "_ws", "num", "_ws", "comment"]
    );
}

#[test]
fn test_external_scanner_checkpoints() {
    let lang = heredocs();
    let source = "<<EOF\nbody\nEOF\nword";
    let buffer = SourceBuffer::new(source);
    let mut lexer = Lexer::new(&lang, &buffer);

    let start = lexer.lex(0, lang.start_state(), &ScannerState::EMPTY);
    assert_eq!(start.symbol, symbol(&lang, "heredoc_start"));
    assert!(start.external);
    assert_eq!(start.scanner_after, ScannerState::new(b"EOF"));

    let after_start = match lang.actions(lang.start_state(), start.symbol).first() {
        Some(ParseAction::Shift { state }) => *state,
        other => panic!("expected a shift, got {other:?}"),
    };
    let body = lexer.lex(start.end(), after_start, &start.scanner_after);
    assert_eq!(body.symbol, symbol(&lang, "heredoc_body"));
    assert_eq!(body.end() as usize, "<<EOF\nbody\nEOF".len());
    assert!(body.scanner_after.is_empty());
    assert_eq!(body.extent, Point::new(2, 3));

    let leaf = body.to_leaf(&lang, after_start);
    assert!(leaf.has_external());
    assert!(body.matches_leaf(&leaf));
}

#[test]
fn test_external_scanner_may_decline() {
    let lang = heredocs();
    let buffer = SourceBuffer::new("<<");
    let mut lexer = Lexer::new(&lang, &buffer);
    // No tag: the scanner declines and `<` is not a builtin token.
    let token = lexer.lex(0, lang.start_state(), &ScannerState::EMPTY);
    assert!(token.is_lex_error());
    assert_eq!(token.len, 1);
}

#[test]
fn test_rejected_matchers_extend_lookahead() {
    let mut g = GrammarBuilder::new("slashes");
    g.token("name", TokenPattern::Regex("[a-z]+".into()))
        .token(
            "comment",
            TokenPattern::Regex(r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/".into()),
        )
        .extra("comment")
        .rule("program", repeat(choice([sym("name"), lit("/"), lit("*")])));
    let lang = Language::new(g.build().unwrap()).unwrap();

    // The comment matcher reads to the end before giving up on `/*`.
    let buffer = SourceBuffer::new("a/* b c");
    let mut lexer = Lexer::new(&lang, &buffer);
    let slash = lexer.lex(1, lang.start_state(), &ScannerState::EMPTY);
    assert_eq!(slash.symbol, symbol(&lang, "/"));
    assert_eq!(slash.end(), 2);
    assert_eq!(slash.reach(), 7);

    let closed = SourceBuffer::new("a/* b */");
    let mut lexer = Lexer::new(&lang, &closed);
    let comment = lexer.lex(1, lang.start_state(), &ScannerState::EMPTY);
    assert_eq!(comment.symbol, symbol(&lang, "comment"));
    assert_eq!(comment.lookahead_bytes, 0);
}

#[test]
fn test_failed_external_scan_extends_lookahead() {
    let lang = heredocs();
    // The scanner reads `<<` and the byte after it before rejecting.
    let buffer = SourceBuffer::new("<<x");
    let mut lexer = Lexer::new(&lang, &buffer);
    let token = lexer.lex(0, lang.start_state(), &ScannerState::EMPTY);
    assert!(token.is_lex_error());
    assert_eq!(token.len, 1);
    assert_eq!(token.lookahead_bytes, 2);
}
