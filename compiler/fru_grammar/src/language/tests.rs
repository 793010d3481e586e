#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::thread;

use fru_lexer_core::Cursor;

use super::*;
use crate::external::ScannerState;
use crate::test_helpers::{arithmetic, symbol};
use crate::{field, seq, sym, GrammarBuilder, TokenPattern};

#[test]
fn test_from_bytes_matches_new() {
    let table = arithmetic();
    let bytes = table.to_bytes().unwrap();
    let loaded = Language::from_bytes(&bytes).unwrap();
    assert_eq!(loaded.table(), &table);
    assert_eq!(loaded.name(), "arith");
}

#[test]
fn test_valid_tokens_match_actions() {
    let lang = Language::new(arithmetic()).unwrap();
    let start = lang.start_state();
    let num = symbol(&lang, "num");
    let plus = symbol(&lang, "+");
    assert!(lang.valid_tokens(start).contains(num));
    assert!(!lang.valid_tokens(start).contains(plus));
    assert!(lang.actions(start, plus).is_empty());
    assert!(!lang.actions(start, num).is_empty());
    assert!(lang.valid_tokens(StateId(u16::MAX - 1)).is_empty());
}

#[test]
fn test_goto_from_start() {
    let lang = Language::new(arithmetic()).unwrap();
    let program = symbol(&lang, "program");
    let product = symbol(&lang, "product");
    assert!(lang.goto(lang.start_state(), program).is_some());
    assert!(lang.goto(lang.start_state(), product).is_some());
    assert!(lang.goto(lang.start_state(), symbol(&lang, "num")).is_none());
}

#[test]
fn test_matchers_follow_declaration_order() {
    let lang = Language::new(arithmetic()).unwrap();
    let order: Vec<&str> = lang
        .builtin_tokens()
        .iter()
        .map(|&s| lang.symbol_name(s))
        .collect();
    assert_eq!(order, ["num", "_ws", "+", "*", "^"]);
    let (matcher, precedence) = lang.matcher(symbol(&lang, "num")).unwrap();
    assert_eq!(matcher.match_len(b"42+1"), Some(2));
    assert_eq!(precedence, 0);
    assert!(lang.matcher(symbol(&lang, "program")).is_none());
}

#[test]
fn test_clones_share_one_language() {
    let lang = Language::new(arithmetic()).unwrap();
    let other = Language::new(arithmetic()).unwrap();
    let clone = lang.clone();
    assert!(lang.ptr_eq(&clone));
    assert_eq!(lang, clone);
    assert_ne!(lang, other);
}

#[test]
fn test_language_is_usable_across_threads() {
    let lang = Language::new(arithmetic()).unwrap();
    let num = symbol(&lang, "num");
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lang = lang.clone();
            thread::spawn(move || !lang.actions(lang.start_state(), num).is_empty())
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

struct CountingScanner {
    scans: u8,
}

impl ExternalScanner for CountingScanner {
    fn scan(&mut self, cursor: &mut Cursor<'_>, valid: &[bool]) -> Option<usize> {
        self.scans += 1;
        (valid.first() == Some(&true) && cursor.eat(b"@")).then_some(0)
    }

    fn checkpoint(&self) -> ScannerState {
        ScannerState::new(&[self.scans])
    }

    fn restore(&mut self, state: &ScannerState) {
        self.scans = state.as_bytes().first().copied().unwrap_or(0);
    }
}

fn at_sign_language() -> Language {
    let mut g = GrammarBuilder::new("at");
    g.external("at")
        .token("id", TokenPattern::Regex("[a-z]+".into()))
        .rule("program", crate::seq([crate::sym("at"), crate::sym("id")]));
    Language::new(g.build().unwrap()).unwrap()
}

#[test]
fn test_external_scanner_factory() {
    let lang = at_sign_language();
    assert!(!lang.has_external_scanner());
    assert!(lang.new_external_scanner().is_none());

    let lang = lang.with_external_scanner(|| Box::new(CountingScanner { scans: 0 }));
    assert!(lang.has_external_scanner());
    assert_eq!(lang.externals(), &[symbol(&lang, "at")]);

    let mut scanner = lang.new_external_scanner().unwrap();
    let source = fru_lexer_core::SourceBuffer::new("@abc");
    let mut cursor = source.cursor();
    assert_eq!(scanner.scan(&mut cursor, &[true]), Some(0));
    assert_eq!(cursor.pos(), 1);
    let saved = scanner.checkpoint();
    assert_eq!(saved.as_bytes(), &[1]);
    let mut cursor = source.cursor();
    assert_eq!(scanner.scan(&mut cursor, &[false]), None);
    scanner.restore(&saved);
    assert_eq!(scanner.checkpoint(), saved);
    scanner.restore(&ScannerState::EMPTY);
    assert_eq!(scanner.checkpoint().as_bytes(), &[0]);
}

#[test]
fn test_scanner_ignored_once_shared() {
    let lang = at_sign_language();
    let shared = lang.clone();
    let lang = lang.with_external_scanner(|| Box::new(CountingScanner { scans: 0 }));
    assert!(!lang.has_external_scanner());
    drop(shared);
}

#[test]
fn test_field_lookup() {
    let mut g = GrammarBuilder::new("pairs");
    g.token("word", TokenPattern::Regex("[a-z]+".into()))
        .rule("pair", seq([field("key", sym("word")), field("value", sym("word"))]));
    let lang = Language::new(g.build().unwrap()).unwrap();

    assert_eq!(lang.field_count(), 2);
    let value = lang.field_for_name("value").unwrap();
    assert_eq!(lang.field_name(value), Some("value"));
    assert!(lang.field_for_name("missing").is_none());
    assert!(lang.field_name(FieldId(7)).is_none());

    let arith = Language::new(arithmetic()).unwrap();
    assert_eq!(arith.field_count(), 0);
}
