// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Whole programs: generated statement sequences must parse cleanly and
//! reparse incrementally to the same tree; arbitrary text must still
//! produce a covering tree.

use proptest::prelude::*;

use fru_parse::Parser;
use fru_syntax::{InputEdit, Tree};

const STATEMENTS: &[&str] = &[
    "let a = 1;",
    "a = b + 2 * c;",
    "f(x, y: 3);",
    "obj.field = \"text\";",
    "{ let z = 4; }",
    "if a { b; } else { c; }",
    "while a < 3 { a = a + 1; }",
    "let g = fn(p, q = 1) { p * q };",
    "// comment",
    "return;",
];

fn program() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..STATEMENTS.len(), 0..12)
}

fn render(statements: &[usize]) -> String {
    statements
        .iter()
        .map(|&i| STATEMENTS[i])
        .collect::<Vec<_>>()
        .join("\n")
}

fn assert_covers(tree: &Tree, source: &str) {
    let mut pos = 0u32;
    for entry in tree.leaves() {
        assert_eq!(entry.start_byte, pos);
        pos += entry.node.len();
    }
    assert_eq!(pos as usize, source.len());
}

/// Replace the whole differing middle of `old` with that of `new`.
fn diff(old: &str, new: &str) -> InputEdit {
    let prefix = old
        .bytes()
        .zip(new.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old
        .bytes()
        .rev()
        .zip(new.bytes().rev())
        .take(old.len().min(new.len()) - prefix)
        .take_while(|(a, b)| a == b)
        .count();
    InputEdit::replace(
        old,
        u32::try_from(prefix).unwrap(),
        u32::try_from(old.len() - suffix).unwrap(),
        &new[prefix..new.len() - suffix],
    )
}

/// Parse `old_source`, apply one edit and reparse with the old tree.
/// Returns the incremental and the cold tree of the new text.
fn reparse(old_source: &str, start: usize, old_end: usize, text: &str) -> (Tree, Tree) {
    let mut new_source = old_source.to_owned();
    new_source.replace_range(start..old_end, text);

    let mut parser = Parser::new();
    parser.set_language(fru_lang::language().clone());
    let old = parser.parse(old_source, None).unwrap();
    let edit = InputEdit::replace(
        old_source,
        u32::try_from(start).unwrap(),
        u32::try_from(old_end).unwrap(),
        text,
    );
    let new = parser.parse(&new_source, Some(&old.edit(&edit))).unwrap();
    let cold = fru_lang::parse(&new_source, None).unwrap();
    (new, cold)
}

#[test]
fn closing_a_block_comment_far_away_reparses_like_cold() {
    // The `/*` is rejected as a comment when first lexed; closing it later
    // must invalidate every token lexed after that rejection.
    let (new, cold) = reparse("a /*+ b;\nd;\nc;", 13, 13, " */");
    assert_eq!(
        cold.to_sexp(),
        "(source_file (expression_statement (variable (identifier)) (comment)))"
    );
    assert!(new.same_shape(&cold), "{}\nvs\n{}", new.to_sexp(), cold.to_sexp());
}

#[test]
fn closing_a_string_reparses_like_cold() {
    let (new, cold) = reparse("let s = \"abc;\nlet t = 1;", 12, 12, "\"");
    assert!(!cold.has_error(), "{}", cold.to_sexp());
    assert!(new.same_shape(&cold), "{}\nvs\n{}", new.to_sexp(), cold.to_sexp());
}

/// Small insertions that open or close comments and strings.
fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/*".to_owned()),
        Just("*/".to_owned()),
        Just("\"".to_owned()),
        Just("//".to_owned()),
        "[a-z0-9 ;=+*/\"\n{}]{0,4}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_programs_parse_cleanly(statements in program()) {
        let source = render(&statements);
        let tree = fru_lang::parse(&source, None).unwrap();
        prop_assert!(!tree.has_error(), "{}\n{}", source, tree.to_sexp());
        assert_covers(&tree, &source);
    }

    #[test]
    fn statement_edits_reparse_like_cold(
        statements in program(),
        at in any::<prop::sample::Index>(),
        replacement in 0..STATEMENTS.len(),
    ) {
        prop_assume!(!statements.is_empty());
        let old_source = render(&statements);
        let mut edited = statements.clone();
        edited[at.index(statements.len())] = replacement;
        let new_source = render(&edited);

        let mut parser = Parser::new();
        parser.set_language(fru_lang::language().clone());
        let old = parser.parse(&old_source, None).unwrap();
        let new = parser
            .parse(&new_source, Some(&old.edit(&diff(&old_source, &new_source))))
            .unwrap();
        let cold = fru_lang::parse(&new_source, None).unwrap();
        prop_assert!(new.same_shape(&cold), "{}\nvs\n{}", new.to_sexp(), cold.to_sexp());
    }

    #[test]
    fn character_edits_reparse_like_cold(
        statements in program(),
        at in any::<prop::sample::Index>(),
        removed in 0usize..4,
        text in fragment(),
    ) {
        let old_source = render(&statements);
        let start = at.index(old_source.len() + 1);
        let old_end = (start + removed).min(old_source.len());
        let (new, cold) = reparse(&old_source, start, old_end, &text);
        prop_assert!(new.same_shape(&cold), "{}\nvs\n{}", new.to_sexp(), cold.to_sexp());
    }

    #[test]
    fn arbitrary_text_still_yields_a_tree(source in "[a-z0-9 ;={}()+*.,:\"/\n]{0,60}") {
        let tree = fru_lang::parse(&source, None).unwrap();
        assert_covers(&tree, &source);
    }
}
