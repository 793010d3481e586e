//! The Frugurt language for the parsing engine.
//!
//! [`language`] compiles the grammar on first use and hands out the same
//! [`Language`] for the rest of the process. Cloning it is cheap.
//!
//! ```ignore
//! let tree = fru_lang::parse("let x = 1 + 2;", None)?;
//! assert_eq!(
//!     tree.to_sexp(),
//!     "(source_file (let_statement (identifier) (binary_expression (number_literal) (number_literal))))"
//! );
//! ```

use std::sync::OnceLock;

use fru_grammar::{GrammarTableError, Language};
use fru_parse::ParseError;
use fru_syntax::Tree;

mod grammar;

pub use grammar::grammar;

static LANGUAGE: OnceLock<Result<Language, GrammarTableError>> = OnceLock::new();

/// The compiled Frugurt language, or why the grammar failed to compile.
pub fn try_language() -> Result<&'static Language, &'static GrammarTableError> {
    LANGUAGE
        .get_or_init(|| {
            let table = grammar().build()?;
            tracing::debug!(
                states = table.states.len(),
                symbols = table.symbols.len(),
                rules = table.rules.len(),
                "compiled frugurt grammar"
            );
            Language::new(table)
        })
        .as_ref()
}

/// The compiled Frugurt language.
///
/// # Panics
///
/// If the built-in grammar does not compile, which the crate's tests rule
/// out.
pub fn language() -> &'static Language {
    match try_language() {
        Ok(language) => language,
        Err(err) => panic!("the frugurt grammar does not compile: {err}"),
    }
}

/// Parse Frugurt source, reusing what still applies from `old`.
pub fn parse(source: &str, old: Option<&Tree>) -> Result<Tree, ParseError> {
    fru_parse::parse(language(), source, old)
}
