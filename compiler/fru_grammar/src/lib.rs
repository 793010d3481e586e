//! Grammar tables and compiled languages for the Frugurt parsing engine.
//!
//! # Architecture
//!
//! ```text
//! GrammarBuilder ──build──▶ GrammarTable ──to_bytes──▶ "FRUT" + bincode
//!                              │    ▲                         │
//!                              │    └───────from_bytes────────┘
//!                              ▼
//!                       Language::new (validate, compile matchers)
//!                              │
//!                              ▼
//!                    Language (Arc, Send + Sync) ──▶ parser
//! ```
//!
//! The engine itself is language-agnostic: everything it knows about a
//! language comes from the table and, optionally, an [`ExternalScanner`].

mod builder;
mod error;
mod external;
mod language;
mod lex;
mod symbol;
mod table;

pub use builder::rule::{
    blank, choice, field, lit, optional, prec, prec_left, prec_right, repeat, repeat1, sep_by, sep_by1,
    seq, sym, RuleExpr,
};
pub use builder::GrammarBuilder;
pub use error::GrammarTableError;
pub use external::{ExternalScanner, ScannerFactory, ScannerState};
pub use language::Language;
pub use lex::{TokenMatcher, TokenScan};
pub use symbol::{FieldId, RuleId, StateId, Symbol, SymbolKind, SymbolSet};
pub use table::{
    ActionList, Associativity, GrammarTable, ParseAction, ParseState, Rule, SymbolInfo,
    TokenPattern, TokenRule, FORMAT_VERSION, MAGIC,
};

#[cfg(test)]
mod test_helpers;
