//! Incremental GLR parser for the Frugurt parsing engine.
//!
//! # Architecture
//!
//! ```text
//! source ──▶ Lexer (per state) ──▶ Driver ──▶ GreenNode root ──▶ Tree
//!              ▲                    │  ▲
//!              │        stack versions  └── ReuseCursor over the old tree
//!       external scanner            │
//!                                   └── recovery (MISSING / ERROR nodes)
//! ```
//!
//! - The lexer is contextual: each token is matched against the terminals
//!   the current parse state accepts, so the same bytes can lex differently
//!   in different places.
//! - The driver is an LR automaton that forks on declared conflicts and keeps
//!   at most [`ParseOptions::max_versions`] stack versions alive.
//! - Malformed input never fails a parse. It produces `ERROR` and `MISSING`
//!   nodes instead; only a missing language or an exceeded budget does.
//! - Given the previous tree (already edited), unchanged subtrees and leaves
//!   are reused by reference.
//!
//! # Example
//!
//! ```ignore
//! let mut parser = Parser::new();
//! parser.set_language(fru_lang::language().clone());
//! let tree = parser.parse("let x = 1;", None)?;
//! let edit = InputEdit::replace("let x = 1;", 8, 9, "2");
//! let tree = parser.parse("let x = 2;", Some(&tree.edit(&edit)))?;
//! ```

mod driver;
mod error;
mod lexer;
mod options;
mod parser;
mod reuse;
mod stack;
mod stats;

pub use error::{BudgetReason, ParseError};
pub use options::{ParseOptions, DEFAULT_MAX_VERSIONS};
pub use parser::{parse, Parser};
pub use reuse::CursorStats;
pub use stats::ParseStats;

#[cfg(test)]
mod test_helpers;
