//! Errors raised while building, loading or validating a grammar table.
//!
//! All of these are fatal: a `Language` is never constructed from a table
//! that produced one.

use thiserror::Error;

/// A grammar table that cannot be used to parse.
#[derive(Debug, Error)]
pub enum GrammarTableError {
    #[error("not a grammar table: bad magic bytes")]
    BadMagic,

    #[error("unsupported grammar table version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("failed to decode grammar table: {0}")]
    Decode(#[source] bincode::Error),

    #[error("failed to encode grammar table: {0}")]
    Encode(#[source] bincode::Error),

    #[error("{context} refers to symbol {symbol}, which does not exist")]
    DanglingSymbol { context: String, symbol: u16 },

    #[error("state {state} refers to state {target}, which does not exist")]
    DanglingState { state: u16, target: u16 },

    #[error("state {state} refers to rule {rule}, which does not exist")]
    DanglingRule { state: u16, rule: u16 },

    #[error("rule {rule} names child {position} with field {field}, which is out of range or repeated")]
    BadField { rule: u16, position: u16, field: u16 },

    #[error("symbol `{symbol}` is used as a {expected} but is not one")]
    WrongSymbolKind { symbol: String, expected: &'static str },

    #[error("symbol 0 must be the end-of-input terminal")]
    MissingEndSymbol,

    #[error("terminal `{0}` has no token rule and is not external")]
    MissingTokenRule(String),

    #[error("token `{0}` can match the empty string")]
    EmptyToken(String),

    #[error("invalid pattern for token `{symbol}`: {source}")]
    InvalidPattern {
        symbol: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern for token `{symbol}` cannot be compiled to an automaton: {source}")]
    UnsupportedPattern {
        symbol: String,
        #[source]
        source: regex_automata::dfa::dense::BuildError,
    },

    #[error("no state accepts end of input")]
    MissingAccept,

    #[error("grammar table has no states")]
    NoStates,

    // Builder errors
    #[error("grammar has no rules")]
    EmptyGrammar,

    #[error("rule `{0}` is referenced but never defined")]
    UndefinedRule(String),

    #[error("rule `{0}` is defined twice")]
    DuplicateRule(String),

    #[error("grammar needs more than {limit} {what}")]
    TooLarge { what: &'static str, limit: usize },
}
