//! The grammar table: an immutable, serializable automaton description.
//!
//! A table is produced ahead of time (by [`GrammarBuilder`](crate::GrammarBuilder)
//! or an external grammar compiler), stored in the binary format described in
//! [`codec`], and turned into a [`Language`](crate::Language) at load time.
//!
//! # Layout
//!
//! - `symbols[0]` is end-of-input. Terminals, external tokens and
//!   nonterminals follow in any order.
//! - `tokens` describes how the builtin lexer matches each non-external
//!   terminal.
//! - `states[s].actions` maps lookahead terminals to an ordered list of
//!   actions. More than one action means a declared conflict the driver
//!   explores by forking; the first action is preferred.
//! - `states[s].gotos` maps nonterminals to the successor state after a
//!   reduction.
//! - `rules[r].fields` names some of a rule's children, by position among
//!   the rule's non-extra children, with indices into `field_names`.

mod codec;
mod validate;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::symbol::{FieldId, RuleId, StateId, Symbol, SymbolKind};

pub use codec::{FORMAT_VERSION, MAGIC};

/// Per-symbol metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    /// Appears in the tree. Hidden nonterminals are inlined into their
    /// parent; hidden terminals are kept as leaves but skipped by visible
    /// navigation.
    pub visible: bool,
    /// Named (rule or pattern) as opposed to anonymous (literal).
    pub named: bool,
    /// May appear between any two tokens.
    pub extra: bool,
}

/// How the builtin lexer recognizes a terminal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenPattern {
    /// Exact bytes.
    Literal(String),
    /// A `regex` crate pattern, matched anchored at the current position.
    Regex(String),
}

impl TokenPattern {
    pub fn is_literal(&self) -> bool {
        matches!(self, TokenPattern::Literal(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRule {
    pub symbol: Symbol,
    pub pattern: TokenPattern,
    /// Breaks ties between equal-length matches of the same class.
    pub precedence: i32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Associativity {
    #[default]
    None,
    Left,
    Right,
}

/// A reduction: pop `arity` non-extra stack entries and build `lhs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub lhs: Symbol,
    pub arity: u16,
    pub precedence: i32,
    pub associativity: Associativity,
    /// `(child position, field)`, sorted by position, at most one field per
    /// child.
    pub fields: Vec<(u16, FieldId)>,
}

impl Rule {
    /// Field of the child at `position`, counting only non-extra children.
    pub fn field_at(&self, position: u16) -> Option<FieldId> {
        self.fields
            .binary_search_by_key(&position, |&(p, _)| p)
            .ok()
            .map(|i| self.fields[i].1)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseAction {
    Shift { state: StateId },
    Reduce { rule: RuleId },
    Accept,
}

pub type ActionList = SmallVec<[ParseAction; 1]>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseState {
    /// Sorted by symbol.
    pub actions: Vec<(Symbol, ActionList)>,
    /// Sorted by symbol.
    pub gotos: Vec<(Symbol, StateId)>,
    /// A statement/block boundary: error recovery may fast-forward here.
    pub recoverable: bool,
}

/// The full table. See the module docs for the layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarTable {
    pub name: String,
    pub symbols: Vec<SymbolInfo>,
    pub tokens: Vec<TokenRule>,
    /// External tokens, in the order the external scanner knows them.
    pub externals: Vec<Symbol>,
    pub rules: Vec<Rule>,
    pub states: Vec<ParseState>,
    pub start_state: StateId,
    /// The symbol a successful parse reduces to.
    pub start_symbol: Symbol,
    pub field_names: Vec<String>,
}

impl GrammarTable {
    pub fn symbol(&self, symbol: Symbol) -> Option<&SymbolInfo> {
        self.symbols.get(symbol.index())
    }

    /// Display name of a symbol, including the reserved ones.
    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        if symbol.is_error() {
            return "ERROR";
        }
        self.symbol(symbol).map_or("?", |info| info.name.as_str())
    }

    pub fn field_name(&self, field: FieldId) -> Option<&str> {
        self.field_names.get(field.index()).map(String::as_str)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn extras(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter().enumerate().filter_map(|(i, info)| {
            #[allow(clippy::cast_possible_truncation, reason = "validated to fit in u16")]
            let symbol = Symbol(i as u16);
            info.extra.then_some(symbol)
        })
    }
}
