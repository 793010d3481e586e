//! The compiled, shareable language handle.
//!
//! A [`Language`] wraps a validated [`GrammarTable`] together with the lookup
//! structures the parser needs on every token: per-state action and goto
//! maps, the set of tokens valid in each state, and compiled token matchers.
//! It is immutable after construction and cheap to clone; every parse of the
//! language shares one instance across threads.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::GrammarTableError;
use crate::external::{ExternalScanner, ScannerFactory};
use crate::lex::TokenMatcher;
use crate::symbol::{FieldId, RuleId, StateId, Symbol, SymbolKind, SymbolSet};
use crate::table::{ActionList, GrammarTable, ParseAction, Rule, SymbolInfo};

/// Cheap-to-clone handle to a compiled grammar.
#[derive(Clone)]
pub struct Language(Arc<LanguageData>);

struct LanguageData {
    table: GrammarTable,
    actions: Vec<FxHashMap<Symbol, ActionList>>,
    gotos: Vec<FxHashMap<Symbol, StateId>>,
    /// Lookahead terminals with an action in each state (extras excluded).
    valid: Vec<SymbolSet>,
    extras: SymbolSet,
    /// Indexed by symbol; `None` for nonterminals, externals and END.
    matchers: Vec<Option<(TokenMatcher, i32)>>,
    /// Builtin tokens in declaration order.
    token_order: Vec<Symbol>,
    by_name: FxHashMap<(String, bool), Symbol>,
    scanner: Option<ScannerFactory>,
}

// Compile-time assertion: the handle is shared across parsing threads.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Language>();
};

impl Language {
    /// Validate and compile a table.
    #[tracing::instrument(level = "debug", skip_all, fields(name = %table.name))]
    pub fn new(table: GrammarTable) -> Result<Language, GrammarTableError> {
        table.validate_structure()?;

        let mut matchers: Vec<Option<(TokenMatcher, i32)>> = Vec::new();
        matchers.resize_with(table.symbols.len(), || None);
        let mut token_order = Vec::with_capacity(table.tokens.len());
        for token in &table.tokens {
            let matcher = TokenMatcher::compile(table.symbol_name(token.symbol), &token.pattern)?;
            matchers[token.symbol.index()] = Some((matcher, token.precedence));
            token_order.push(token.symbol);
        }

        let extras: SymbolSet = table.extras().collect();
        let mut actions = Vec::with_capacity(table.states.len());
        let mut gotos = Vec::with_capacity(table.states.len());
        let mut valid = Vec::with_capacity(table.states.len());
        for state in &table.states {
            let map: FxHashMap<Symbol, ActionList> = state.actions.iter().cloned().collect();
            valid.push(map.keys().copied().collect::<SymbolSet>());
            actions.push(map);
            gotos.push(state.gotos.iter().copied().collect());
        }

        let mut by_name = FxHashMap::default();
        for (i, info) in table.symbols.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation, reason = "validated to fit in u16")]
            let symbol = Symbol(i as u16);
            by_name.entry((info.name.clone(), info.named)).or_insert(symbol);
        }

        tracing::debug!(
            states = table.states.len(),
            tokens = token_order.len(),
            externals = table.externals.len(),
            "compiled language"
        );

        Ok(Language(Arc::new(LanguageData {
            table,
            actions,
            gotos,
            valid,
            extras,
            matchers,
            token_order,
            by_name,
            scanner: None,
        })))
    }

    /// Load a table from the binary format and compile it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Language, GrammarTableError> {
        Language::new(GrammarTable::from_bytes(bytes)?)
    }

    /// Attach the external scanner factory. Only valid before the handle is
    /// shared; returns the language unchanged if it already has clones.
    #[must_use]
    pub fn with_external_scanner(
        mut self,
        factory: impl Fn() -> Box<dyn ExternalScanner> + Send + Sync + 'static,
    ) -> Language {
        if let Some(data) = Arc::get_mut(&mut self.0) {
            data.scanner = Some(Arc::new(factory));
        } else {
            tracing::warn!(name = %self.name(), "external scanner ignored: language already shared");
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.0.table.name
    }

    pub fn table(&self) -> &GrammarTable {
        &self.0.table
    }

    /// Whether two handles refer to the same compiled language.
    pub fn ptr_eq(&self, other: &Language) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // === Automaton ===

    #[inline]
    pub fn start_state(&self) -> StateId {
        self.0.table.start_state
    }

    #[inline]
    pub fn start_symbol(&self) -> Symbol {
        self.0.table.start_symbol
    }

    #[inline]
    pub fn state_count(&self) -> usize {
        self.0.table.states.len()
    }

    /// Actions for `lookahead` in `state`, preferred first. Empty if the
    /// token is not valid there.
    #[inline]
    pub fn actions(&self, state: StateId, lookahead: Symbol) -> &[ParseAction] {
        self.0
            .actions
            .get(state.index())
            .and_then(|map| map.get(&lookahead))
            .map_or(&[], |list| list.as_slice())
    }

    #[inline]
    pub fn goto(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        self.0.gotos.get(state.index())?.get(&symbol).copied()
    }

    /// Terminals with an action in `state`.
    pub fn valid_tokens(&self, state: StateId) -> &SymbolSet {
        static EMPTY: SymbolSet = SymbolSet::EMPTY;
        self.0.valid.get(state.index()).unwrap_or(&EMPTY)
    }

    pub fn is_recoverable(&self, state: StateId) -> bool {
        self.0
            .table
            .states
            .get(state.index())
            .is_some_and(|s| s.recoverable)
    }

    #[inline]
    pub fn rule(&self, rule: RuleId) -> &Rule {
        &self.0.table.rules[rule.index()]
    }

    // === Symbols ===

    pub fn symbol_count(&self) -> usize {
        self.0.table.symbols.len()
    }

    pub fn symbol_info(&self, symbol: Symbol) -> Option<&SymbolInfo> {
        self.0.table.symbol(symbol)
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        self.0.table.symbol_name(symbol)
    }

    /// Look up a symbol by name. Literal tokens are anonymous (`named ==
    /// false`); rules and pattern tokens are named.
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<Symbol> {
        self.0.by_name.get(&(name.to_owned(), named)).copied()
    }

    pub fn is_visible(&self, symbol: Symbol) -> bool {
        symbol.is_error() || self.symbol_info(symbol).is_some_and(|i| i.visible)
    }

    pub fn is_named(&self, symbol: Symbol) -> bool {
        symbol.is_error() || self.symbol_info(symbol).is_some_and(|i| i.named)
    }

    pub fn is_extra(&self, symbol: Symbol) -> bool {
        self.0.extras.contains(symbol)
    }

    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        symbol.is_error()
            || self
                .symbol_info(symbol)
                .is_some_and(|i| i.kind != SymbolKind::NonTerminal)
    }

    pub fn extras(&self) -> &SymbolSet {
        &self.0.extras
    }

    // === Fields ===

    pub fn field_count(&self) -> usize {
        self.0.table.field_names.len()
    }

    pub fn field_name(&self, field: FieldId) -> Option<&str> {
        self.0.table.field_name(field)
    }

    pub fn field_for_name(&self, name: &str) -> Option<FieldId> {
        let index = self.0.table.field_names.iter().position(|n| n == name)?;
        u16::try_from(index).ok().map(FieldId)
    }

    // === Lexing ===

    /// Builtin tokens in declaration order.
    pub fn builtin_tokens(&self) -> &[Symbol] {
        &self.0.token_order
    }

    /// Compiled matcher and precedence for a builtin token.
    pub fn matcher(&self, symbol: Symbol) -> Option<(&TokenMatcher, i32)> {
        self.0
            .matchers
            .get(symbol.index())?
            .as_ref()
            .map(|(m, p)| (m, *p))
    }

    /// External tokens in scanner order.
    pub fn externals(&self) -> &[Symbol] {
        &self.0.table.externals
    }

    pub fn has_external_scanner(&self) -> bool {
        self.0.scanner.is_some()
    }

    /// A fresh external scanner, if the language has one.
    pub fn new_external_scanner(&self) -> Option<Box<dyn ExternalScanner>> {
        self.0.scanner.as_ref().map(|factory| factory())
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name())
            .field("states", &self.state_count())
            .field("symbols", &self.symbol_count())
            .field("external_scanner", &self.has_external_scanner())
            .finish()
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Language {}

#[cfg(test)]
mod tests;
