//! Structural validation.
//!
//! Every index in the table must point at something of the right kind. The
//! driver indexes the table without further checks, so this is the only
//! place inconsistent tables are caught.

use rustc_hash::FxHashSet;

use super::{GrammarTable, ParseAction, TokenPattern};
use crate::error::GrammarTableError;
use crate::lex::TokenMatcher;
use crate::symbol::{Symbol, SymbolKind};

impl GrammarTable {
    /// Check every reference in the table and compile every token pattern.
    pub fn validate(&self) -> Result<(), GrammarTableError> {
        self.validate_structure()?;
        for token in &self.tokens {
            TokenMatcher::compile(self.symbol_name(token.symbol), &token.pattern)?;
        }
        Ok(())
    }

    /// Reference checks only; pattern compilation is left to the caller.
    pub(crate) fn validate_structure(&self) -> Result<(), GrammarTableError> {
        if self.symbols.len() >= usize::from(u16::MAX) {
            return Err(GrammarTableError::TooLarge {
                what: "symbols",
                limit: usize::from(u16::MAX) - 1,
            });
        }
        match self.symbols.first() {
            Some(end) if end.kind == SymbolKind::Terminal => {}
            _ => return Err(GrammarTableError::MissingEndSymbol),
        }
        if self.states.is_empty() {
            return Err(GrammarTableError::NoStates);
        }
        if self.states.len() > usize::from(u16::MAX) {
            return Err(GrammarTableError::TooLarge {
                what: "states",
                limit: usize::from(u16::MAX),
            });
        }

        let expect_kind = |symbol: Symbol, kind: SymbolKind, context: &str| {
            let Some(info) = self.symbol(symbol) else {
                return Err(GrammarTableError::DanglingSymbol {
                    context: context.to_owned(),
                    symbol: symbol.0,
                });
            };
            if info.kind == kind {
                Ok(())
            } else {
                Err(GrammarTableError::WrongSymbolKind {
                    symbol: info.name.clone(),
                    expected: kind_name(kind),
                })
            }
        };

        let mut with_rule = FxHashSet::default();
        for token in &self.tokens {
            expect_kind(token.symbol, SymbolKind::Terminal, "token rule")?;
            if token.symbol == Symbol::END {
                return Err(GrammarTableError::MissingEndSymbol);
            }
            if let TokenPattern::Literal(text) = &token.pattern {
                if text.is_empty() {
                    return Err(GrammarTableError::EmptyToken(
                        self.symbol_name(token.symbol).to_owned(),
                    ));
                }
            }
            with_rule.insert(token.symbol);
        }
        for &external in &self.externals {
            expect_kind(external, SymbolKind::External, "external token list")?;
        }
        for (i, info) in self.symbols.iter().enumerate().skip(1) {
            #[allow(clippy::cast_possible_truncation, reason = "length checked above")]
            let symbol = Symbol(i as u16);
            if info.kind == SymbolKind::Terminal && !with_rule.contains(&symbol) {
                return Err(GrammarTableError::MissingTokenRule(info.name.clone()));
            }
            if info.extra && info.kind == SymbolKind::NonTerminal {
                return Err(GrammarTableError::WrongSymbolKind {
                    symbol: info.name.clone(),
                    expected: "token (extras must be tokens)",
                });
            }
        }

        if self.field_names.len() > usize::from(u16::MAX) {
            return Err(GrammarTableError::TooLarge {
                what: "fields",
                limit: usize::from(u16::MAX),
            });
        }
        for (i, rule) in self.rules.iter().enumerate() {
            expect_kind(rule.lhs, SymbolKind::NonTerminal, "rule")?;
            let mut previous = None;
            for &(position, field) in &rule.fields {
                let in_order = previous.map_or(true, |p| p < position);
                if position >= rule.arity || !in_order || field.index() >= self.field_names.len() {
                    return Err(GrammarTableError::BadField {
                        rule: u16::try_from(i).unwrap_or(u16::MAX),
                        position,
                        field: field.0,
                    });
                }
                previous = Some(position);
            }
        }
        expect_kind(self.start_symbol, SymbolKind::NonTerminal, "start symbol")?;
        self.check_state_ref(self.start_state.0, self.start_state.0)?;

        let mut has_accept = false;
        for (i, state) in self.states.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation, reason = "length checked above")]
            let id = i as u16;
            for (symbol, actions) in &state.actions {
                let Some(info) = self.symbol(*symbol) else {
                    return Err(GrammarTableError::DanglingSymbol {
                        context: format!("state {id} action"),
                        symbol: symbol.0,
                    });
                };
                if info.kind == SymbolKind::NonTerminal {
                    return Err(GrammarTableError::WrongSymbolKind {
                        symbol: info.name.clone(),
                        expected: "lookahead token",
                    });
                }
                for action in actions {
                    match *action {
                        ParseAction::Shift { state: target } => {
                            self.check_state_ref(id, target.0)?;
                        }
                        ParseAction::Reduce { rule } => {
                            if rule.index() >= self.rules.len() {
                                return Err(GrammarTableError::DanglingRule { state: id, rule: rule.0 });
                            }
                        }
                        ParseAction::Accept => has_accept = true,
                    }
                }
            }
            for &(symbol, target) in &state.gotos {
                expect_kind(symbol, SymbolKind::NonTerminal, "goto")?;
                self.check_state_ref(id, target.0)?;
            }
        }
        if !has_accept {
            return Err(GrammarTableError::MissingAccept);
        }
        Ok(())
    }

    fn check_state_ref(&self, state: u16, target: u16) -> Result<(), GrammarTableError> {
        if usize::from(target) < self.states.len() {
            Ok(())
        } else {
            Err(GrammarTableError::DanglingState { state, target })
        }
    }
}

fn kind_name(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Terminal => "terminal",
        SymbolKind::External => "external token",
        SymbolKind::NonTerminal => "nonterminal",
    }
}
