//! Symbol, state and rule identifiers, plus a compact symbol bitset.
//!
//! Identifiers are dense `u16` indices into the grammar table. `Symbol(0)` is
//! always end-of-input; [`Symbol::ERROR`] is reserved for error nodes and is
//! never stored in the table's symbol list.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A grammar symbol (terminal, external token, or nonterminal).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub u16);

impl Symbol {
    /// End of input.
    pub const END: Symbol = Symbol(0);
    /// Error nodes and lexically invalid bytes.
    pub const ERROR: Symbol = Symbol(u16::MAX);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == u16::MAX
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_error() {
            f.write_str("#ERROR")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// An automaton state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct StateId(pub u16);

impl StateId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A field name, by index into the table's field list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId(pub u16);

impl FieldId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A reduction rule.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleId(pub u16);

impl RuleId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a symbol is, lexically.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Matched by the builtin lexer (literal or pattern). `Symbol::END` is a
    /// terminal with no token rule.
    Terminal,
    /// Matched by the language's external scanner.
    External,
    /// Produced by reductions.
    NonTerminal,
}

/// A set of symbols, one bit per symbol id.
///
/// Grammars rarely exceed a few hundred symbols, so four inline words cover
/// the common case without allocating.
#[derive(Clone, Default)]
pub struct SymbolSet {
    words: SmallVec<[u64; 4]>,
}

impl SymbolSet {
    pub const EMPTY: SymbolSet = SymbolSet {
        words: SmallVec::new_const(),
    };

    pub fn new() -> Self {
        SymbolSet::default()
    }

    pub fn single(symbol: Symbol) -> Self {
        let mut set = SymbolSet::new();
        set.insert(symbol);
        set
    }

    /// Add a symbol. Returns `true` if it was not already present.
    pub fn insert(&mut self, symbol: Symbol) -> bool {
        debug_assert!(!symbol.is_error(), "ERROR is never a set member");
        let (word, bit) = (symbol.index() / 64, symbol.index() % 64);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let before = self.words[word];
        self.words[word] |= 1 << bit;
        before != self.words[word]
    }

    pub fn remove(&mut self, symbol: Symbol) {
        let (word, bit) = (symbol.index() / 64, symbol.index() % 64);
        if let Some(w) = self.words.get_mut(word) {
            *w &= !(1 << bit);
        }
    }

    #[inline]
    pub fn contains(&self, symbol: Symbol) -> bool {
        let (word, bit) = (symbol.index() / 64, symbol.index() % 64);
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    /// Union `other` into `self`. Returns `true` if `self` grew.
    pub fn union_with(&mut self, other: &SymbolSet) -> bool {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let merged = *mine | theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    pub fn intersects(&self, other: &SymbolSet) -> bool {
        self.words.iter().zip(&other.words).any(|(a, b)| a & b != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "sets only hold u16 symbol ids"
                )]
                let id = (i * 64 + bit) as u16;
                Some(Symbol(id))
            })
        })
    }

    fn significant_words(&self) -> &[u64] {
        let len = self
            .words
            .iter()
            .rposition(|w| *w != 0)
            .map_or(0, |last| last + 1);
        &self.words[..len]
    }
}

impl PartialEq for SymbolSet {
    fn eq(&self, other: &Self) -> bool {
        self.significant_words() == other.significant_words()
    }
}

impl Eq for SymbolSet {}

impl std::hash::Hash for SymbolSet {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.significant_words().hash(state);
    }
}

impl fmt::Debug for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|s| s.0)).finish()
    }
}

impl FromIterator<Symbol> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let mut set = SymbolSet::new();
        for symbol in iter {
            set.insert(symbol);
        }
        set
    }
}

impl Extend<Symbol> for SymbolSet {
    fn extend<I: IntoIterator<Item = Symbol>>(&mut self, iter: I) {
        for symbol in iter {
            self.insert(symbol);
        }
    }
}

#[cfg(test)]
mod tests;
