//! Canonical LR(1) item sets.
//!
//! States are identified by their kernel items *with* lookaheads, so two
//! contexts that reach the same item core with different follow sets get
//! different states. Precedence resolution then only applies where a
//! conflict really exists; [`minimize`](super::minimize) folds the
//! duplicates back together afterwards.

use rustc_hash::FxHashMap;

use super::flatten::Bnf;
use crate::error::GrammarTableError;
use crate::symbol::{Symbol, SymbolSet};

/// A production with a dot position. The augmented start production is
/// numbered `bnf.productions.len()`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(super) struct Item {
    pub production: u32,
    pub dot: u16,
}

pub(super) type Kernel = Vec<(Item, SymbolSet)>;

pub(super) struct ItemSet {
    pub kernel: Kernel,
    /// Kernel plus closure items, with lookaheads.
    pub closure: Vec<(Item, SymbolSet)>,
    /// Successor state for every symbol after a dot, in symbol order.
    pub transitions: Vec<(Symbol, usize)>,
}

pub(super) struct Automaton {
    pub states: Vec<ItemSet>,
}

/// FIRST sets and nullability, plus the augmented production.
pub(super) struct Analysis<'g> {
    pub bnf: &'g Bnf,
    first: Vec<SymbolSet>,
    nullable: Vec<bool>,
    by_lhs: Vec<Vec<u32>>,
    augmented: Vec<Symbol>,
}

impl<'g> Analysis<'g> {
    pub fn new(bnf: &'g Bnf) -> Self {
        let n = bnf.symbols.len();
        let mut first = vec![SymbolSet::new(); n];
        let mut nullable = vec![false; n];
        let mut by_lhs = vec![Vec::new(); n];
        for (i, symbol_first) in first.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation, reason = "symbol count fits in u16")]
            let symbol = Symbol(i as u16);
            if bnf.is_terminal(symbol) {
                symbol_first.insert(symbol);
            }
        }
        for (i, p) in bnf.productions.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation, reason = "production count checked by caller")]
            by_lhs[p.lhs.index()].push(i as u32);
        }

        let mut changed = true;
        while changed {
            changed = false;
            for p in &bnf.productions {
                let mut all_nullable = true;
                for &s in &p.rhs {
                    let rhs_first = first[s.index()].clone();
                    changed |= first[p.lhs.index()].union_with(&rhs_first);
                    if !nullable[s.index()] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !nullable[p.lhs.index()] {
                    nullable[p.lhs.index()] = true;
                    changed = true;
                }
            }
        }

        Analysis {
            bnf,
            first,
            nullable,
            by_lhs,
            augmented: vec![bnf.start],
        }
    }

    #[allow(clippy::cast_possible_truncation, reason = "production count checked by caller")]
    pub fn augmented_production(&self) -> u32 {
        self.bnf.productions.len() as u32
    }

    pub fn rhs(&self, production: u32) -> &[Symbol] {
        self.bnf
            .productions
            .get(production as usize)
            .map_or(&self.augmented, |p| &p.rhs)
    }

    pub fn next_symbol(&self, item: Item) -> Option<Symbol> {
        self.rhs(item.production).get(usize::from(item.dot)).copied()
    }

    /// FIRST of a symbol sequence, and whether the whole sequence is
    /// nullable.
    fn first_of(&self, seq: &[Symbol]) -> (SymbolSet, bool) {
        let mut out = SymbolSet::new();
        for s in seq {
            out.union_with(&self.first[s.index()]);
            if !self.nullable[s.index()] {
                return (out, false);
            }
        }
        (out, true)
    }

    fn closure(&self, kernel: &Kernel) -> Vec<(Item, SymbolSet)> {
        let mut items: Vec<(Item, SymbolSet)> = kernel.clone();
        let mut index: FxHashMap<Item, usize> = items
            .iter()
            .enumerate()
            .map(|(i, (item, _))| (*item, i))
            .collect();
        let mut work: Vec<usize> = (0..items.len()).collect();

        while let Some(i) = work.pop() {
            let (item, lookahead) = items[i].clone();
            let Some(next) = self.next_symbol(item) else {
                continue;
            };
            if self.bnf.is_terminal(next) {
                continue;
            }
            let rest = &self.rhs(item.production)[usize::from(item.dot) + 1..];
            let (mut follow, rest_nullable) = self.first_of(rest);
            if rest_nullable {
                follow.union_with(&lookahead);
            }
            for &production in &self.by_lhs[next.index()] {
                let new_item = Item { production, dot: 0 };
                match index.get(&new_item) {
                    Some(&j) => {
                        if items[j].1.union_with(&follow) {
                            work.push(j);
                        }
                    }
                    None => {
                        index.insert(new_item, items.len());
                        work.push(items.len());
                        items.push((new_item, follow.clone()));
                    }
                }
            }
        }
        items
    }

    /// Build the canonical LR(1) collection.
    pub fn build(&self) -> Result<Automaton, GrammarTableError> {
        let limit = usize::from(u16::MAX);
        let start_kernel: Kernel = vec![(
            Item {
                production: self.augmented_production(),
                dot: 0,
            },
            SymbolSet::single(Symbol::END),
        )];

        let mut states: Vec<ItemSet> = Vec::new();
        let mut ids: FxHashMap<Kernel, usize> = FxHashMap::default();
        ids.insert(start_kernel.clone(), 0);
        states.push(ItemSet {
            closure: Vec::new(),
            kernel: start_kernel,
            transitions: Vec::new(),
        });

        let mut next = 0;
        while next < states.len() {
            let closure = self.closure(&states[next].kernel);

            let mut successors: Vec<(Symbol, Kernel)> = Vec::new();
            for (item, lookahead) in &closure {
                let Some(symbol) = self.next_symbol(*item) else {
                    continue;
                };
                let advanced = Item {
                    production: item.production,
                    dot: item.dot + 1,
                };
                let slot = match successors.iter().position(|(s, _)| *s == symbol) {
                    Some(slot) => slot,
                    None => {
                        successors.push((symbol, Vec::new()));
                        successors.len() - 1
                    }
                };
                let kernel = &mut successors[slot].1;
                match kernel.iter_mut().find(|(i, _)| *i == advanced) {
                    Some((_, la)) => {
                        la.union_with(lookahead);
                    }
                    None => kernel.push((advanced, lookahead.clone())),
                }
            }
            successors.sort_by_key(|(symbol, _)| *symbol);

            let mut transitions = Vec::with_capacity(successors.len());
            for (symbol, mut kernel) in successors {
                kernel.sort_by_key(|(item, _)| *item);
                let target = match ids.get(&kernel) {
                    Some(&id) => id,
                    None => {
                        let id = states.len();
                        if id >= limit {
                            return Err(GrammarTableError::TooLarge { what: "states", limit });
                        }
                        ids.insert(kernel.clone(), id);
                        states.push(ItemSet {
                            kernel,
                            closure: Vec::new(),
                            transitions: Vec::new(),
                        });
                        id
                    }
                };
                transitions.push((symbol, target));
            }

            states[next].closure = closure;
            states[next].transitions = transitions;
            next += 1;
        }

        tracing::debug!(states = states.len(), "built canonical LR(1) collection");
        Ok(Automaton { states })
    }
}
