//! Lowering rule expressions to plain productions.
//!
//! Choices and optionals expand into separate productions of the same
//! rule; repetitions become hidden, left-recursive auxiliary rules
//! (`_rule_repeatN`), shared between identical repetition bodies so that
//! rules with a common prefix do not conflict on it. Precedence annotations
//! attach to every production generated beneath them, the innermost
//! annotation winning. Fields work the same way, per child position.

use rustc_hash::FxHashMap;

use super::rule::RuleExpr;
use super::{GrammarBuilder, RuleDef};
use crate::error::GrammarTableError;
use crate::symbol::{FieldId, Symbol, SymbolKind, SymbolSet};
use crate::table::{Associativity, SymbolInfo, TokenPattern, TokenRule};

/// Productions generated from one rule body are capped to keep a mistyped
/// grammar from exhausting memory during expansion.
const MAX_ALTERNATIVES: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Production {
    pub lhs: Symbol,
    pub rhs: Vec<Symbol>,
    pub precedence: i32,
    pub associativity: Associativity,
    pub fields: Vec<(u16, FieldId)>,
}

/// A grammar in plain production form, with its final symbol numbering.
pub(super) struct Bnf {
    pub name: String,
    pub symbols: Vec<SymbolInfo>,
    pub tokens: Vec<TokenRule>,
    pub externals: Vec<Symbol>,
    pub productions: Vec<Production>,
    pub start: Symbol,
    /// The user-facing rule each symbol belongs to (auxiliary rules map to
    /// the rule that introduced them).
    pub origin: Vec<Symbol>,
    pub conflicts: Vec<SymbolSet>,
    pub boundaries: SymbolSet,
    pub field_names: Vec<String>,
}

impl Bnf {
    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        self.symbols[symbol.index()].kind != SymbolKind::NonTerminal
    }
}

#[derive(Clone, Debug, Default)]
struct Alt {
    rhs: Vec<Symbol>,
    prec: Option<(i32, Associativity)>,
    /// Sorted by position.
    fields: Vec<(u16, FieldId)>,
}

impl Alt {
    fn of(symbol: Symbol) -> Self {
        Alt {
            rhs: vec![symbol],
            ..Alt::default()
        }
    }

    /// Give every child without a field the field `id`.
    #[allow(clippy::cast_possible_truncation, reason = "production length is checked against u16")]
    fn name_children(&mut self, id: FieldId) {
        for position in 0..self.rhs.len() as u16 {
            if self.fields.binary_search_by_key(&position, |&(p, _)| p).is_err() {
                self.fields.push((position, id));
            }
        }
        self.fields.sort_unstable_by_key(|&(p, _)| p);
    }
}

struct Flattener {
    names: FxHashMap<String, Symbol>,
    literals: FxHashMap<String, Symbol>,
    symbols: Vec<SymbolInfo>,
    tokens: Vec<TokenRule>,
    origin: Vec<Symbol>,
    productions: Vec<Production>,
    repeat_counts: FxHashMap<Symbol, u32>,
    /// Repetition bodies already lowered, with their auxiliary rule.
    repeats: Vec<(RuleExpr, Symbol)>,
    field_names: Vec<String>,
}

pub(super) fn flatten(builder: &GrammarBuilder) -> Result<Bnf, GrammarTableError> {
    let Some(first_rule) = builder.rules.first() else {
        return Err(GrammarTableError::EmptyGrammar);
    };

    let mut f = Flattener {
        names: FxHashMap::default(),
        literals: FxHashMap::default(),
        symbols: Vec::new(),
        tokens: Vec::new(),
        origin: Vec::new(),
        productions: Vec::new(),
        repeat_counts: FxHashMap::default(),
        repeats: Vec::new(),
        field_names: Vec::new(),
    };

    f.push_symbol(SymbolInfo {
        name: "end".to_owned(),
        kind: SymbolKind::Terminal,
        visible: false,
        named: false,
        extra: false,
    })?;

    for token in &builder.tokens {
        let symbol = f.declare(&token.name, &token.name, SymbolKind::Terminal)?;
        f.symbols[symbol.index()].extra = builder.extras.contains(&token.name);
        f.tokens.push(TokenRule {
            symbol,
            pattern: token.pattern.clone(),
            precedence: token.precedence,
        });
    }
    let mut externals = Vec::with_capacity(builder.externals.len());
    for name in &builder.externals {
        let symbol = f.declare(name, name, SymbolKind::External)?;
        f.symbols[symbol.index()].extra = builder.extras.contains(name);
        externals.push(symbol);
    }
    for rule in &builder.rules {
        f.declare(&rule.name, &rule.shown, SymbolKind::NonTerminal)?;
    }
    for extra in &builder.extras {
        if !f.names.contains_key(extra) {
            return Err(GrammarTableError::UndefinedRule(extra.clone()));
        }
    }

    for RuleDef { name, expr, .. } in &builder.rules {
        let lhs = f.names[name];
        let mut alts = f.expand(expr, lhs)?;
        dedup_alternatives(&mut alts);
        for alt in alts {
            f.push_production(lhs, alt);
        }
    }

    let resolve_set = |f: &Flattener, names: &[String]| -> Result<SymbolSet, GrammarTableError> {
        names
            .iter()
            .map(|n| {
                f.names
                    .get(n)
                    .copied()
                    .ok_or_else(|| GrammarTableError::UndefinedRule(n.clone()))
            })
            .collect()
    };
    let conflicts = builder
        .conflicts
        .iter()
        .map(|set| resolve_set(&f, set))
        .collect::<Result<Vec<_>, _>>()?;
    let boundaries = resolve_set(&f, &builder.recovery_boundaries)?;

    Ok(Bnf {
        name: builder.name.clone(),
        start: f.names[&first_rule.name],
        symbols: f.symbols,
        tokens: f.tokens,
        externals,
        productions: f.productions,
        origin: f.origin,
        conflicts,
        boundaries,
        field_names: f.field_names,
    })
}

fn dedup_alternatives(alts: &mut Vec<Alt>) {
    let mut seen = rustc_hash::FxHashSet::default();
    alts.retain(|alt| seen.insert(alt.rhs.clone()));
}

impl Flattener {
    fn push_symbol(&mut self, info: SymbolInfo) -> Result<Symbol, GrammarTableError> {
        let limit = usize::from(u16::MAX) - 1;
        if self.symbols.len() >= limit {
            return Err(GrammarTableError::TooLarge { what: "symbols", limit });
        }
        #[allow(clippy::cast_possible_truncation, reason = "bounded by the check above")]
        let symbol = Symbol(self.symbols.len() as u16);
        self.symbols.push(info);
        self.origin.push(symbol);
        Ok(symbol)
    }

    fn declare(&mut self, name: &str, shown: &str, kind: SymbolKind) -> Result<Symbol, GrammarTableError> {
        if self.names.contains_key(name) {
            return Err(GrammarTableError::DuplicateRule(name.to_owned()));
        }
        let symbol = self.push_symbol(SymbolInfo {
            name: shown.to_owned(),
            kind,
            visible: !shown.starts_with('_'),
            named: true,
            extra: false,
        })?;
        self.names.insert(name.to_owned(), symbol);
        Ok(symbol)
    }

    fn literal(&mut self, text: &str) -> Result<Symbol, GrammarTableError> {
        if let Some(&symbol) = self.literals.get(text) {
            return Ok(symbol);
        }
        if text.is_empty() {
            return Err(GrammarTableError::EmptyToken(String::new()));
        }
        let symbol = self.push_symbol(SymbolInfo {
            name: text.to_owned(),
            kind: SymbolKind::Terminal,
            visible: true,
            named: false,
            extra: false,
        })?;
        self.tokens.push(TokenRule {
            symbol,
            pattern: TokenPattern::Literal(text.to_owned()),
            precedence: 0,
        });
        self.literals.insert(text.to_owned(), symbol);
        Ok(symbol)
    }

    fn push_production(&mut self, lhs: Symbol, alt: Alt) {
        let (precedence, associativity) = alt.prec.unwrap_or((0, Associativity::None));
        self.productions.push(Production {
            lhs,
            rhs: alt.rhs,
            precedence,
            associativity,
            fields: alt.fields,
        });
    }

    fn field(&mut self, name: &str) -> Result<FieldId, GrammarTableError> {
        if let Some(i) = self.field_names.iter().position(|n| n == name) {
            #[allow(clippy::cast_possible_truncation, reason = "bounded by the check below")]
            return Ok(FieldId(i as u16));
        }
        let limit = usize::from(u16::MAX);
        if self.field_names.len() >= limit {
            return Err(GrammarTableError::TooLarge { what: "fields", limit });
        }
        #[allow(clippy::cast_possible_truncation, reason = "bounded by the check above")]
        let id = FieldId(self.field_names.len() as u16);
        self.field_names.push(name.to_owned());
        Ok(id)
    }

    /// The hidden rule `aux -> aux body | body`, created on first use.
    fn repetition(&mut self, body: &RuleExpr, owner: Symbol) -> Result<Symbol, GrammarTableError> {
        if let Some(&(_, aux)) = self.repeats.iter().find(|(seen, _)| seen == body) {
            return Ok(aux);
        }
        let rule = self.origin[owner.index()];
        let count = self.repeat_counts.entry(rule).or_insert(0);
        *count += 1;
        let name = format!(
            "_{}_repeat{}",
            self.symbols[rule.index()].name.trim_start_matches('_'),
            count
        );
        let aux = self.push_symbol(SymbolInfo {
            name,
            kind: SymbolKind::NonTerminal,
            visible: false,
            named: false,
            extra: false,
        })?;
        self.origin[aux.index()] = rule;
        self.repeats.push((body.clone(), aux));

        let mut alts = self.expand(body, aux)?;
        dedup_alternatives(&mut alts);
        for alt in alts {
            let mut recursive = alt.clone();
            recursive.rhs.insert(0, aux);
            for (position, _) in &mut recursive.fields {
                *position += 1;
            }
            self.push_production(aux, recursive);
            self.push_production(aux, alt);
        }
        Ok(aux)
    }

    fn expand(&mut self, expr: &RuleExpr, owner: Symbol) -> Result<Vec<Alt>, GrammarTableError> {
        Ok(match expr {
            RuleExpr::Blank => vec![Alt::default()],
            RuleExpr::Sym(name) => {
                let symbol = self
                    .names
                    .get(name)
                    .copied()
                    .ok_or_else(|| GrammarTableError::UndefinedRule(name.clone()))?;
                vec![Alt::of(symbol)]
            }
            RuleExpr::Lit(text) => vec![Alt::of(self.literal(text)?)],
            RuleExpr::Seq(parts) => {
                let mut acc = vec![Alt::default()];
                for part in parts {
                    let tails = self.expand(part, owner)?;
                    if acc.len() * tails.len() > MAX_ALTERNATIVES {
                        return Err(GrammarTableError::TooLarge {
                            what: "alternatives in one rule",
                            limit: MAX_ALTERNATIVES,
                        });
                    }
                    let mut next = Vec::with_capacity(acc.len() * tails.len());
                    for head in &acc {
                        #[allow(clippy::cast_possible_truncation, reason = "production length is checked against u16")]
                        let shift = head.rhs.len() as u16;
                        for tail in &tails {
                            let mut rhs = head.rhs.clone();
                            rhs.extend_from_slice(&tail.rhs);
                            let mut fields = head.fields.clone();
                            fields.extend(tail.fields.iter().map(|&(p, id)| (p + shift, id)));
                            next.push(Alt {
                                rhs,
                                prec: stronger(head.prec, tail.prec),
                                fields,
                            });
                        }
                    }
                    acc = next;
                }
                acc
            }
            RuleExpr::Choice(alternatives) => {
                let mut out = Vec::new();
                for alternative in alternatives {
                    out.extend(self.expand(alternative, owner)?);
                }
                out
            }
            RuleExpr::Repeat(body) => {
                let aux = self.repetition(body, owner)?;
                vec![Alt::of(aux), Alt::default()]
            }
            RuleExpr::Repeat1(body) => {
                let aux = self.repetition(body, owner)?;
                vec![Alt::of(aux)]
            }
            RuleExpr::Prec { level, assoc, body } => {
                let mut alts = self.expand(body, owner)?;
                for alt in &mut alts {
                    alt.prec = alt.prec.or(Some((*level, *assoc)));
                }
                alts
            }
            RuleExpr::Field { name, body } => {
                let id = self.field(name)?;
                let mut alts = self.expand(body, owner)?;
                for alt in &mut alts {
                    alt.name_children(id);
                }
                alts
            }
        })
    }
}

fn stronger(
    a: Option<(i32, Associativity)>,
    b: Option<(i32, Associativity)>,
) -> Option<(i32, Associativity)> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if y.0 > x.0 { y } else { x }),
        (x, y) => x.or(y),
    }
}
