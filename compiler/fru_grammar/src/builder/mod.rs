//! Declarative grammar builder.
//!
//! Compiles a grammar written with the [`rule`] combinators into a
//! [`GrammarTable`]. This is the in-repository grammar compiler: languages
//! shipped with the engine build their tables with it, and tests use it to
//! produce small tables on the fly.
//!
//! # Pipeline
//!
//! 1. **Flatten** ([`flatten`]): rule expressions become plain productions;
//!    symbols receive their final ids.
//! 2. **LR(1)** ([`lr`]): canonical item sets with lookaheads.
//! 3. **Resolve** ([`resolve`]): action lists per state, with precedence,
//!    associativity and declared conflicts applied.
//! 4. **Minimize** ([`minimize`]): compatible same-core states are merged.
//!
//! # Conventions
//!
//! - The first rule added is the start rule.
//! - Names starting with `_` are hidden: hidden rules are inlined into their
//!   parent node, hidden tokens stay in the tree but are skipped by visible
//!   navigation.
//! - Literal tokens (`lit("+")`) are anonymous; rules and tokens declared with
//!   [`GrammarBuilder::token`] are named.

mod flatten;
mod lr;
mod minimize;
mod resolve;
pub mod rule;

use crate::error::GrammarTableError;
use crate::table::{GrammarTable, Rule, TokenPattern};

use rule::RuleExpr;

struct TokenDef {
    name: String,
    pattern: TokenPattern,
    precedence: i32,
}

struct RuleDef {
    name: String,
    /// Symbol name shown in trees; differs from `name` for aliased rules.
    shown: String,
    expr: RuleExpr,
}

/// Collects a grammar definition and compiles it to a table.
pub struct GrammarBuilder {
    name: String,
    tokens: Vec<TokenDef>,
    externals: Vec<String>,
    extras: Vec<String>,
    rules: Vec<RuleDef>,
    conflicts: Vec<Vec<String>>,
    recovery_boundaries: Vec<String>,
}

impl GrammarBuilder {
    pub fn new(name: &str) -> Self {
        GrammarBuilder {
            name: name.to_owned(),
            tokens: Vec::new(),
            externals: Vec::new(),
            extras: Vec::new(),
            rules: Vec::new(),
            conflicts: Vec::new(),
            recovery_boundaries: Vec::new(),
        }
    }

    /// Declare a named token matched by the builtin lexer.
    pub fn token(&mut self, name: &str, pattern: TokenPattern) -> &mut Self {
        self.token_with_precedence(name, pattern, 0)
    }

    /// Declare a named token whose precedence breaks equal-length ties with
    /// other tokens of the same class.
    pub fn token_with_precedence(&mut self, name: &str, pattern: TokenPattern, precedence: i32) -> &mut Self {
        self.tokens.push(TokenDef {
            name: name.to_owned(),
            pattern,
            precedence,
        });
        self
    }

    /// Declare a token produced by the language's external scanner. The
    /// declaration order is the index order the scanner sees.
    pub fn external(&mut self, name: &str) -> &mut Self {
        self.externals.push(name.to_owned());
        self
    }

    /// Allow a declared token anywhere between two tokens.
    pub fn extra(&mut self, name: &str) -> &mut Self {
        self.extras.push(name.to_owned());
        self
    }

    pub fn rule(&mut self, name: &str, expr: RuleExpr) -> &mut Self {
        self.rule_as(name, name, expr)
    }

    /// A rule referenced as `name` in the grammar but shown as `shown` in
    /// trees. Several rules may share one shown name.
    pub fn rule_as(&mut self, name: &str, shown: &str, expr: RuleExpr) -> &mut Self {
        self.rules.push(RuleDef {
            name: name.to_owned(),
            shown: shown.to_owned(),
            expr,
        });
        self
    }

    /// Declare that the given rules are expected to conflict. Conflicts among
    /// them that precedence does not settle are kept in the table and
    /// explored in parallel at parse time.
    pub fn conflict(&mut self, rules: &[&str]) -> &mut Self {
        self.conflicts.push(rules.iter().map(|&r| r.to_owned()).collect());
        self
    }

    /// Mark a rule as a recovery boundary: states where this rule may start
    /// are places where error recovery can resynchronize.
    pub fn recovery_boundary(&mut self, name: &str) -> &mut Self {
        self.recovery_boundaries.push(name.to_owned());
        self
    }

    /// Compile the grammar.
    #[tracing::instrument(level = "debug", skip_all, fields(name = %self.name))]
    pub fn build(&self) -> Result<GrammarTable, GrammarTableError> {
        let bnf = flatten::flatten(self)?;
        let limit = usize::from(u16::MAX) - 1;
        if bnf.productions.len() >= limit {
            return Err(GrammarTableError::TooLarge { what: "rules", limit });
        }

        let analysis = lr::Analysis::new(&bnf);
        let automaton = analysis.build()?;
        let mut counts = resolve::ConflictCounts::default();
        let resolved = resolve::resolve(&analysis, &automaton, &mut counts);
        let (states, start_state) = minimize::minimize(&resolved);

        tracing::debug!(
            canonical = resolved.len(),
            states = states.len(),
            rules = bnf.productions.len(),
            kept_conflicts = counts.kept,
            defaulted_conflicts = counts.defaulted,
            "built grammar table"
        );

        #[allow(clippy::cast_possible_truncation, reason = "rule length bounded by source grammar")]
        let rules = bnf
            .productions
            .iter()
            .map(|p| Rule {
                lhs: p.lhs,
                arity: p.rhs.len() as u16,
                precedence: p.precedence,
                associativity: p.associativity,
                fields: p.fields.clone(),
            })
            .collect();

        let table = GrammarTable {
            name: bnf.name,
            start_symbol: bnf.start,
            symbols: bnf.symbols,
            tokens: bnf.tokens,
            externals: bnf.externals,
            rules,
            states,
            start_state,
            field_names: bnf.field_names,
        };
        table.validate()?;
        Ok(table)
    }
}
