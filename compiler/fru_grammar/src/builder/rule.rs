//! Rule expressions.
//!
//! Grammars are written as trees of [`RuleExpr`] built with the free
//! functions in this module, mirroring the usual grammar-DSL combinators:
//!
//! ```text
//! g.rule("binary", prec_left(5, seq([sym("_expr"), lit("+"), sym("_expr")])));
//! g.rule("args", seq([lit("("), optional(sep_by(sym("_expr"), ",")), lit(")")]));
//! g.rule("call", seq([field("what", sym("_expr")), field("args", sym("args"))]));
//! ```

use crate::table::Associativity;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleExpr {
    /// Matches nothing.
    Blank,
    /// A rule, named token or external token, by name.
    Sym(String),
    /// An anonymous literal token.
    Lit(String),
    Seq(Vec<RuleExpr>),
    Choice(Vec<RuleExpr>),
    /// Zero or more.
    Repeat(Box<RuleExpr>),
    /// One or more.
    Repeat1(Box<RuleExpr>),
    Prec {
        level: i32,
        assoc: Associativity,
        body: Box<RuleExpr>,
    },
    /// Every child produced by `body` gets the field `name`, unless a field
    /// nested inside `body` already names it.
    Field { name: String, body: Box<RuleExpr> },
}

pub fn blank() -> RuleExpr {
    RuleExpr::Blank
}

pub fn sym(name: &str) -> RuleExpr {
    RuleExpr::Sym(name.to_owned())
}

pub fn lit(text: &str) -> RuleExpr {
    RuleExpr::Lit(text.to_owned())
}

pub fn seq(parts: impl IntoIterator<Item = RuleExpr>) -> RuleExpr {
    RuleExpr::Seq(parts.into_iter().collect())
}

pub fn choice(alternatives: impl IntoIterator<Item = RuleExpr>) -> RuleExpr {
    RuleExpr::Choice(alternatives.into_iter().collect())
}

pub fn repeat(body: RuleExpr) -> RuleExpr {
    RuleExpr::Repeat(Box::new(body))
}

pub fn repeat1(body: RuleExpr) -> RuleExpr {
    RuleExpr::Repeat1(Box::new(body))
}

pub fn optional(body: RuleExpr) -> RuleExpr {
    RuleExpr::Choice(vec![body, RuleExpr::Blank])
}

pub fn prec(level: i32, body: RuleExpr) -> RuleExpr {
    RuleExpr::Prec {
        level,
        assoc: Associativity::None,
        body: Box::new(body),
    }
}

pub fn prec_left(level: i32, body: RuleExpr) -> RuleExpr {
    RuleExpr::Prec {
        level,
        assoc: Associativity::Left,
        body: Box::new(body),
    }
}

pub fn prec_right(level: i32, body: RuleExpr) -> RuleExpr {
    RuleExpr::Prec {
        level,
        assoc: Associativity::Right,
        body: Box::new(body),
    }
}

pub fn field(name: &str, body: RuleExpr) -> RuleExpr {
    RuleExpr::Field {
        name: name.to_owned(),
        body: Box::new(body),
    }
}

/// `rule (sep rule)* sep?`, the separated list with optional trailing
/// separator. Wrap in [`optional`] to also allow the empty list.
pub fn sep_by1(rule: RuleExpr, sep: &str) -> RuleExpr {
    seq([
        rule.clone(),
        repeat(seq([lit(sep), rule])),
        optional(lit(sep)),
    ])
}

/// Possibly empty [`sep_by1`].
pub fn sep_by(rule: RuleExpr, sep: &str) -> RuleExpr {
    optional(sep_by1(rule, sep))
}
