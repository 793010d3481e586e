//! Errors that stop a parse without producing a tree.
//!
//! Malformed source is never one of them: lexical and syntax errors become
//! `ERROR` and `MISSING` nodes in the returned tree.

use std::fmt;

use thiserror::Error;

/// Why a budgeted parse gave up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BudgetReason {
    /// More tokens were consumed than the operation limit allows.
    Operations { limit: u64 },
    /// The deadline passed.
    Deadline,
    /// The caller raised the cancellation flag.
    Cancelled,
}

impl fmt::Display for BudgetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetReason::Operations { limit } => write!(f, "operation limit of {limit} reached"),
            BudgetReason::Deadline => f.write_str("deadline passed"),
            BudgetReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no language set on the parser")]
    NoLanguage,

    #[error("parse aborted: {reason}")]
    BudgetExceeded { reason: BudgetReason },
}
