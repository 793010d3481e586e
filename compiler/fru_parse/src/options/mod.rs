//! Parse configuration and the per-parse budget.
//!
//! A budget is checked once per consumed token. Exceeding it aborts the
//! parse with [`ParseError::BudgetExceeded`]; no partial tree is returned and
//! any previous tree passed in is left untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{BudgetReason, ParseError};

/// Live stack versions allowed at once in GLR mode.
pub const DEFAULT_MAX_VERSIONS: usize = 6;

/// Options for [`Parser`](crate::Parser).
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Maximum number of consumed tokens.
    pub max_operations: Option<u64>,
    pub deadline: Option<Instant>,
    /// Raised by the caller (from any thread) to abort the parse.
    pub cancellation: Option<Arc<AtomicBool>>,
    pub max_versions: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_operations: None,
            deadline: None,
            cancellation: None,
            max_versions: DEFAULT_MAX_VERSIONS,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_operations(mut self, limit: u64) -> Self {
        self.max_operations = Some(limit);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// At least one version is always kept.
    #[must_use]
    pub fn with_max_versions(mut self, max: usize) -> Self {
        self.max_versions = max.max(1);
        self
    }
}

/// Operation counter for a single parse.
pub(crate) struct Budget<'a> {
    options: &'a ParseOptions,
    operations: u64,
}

impl<'a> Budget<'a> {
    pub(crate) fn new(options: &'a ParseOptions) -> Self {
        Budget {
            options,
            operations: 0,
        }
    }

    /// Account for one consumed token.
    pub(crate) fn tick(&mut self) -> Result<(), ParseError> {
        self.operations += 1;
        if let Some(limit) = self.options.max_operations {
            if self.operations > limit {
                return Err(exceeded(BudgetReason::Operations { limit }));
            }
        }
        if let Some(flag) = &self.options.cancellation {
            if flag.load(Ordering::Relaxed) {
                return Err(exceeded(BudgetReason::Cancelled));
            }
        }
        if let Some(deadline) = self.options.deadline {
            if Instant::now() >= deadline {
                return Err(exceeded(BudgetReason::Deadline));
            }
        }
        Ok(())
    }

    pub(crate) fn operations(&self) -> u64 {
        self.operations
    }
}

fn exceeded(reason: BudgetReason) -> ParseError {
    tracing::debug!(%reason, "parse budget exceeded");
    ParseError::BudgetExceeded { reason }
}
