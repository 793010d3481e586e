//! Per-parse statistics.

use crate::reuse::CursorStats;

/// What a parse did, for diagnostics and incremental-reuse checks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Tokens produced by the lexer, including lookaheads that were later
    /// replaced by a reused subtree.
    pub lexed_tokens: usize,
    /// Leaves taken from the previous tree by identity.
    pub reused_leaves: usize,
    /// Nonterminal subtrees taken from the previous tree whole.
    pub reused_subtrees: usize,
    /// Error recoveries started.
    pub recoveries: usize,
    /// Most stack versions alive at once.
    pub max_versions: usize,
    /// Consumed tokens counted against the budget.
    pub operations: u64,
    pub cursor: CursorStats,
}

impl ParseStats {
    /// Share of consumed input that came from the previous tree, as a
    /// percentage of reused items over reused items plus lexed tokens.
    #[allow(
        clippy::cast_precision_loss,
        reason = "counts won't approach 2^52; precision loss irrelevant for display"
    )]
    pub fn reuse_rate(&self) -> f64 {
        let reused = self.reused_leaves + self.reused_subtrees;
        let total = reused + self.lexed_tokens;
        if total == 0 {
            0.0
        } else {
            (reused as f64 / total as f64) * 100.0
        }
    }
}
