//! External scanners: hand-written tokenization for context-sensitive tokens.
//!
//! A scanner is created per parse from the factory registered on the
//! [`Language`](crate::Language). Its state is never shared: the driver takes
//! a [`ScannerState`] checkpoint after every external scan and stores it with
//! the stack version and on the produced leaf, and restores it before the
//! next scan. Incremental reparsing compares checkpoints to decide whether a
//! previously built subtree was lexed under the same scanner state.

use std::fmt;
use std::sync::Arc;

use fru_lexer_core::Cursor;

/// Serialized scanner state. Empty states do not allocate.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScannerState(Option<Arc<[u8]>>);

impl ScannerState {
    pub const EMPTY: ScannerState = ScannerState(None);

    pub fn new(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            ScannerState(None)
        } else {
            ScannerState(Some(Arc::from(bytes)))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_deref().unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for ScannerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScannerState({:?})", self.as_bytes())
    }
}

/// Context-sensitive tokenizer supplied by a language.
///
/// `valid[i]` says whether the `i`-th external token of the table (in
/// declaration order) is acceptable in the current parse state. On success
/// the scanner leaves the cursor at the end of the token and returns the
/// token's index; on failure the cursor position is ignored.
pub trait ExternalScanner: Send {
    fn scan(&mut self, cursor: &mut Cursor<'_>, valid: &[bool]) -> Option<usize>;

    /// Snapshot the scanner-local state.
    fn checkpoint(&self) -> ScannerState;

    /// Roll back to a snapshot taken by [`checkpoint`](Self::checkpoint)
    /// (or to the initial state for [`ScannerState::EMPTY`]).
    fn restore(&mut self, state: &ScannerState);
}

/// Creates a fresh scanner for each parse.
pub type ScannerFactory = Arc<dyn Fn() -> Box<dyn ExternalScanner> + Send + Sync>;
