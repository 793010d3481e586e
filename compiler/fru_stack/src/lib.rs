//! Stack-growth guard for deep recursion.
//!
//! Syntax trees for pathological input (thousands of nested parentheses, a
//! long chain of left-associative operators) are deep. Every recursive walk
//! over a tree (S-expression rendering, edit path-copying, structural
//! comparison, leaf collection) goes through [`ensure_sufficient_stack`] so
//! that depth is bounded by memory rather than by the thread's stack size.
//!
//! - **Native targets**: `stacker` grows the stack on demand.
//! - **WASM targets**: no-op passthrough.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version: call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
