//! Persistent syntax trees for the Frugurt parsing engine.
//!
//! # Layers
//!
//! - **Green** ([`GreenNode`]): immutable, `Arc`-shared nodes that store
//!   lengths and relative child offsets, never absolute positions. The
//!   parser builds them bottom-up; edits path-copy them.
//! - **Red** ([`SyntaxNode`]): positioned, parent-aware views created on
//!   demand for navigation.
//! - **[`Tree`]**: a root green node plus its [`Language`](fru_grammar::Language).
//!
//! ```text
//! Tree ──root──▶ GreenNode(program)
//!                  ├─ +0  GreenNode(sum)
//!                  │        ├─ +0 num "a"
//!                  │        ├─ +1 "+"
//!                  │        └─ +2 num "b"
//!                  └─ ...
//! ```
//!
//! Extras (whitespace, comments) are ordinary leaves, so the leaves of a
//! tree always cover its source exactly once. Hidden leaves are skipped by
//! the visible and named navigation APIs.

mod cursor;
mod edit;
mod green;
mod node;
mod sexp;
mod tree;

pub use cursor::TreeCursor;
pub use edit::InputEdit;
pub use green::{GreenChild, GreenNode, LeafInfo, NodeFlags};
pub use node::SyntaxNode;
pub use tree::{LeafEntry, Leaves, Tree};

#[cfg(test)]
mod test_helpers;
