//! Frugurt command-line host.
//!
//! The binary is a thin argument parser over [`commands`]; every command
//! writes to a caller-supplied writer so the same code paths run under test.

use std::sync::Once;

pub mod commands;

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber, once per process.
///
/// Nothing is installed unless `RUST_LOG` is set. Spans render as an
/// indented tree on stderr, e.g. `RUST_LOG=fru_parse=debug fruc parse a.fru`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env())
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .init();
        }
    });
}
