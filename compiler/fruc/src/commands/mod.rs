//! Command handlers for the `fruc` CLI.
//!
//! Each submodule implements one command. Shared helpers (`read_file`, the
//! error type) live here in the module root.

use std::path::Path;

use fru_grammar::GrammarTableError;
use fru_parse::ParseError;

mod check;
mod edit;
mod parse;
mod table;

pub use check::{check_files, check_source, collect_problems, Problem, ProblemKind};
pub use edit::{edit_file, EditRequest};
pub use parse::parse_files;
pub use table::{check_table, dump_table};

/// Why a command could not run to completion.
///
/// Syntax errors in the input are not among these: `check` reports them as
/// diagnostics and `parse` prints them as part of the tree.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' is not UTF-8")]
    NotUtf8 { path: String },

    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Table(#[from] GrammarTableError),

    #[error("output: {0}")]
    Output(#[from] std::io::Error),
}

/// Read a source file as UTF-8.
pub(crate) fn read_file(path: &str) -> Result<String, CommandError> {
    let bytes = read_bytes(path)?;
    String::from_utf8(bytes).map_err(|_| CommandError::NotUtf8 {
        path: path.to_string(),
    })
}

pub(crate) fn read_bytes(path: &str) -> Result<Vec<u8>, CommandError> {
    std::fs::read(Path::new(path)).map_err(|source| CommandError::Read {
        path: path.to_string(),
        source,
    })
}
