//! The `table` command: write and validate serialized grammar tables.

use std::io::Write;

use fru_grammar::Language;

use super::{read_bytes, CommandError};

/// Serialize the built-in Frugurt table to `path`.
pub fn dump_table(path: &str, out: &mut impl Write) -> Result<(), CommandError> {
    let bytes = fru_lang::language().table().to_bytes()?;
    std::fs::write(path, &bytes).map_err(|source| CommandError::Write {
        path: path.to_string(),
        source,
    })?;
    writeln!(out, "wrote {} bytes to {path}", bytes.len())?;
    Ok(())
}

/// Load a serialized table, validate it, and summarize it.
///
/// A table that loads but differs from the built-in grammar is reported as
/// stale, not as an error.
pub fn check_table(path: &str, out: &mut impl Write) -> Result<(), CommandError> {
    let bytes = read_bytes(path)?;
    let language = Language::from_bytes(&bytes)?;
    let table = language.table();
    writeln!(
        out,
        "{path}: grammar `{}`, {} states, {} symbols, {} rules",
        language.name(),
        table.states.len(),
        table.symbols.len(),
        table.rules.len(),
    )?;

    let current = fru_lang::language().table().to_bytes()?;
    if current == bytes {
        writeln!(out, "matches the built-in grammar")?;
    } else {
        writeln!(out, "stale: differs from the built-in grammar")?;
    }
    Ok(())
}
