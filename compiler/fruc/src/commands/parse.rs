//! The `parse` command: print the tree of each file as an S-expression.

use std::io::Write;

use rayon::prelude::*;

use super::{read_file, CommandError};

/// Parse every file in parallel and print their trees in argument order.
///
/// Each tree is preceded by a `path:` header line. The first unreadable
/// file aborts the command before anything is printed.
pub fn parse_files(paths: &[String], out: &mut impl Write) -> Result<(), CommandError> {
    let trees = paths
        .par_iter()
        .map(|path| {
            let source = read_file(path)?;
            let tree = fru_lang::parse(&source, None)?;
            tracing::debug!(path = %path, bytes = source.len(), errors = tree.has_error(), "parsed");
            Ok(tree.to_sexp())
        })
        .collect::<Result<Vec<String>, CommandError>>()?;

    for (path, sexp) in paths.iter().zip(trees) {
        writeln!(out, "{path}:")?;
        writeln!(out, "{sexp}")?;
    }
    Ok(())
}
