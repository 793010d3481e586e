//! The `edit` command: apply one edit and reparse incrementally.

use std::io::Write;

use fru_parse::{ParseStats, Parser};
use fru_syntax::InputEdit;

use super::{read_file, CommandError};

/// Replace `source[start..old_end]` with `text`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditRequest {
    pub start: u32,
    pub old_end: u32,
    pub text: String,
}

impl EditRequest {
    /// Parse the command-line form `<start> <old_end> <text>`.
    pub fn parse(start: &str, old_end: &str, text: &str) -> Result<EditRequest, CommandError> {
        let offset = |arg: &str| {
            arg.parse::<u32>()
                .map_err(|_| CommandError::InvalidEdit(format!("'{arg}' is not a byte offset")))
        };
        let request = EditRequest {
            start: offset(start)?,
            old_end: offset(old_end)?,
            text: text.to_string(),
        };
        if request.start > request.old_end {
            return Err(CommandError::InvalidEdit(format!(
                "start {} is past end {}",
                request.start, request.old_end
            )));
        }
        Ok(request)
    }

    /// The edited text, or why the offsets don't fit `source`.
    pub fn apply(&self, source: &str) -> Result<String, CommandError> {
        let (start, end) = (self.start as usize, self.old_end as usize);
        let (Some(before), Some(after)) = (source.get(..start), source.get(end..)) else {
            return Err(CommandError::InvalidEdit(format!(
                "{start}..{end} is out of bounds or splits a character (source is {} bytes)",
                source.len()
            )));
        };
        Ok(format!("{before}{}{after}", self.text))
    }
}

/// Parse `path`, apply `request`, reparse with the old tree, and print the
/// new tree with reuse statistics.
pub fn edit_file(
    path: &str,
    request: &EditRequest,
    out: &mut impl Write,
) -> Result<ParseStats, CommandError> {
    let old_source = read_file(path)?;
    let new_source = request.apply(&old_source)?;

    let mut parser = Parser::new();
    parser.set_language(fru_lang::language().clone());
    let old = parser.parse(&old_source, None)?;
    let edit = InputEdit::replace(&old_source, request.start, request.old_end, &request.text);
    let new = parser.parse(&new_source, Some(&old.edit(&edit)))?;
    let stats = parser.stats().clone();

    let cold = fru_lang::parse(&new_source, None)?;
    writeln!(out, "{}", new.to_sexp())?;
    writeln!(out, "lexed tokens:    {}", stats.lexed_tokens)?;
    writeln!(out, "reused leaves:   {}", stats.reused_leaves)?;
    writeln!(out, "reused subtrees: {}", stats.reused_subtrees)?;
    writeln!(out, "reuse rate:      {:.1}%", stats.reuse_rate())?;
    writeln!(out, "recoveries:      {}", stats.recoveries)?;
    writeln!(out, "max versions:    {}", stats.max_versions)?;
    writeln!(
        out,
        "matches cold parse: {}",
        if new.same_shape(&cold) { "yes" } else { "no" }
    )?;
    Ok(stats)
}
