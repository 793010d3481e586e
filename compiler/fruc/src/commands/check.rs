//! The `check` command: report `ERROR` and `MISSING` nodes as diagnostics.

use std::io::Write;
use std::ops::Range;

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use rayon::prelude::*;

use fru_syntax::{SyntaxNode, Tree};

use super::{read_file, CommandError};

type Span = (String, Range<usize>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProblemKind {
    /// Text the parser could not fit into the grammar.
    Unexpected,
    /// A token the parser assumed present; carries its kind.
    Missing(String),
}

/// One syntax problem found in a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
    pub kind: ProblemKind,
    pub range: Range<usize>,
}

impl Problem {
    /// One-line description, quoting the offending text when there is any.
    pub fn message(&self, source: &str) -> String {
        match &self.kind {
            ProblemKind::Missing(kind) => format!("missing `{kind}`"),
            ProblemKind::Unexpected => match source.get(self.range.clone()) {
                Some(text) if !text.trim().is_empty() => {
                    format!("unexpected `{}`", text.trim())
                }
                _ => "syntax error".to_string(),
            },
        }
    }
}

/// Every error and missing node in `tree`, in source order.
///
/// The contents of an error node are not searched: the whole span is one
/// problem.
pub fn collect_problems(tree: &Tree) -> Vec<Problem> {
    let mut problems = Vec::new();
    let mut stack: Vec<SyntaxNode> = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if !node.has_error() {
            continue;
        }
        let range = node.start_byte() as usize..node.end_byte() as usize;
        if node.is_missing() {
            problems.push(Problem {
                kind: ProblemKind::Missing(node.kind().to_string()),
                range,
            });
        } else if node.is_error() {
            problems.push(Problem {
                kind: ProblemKind::Unexpected,
                range,
            });
        } else {
            let children: Vec<SyntaxNode> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
    }
    problems
}

/// Parse `source` and render one report per problem into `out`.
///
/// Returns the number of problems.
pub fn check_source(path: &str, source: &str, out: &mut impl Write) -> Result<usize, CommandError> {
    let tree = fru_lang::parse(source, None)?;
    let problems = collect_problems(&tree);
    render(path, source, &problems, out)?;
    Ok(problems.len())
}

/// Check every file; `Ok(true)` when at least one has problems.
pub fn check_files(paths: &[String], out: &mut impl Write) -> Result<bool, CommandError> {
    let checked = paths
        .par_iter()
        .map(|path| {
            let source = read_file(path)?;
            let tree = fru_lang::parse(&source, None)?;
            let problems = collect_problems(&tree);
            Ok((source, problems))
        })
        .collect::<Result<Vec<_>, CommandError>>()?;

    let mut total = 0;
    for (path, (source, problems)) in paths.iter().zip(&checked) {
        render(path, source, problems, out)?;
        total += problems.len();
    }

    match total {
        0 => writeln!(out, "checked {} file(s): no problems", paths.len())?,
        n => writeln!(out, "checked {} file(s): {n} problem(s)", paths.len())?,
    }
    Ok(total > 0)
}

fn render(
    path: &str,
    source: &str,
    problems: &[Problem],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    for problem in problems {
        let message = problem.message(source);
        Report::<Span>::build(ReportKind::Error, path.to_string(), problem.range.start)
            .with_config(
                Config::default()
                    .with_color(false)
                    .with_index_type(IndexType::Byte),
            )
            .with_message(&message)
            .with_label(Label::new((path.to_string(), problem.range.clone())).with_message(message))
            .finish()
            .write((path.to_string(), Source::from(source.to_string())), &mut *out)?;
    }
    Ok(())
}
