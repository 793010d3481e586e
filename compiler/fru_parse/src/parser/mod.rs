//! The public parsing entry points.

use fru_grammar::Language;
use fru_lexer_core::{Point, SourceBuffer};
use fru_syntax::Tree;

use crate::driver::Driver;
use crate::error::ParseError;
use crate::options::ParseOptions;
use crate::stats::ParseStats;

/// A reusable parser: a language, options, and the statistics of the last
/// parse.
///
/// Parsers are cheap to create. Independent parses of the same language can
/// run on different threads, each with its own `Parser`.
#[derive(Debug, Default)]
pub struct Parser {
    language: Option<Language>,
    options: ParseOptions,
    stats: ParseStats,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = Some(language);
    }

    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    pub fn set_options(&mut self, options: ParseOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Statistics of the last successful parse.
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Parse `source`, reusing what still applies from `old`.
    ///
    /// `old` must already have the edits that turned its text into `source`
    /// applied (see [`Tree::edit`]). A tree of another language or length is
    /// ignored. The only errors are a missing language and an exceeded
    /// budget; malformed source still produces a tree.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(len = source.as_ref().len(), incremental = old.is_some())
    )]
    pub fn parse(&mut self, source: impl AsRef<[u8]>, old: Option<&Tree>) -> Result<Tree, ParseError> {
        let language = self.language.as_ref().ok_or(ParseError::NoLanguage)?;
        let buffer = SourceBuffer::from_bytes(source.as_ref());
        let (root, stats) = Driver::new(language, &buffer, old, &self.options).run()?;
        tracing::debug!(
            lexed = stats.lexed_tokens,
            reused_subtrees = stats.reused_subtrees,
            reused_leaves = stats.reused_leaves,
            recoveries = stats.recoveries,
            "parse finished"
        );
        self.stats = stats;
        Ok(Tree::new(root, language.clone()))
    }

    /// Parse text supplied in chunks by `read`.
    ///
    /// `read` is called with the byte offset and point where the next chunk
    /// starts and returns the chunk; an empty chunk ends the input.
    pub fn parse_with<T, F>(&mut self, mut read: F, old: Option<&Tree>) -> Result<Tree, ParseError>
    where
        T: AsRef<[u8]>,
        F: FnMut(u32, Point) -> T,
    {
        if self.language.is_none() {
            return Err(ParseError::NoLanguage);
        }
        let mut text = Vec::new();
        let mut point = Point::ZERO;
        loop {
            let offset = u32::try_from(text.len()).unwrap_or(u32::MAX);
            let chunk = read(offset, point);
            let chunk = chunk.as_ref();
            if chunk.is_empty() || offset == u32::MAX {
                break;
            }
            point = point.add_extent(Point::extent_of(chunk));
            text.extend_from_slice(chunk);
        }
        self.parse(text, old)
    }
}

/// Parse `source` with default options.
pub fn parse(language: &Language, source: &str, old: Option<&Tree>) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    parser.set_language(language.clone());
    parser.parse(source, old)
}
