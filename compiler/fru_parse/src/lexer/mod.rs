//! Contextual lexer.
//!
//! Tokens are produced on demand for one parse state at a time. The state's
//! valid terminals (plus extras) restrict which matchers are tried, so the
//! same bytes can lex differently in different contexts.
//!
//! # Matching order
//!
//! 1. The external scanner, only when some external token is valid. Its
//!    state is restored from the stack version's checkpoint before every
//!    scan and checkpointed again after a successful one.
//! 2. Builtin matchers: longest match wins; on equal length a literal beats
//!    a pattern, then higher precedence, then declaration order.
//! 3. Error mode: the same matching over every builtin token, so recovery
//!    can skip a real token instead of single bytes.
//! 4. One UTF-8 character as an `ERROR` token.
//!
//! # Lookahead
//!
//! A token's `lookahead_bytes` is how far past its end any matcher tried at
//! its position read, failed matchers and the external scanner included. An
//! unterminated block comment that was tried and rejected therefore makes the
//! token depend on the rest of the file, so closing the comment later
//! invalidates it.

use std::cell::Cell;

use fru_grammar::{ExternalScanner, Language, ScannerState, StateId, Symbol, SymbolSet};
use fru_lexer_core::{Cursor, Point, SourceBuffer};
use fru_syntax::{GreenNode, LeafInfo, NodeFlags};

/// A lexed token, owned by a stack version until it becomes a leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) symbol: Symbol,
    pub(crate) start: u32,
    pub(crate) len: u32,
    pub(crate) extent: Point,
    pub(crate) lookahead_bytes: u32,
    pub(crate) scanner_before: ScannerState,
    pub(crate) scanner_after: ScannerState,
    pub(crate) external: bool,
}

impl Token {
    #[inline]
    pub(crate) fn end(&self) -> u32 {
        self.start + self.len
    }

    #[inline]
    pub(crate) fn is_end(&self) -> bool {
        self.symbol == Symbol::END
    }

    /// Bytes that matched no token at all.
    #[inline]
    pub(crate) fn is_lex_error(&self) -> bool {
        self.symbol.is_error()
    }

    /// Furthest byte the lexer depended on when producing this token.
    #[inline]
    pub(crate) fn reach(&self) -> u32 {
        self.end() + self.lookahead_bytes
    }

    pub(crate) fn to_leaf(&self, language: &Language, parse_state: StateId) -> GreenNode {
        let mut flags = NodeFlags::for_symbol(language, self.symbol);
        if self.external {
            flags |= NodeFlags::HAS_EXTERNAL;
        }
        GreenNode::leaf(LeafInfo {
            symbol: self.symbol,
            flags,
            len: self.len,
            extent: self.extent,
            parse_state,
            lookahead_bytes: self.lookahead_bytes,
            scanner_before: self.scanner_before.clone(),
            scanner_after: self.scanner_after.clone(),
        })
    }

    /// Whether `leaf` from an older tree is exactly this token.
    pub(crate) fn matches_leaf(&self, leaf: &GreenNode) -> bool {
        leaf.is_leaf()
            && !leaf.has_changes()
            && !leaf.is_missing()
            && leaf.symbol() == self.symbol
            && leaf.len() == self.len
            && leaf.extent() == self.extent
            && leaf.lookahead_bytes() == self.lookahead_bytes
            && leaf.scanner_before() == &self.scanner_before
            && leaf.scanner_after() == &self.scanner_after
    }
}

/// Tokenizer over one source buffer, for one parse.
pub(crate) struct Lexer<'a> {
    language: &'a Language,
    source: &'a SourceBuffer,
    scanner: Option<Box<dyn ExternalScanner>>,
    /// Reused validity mask handed to the external scanner.
    external_valid: Vec<bool>,
    lexed: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(language: &'a Language, source: &'a SourceBuffer) -> Self {
        Lexer {
            language,
            source,
            scanner: language.new_external_scanner(),
            external_valid: Vec::with_capacity(language.externals().len()),
            lexed: 0,
        }
    }

    /// Number of tokens produced so far.
    pub(crate) fn lexed(&self) -> usize {
        self.lexed
    }

    /// The token at `pos` for a parser in `state`, with the external scanner
    /// in `scanner_state`.
    pub(crate) fn lex(&mut self, pos: u32, state: StateId, scanner_state: &ScannerState) -> Token {
        self.lexed += 1;
        if pos >= self.source.len() {
            return Token {
                symbol: Symbol::END,
                start: self.source.len(),
                len: 0,
                extent: Point::ZERO,
                lookahead_bytes: 0,
                scanner_before: scanner_state.clone(),
                scanner_after: scanner_state.clone(),
                external: false,
            };
        }

        // Furthest byte any matcher read, whichever one produced the token.
        let mut examined = pos;
        let valid = self.language.valid_tokens(state);
        let (symbol, len, after, external) = if let Some((symbol, len, after)) =
            self.scan_external(pos, valid, scanner_state, &mut examined)
        {
            (symbol, len, after, true)
        } else if let Some((symbol, len)) = self.match_builtin(pos, Some(valid), &mut examined) {
            (symbol, len, scanner_state.clone(), false)
        } else if let Some((symbol, len)) = self.match_builtin(pos, None, &mut examined) {
            tracing::trace!(
                pos,
                symbol = self.language.symbol_name(symbol),
                "lexed invalid token in error mode"
            );
            (symbol, len, scanner_state.clone(), false)
        } else {
            let byte = self.source.slice(pos, pos + 1).first().copied().unwrap_or(0);
            let len = Cursor::utf8_char_width(byte).min(self.source.len() - pos);
            tracing::trace!(pos, len, "unrecognized character");
            (Symbol::ERROR, len, scanner_state.clone(), false)
        };
        let end = pos + len;
        Token {
            symbol,
            start: pos,
            len,
            extent: Point::extent_of(self.source.slice(pos, end)),
            lookahead_bytes: examined.max(end) - end,
            scanner_before: scanner_state.clone(),
            scanner_after: after,
            external,
        }
    }

    fn scan_external(
        &mut self,
        pos: u32,
        valid: &SymbolSet,
        scanner_state: &ScannerState,
        examined: &mut u32,
    ) -> Option<(Symbol, u32, ScannerState)> {
        let language = self.language;
        let scanner = self.scanner.as_mut()?;
        let externals = language.externals();
        self.external_valid.clear();
        self.external_valid.extend(
            externals
                .iter()
                .map(|&symbol| valid.contains(symbol) || language.is_extra(symbol)),
        );
        if !self.external_valid.contains(&true) {
            return None;
        }

        scanner.restore(scanner_state);
        let reach = Cell::new(pos);
        let mut cursor = self.source.cursor_at(pos).track_reach(&reach);
        let scanned = scanner.scan(&mut cursor, &self.external_valid);
        let end = cursor.pos();
        *examined = (*examined).max(reach.get()).max(end);
        let index = scanned?;
        let accepted = self.external_valid.get(index).copied().unwrap_or(false);
        match externals.get(index) {
            Some(&symbol) if accepted && end > pos => Some((symbol, end - pos, scanner.checkpoint())),
            _ => {
                tracing::trace!(pos, index, end, "rejected external token");
                None
            }
        }
    }

    /// Best builtin match at `pos`, restricted to `valid` tokens and extras
    /// unless `valid` is `None`. Every matcher tried raises `examined`.
    fn match_builtin(
        &self,
        pos: u32,
        valid: Option<&SymbolSet>,
        examined: &mut u32,
    ) -> Option<(Symbol, u32)> {
        let input = self.source.slice(pos, self.source.len());
        let mut best: Option<(usize, bool, i32, Symbol)> = None;
        for &symbol in self.language.builtin_tokens() {
            if let Some(valid) = valid {
                if !valid.contains(symbol) && !self.language.is_extra(symbol) {
                    continue;
                }
            }
            let Some((matcher, precedence)) = self.language.matcher(symbol) else {
                continue;
            };
            let scan = matcher.scan(input);
            #[allow(clippy::cast_possible_truncation, reason = "bounded by the source length")]
            let reach = pos + scan.examined as u32;
            *examined = (*examined).max(reach);
            let Some(len) = scan.len else {
                continue;
            };
            let candidate = (len, matcher.is_literal(), precedence);
            if best.map_or(true, |(l, lit, prec, _)| candidate > (l, lit, prec)) {
                best = Some((len, candidate.1, precedence, symbol));
            }
        }
        let (len, _, _, symbol) = best?;
        #[allow(clippy::cast_possible_truncation, reason = "bounded by the source length")]
        let len = len as u32;
        Some((symbol, len))
    }
}

#[cfg(test)]
mod tests;
