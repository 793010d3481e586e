//! Builtin token matchers.
//!
//! Each non-external terminal compiles to a [`TokenMatcher`] when a
//! [`Language`](crate::Language) is loaded. Matchers are anchored at the
//! start of the input slice. Besides the match length, a scan reports how
//! many bytes the matcher had to read before it could decide, whether or not
//! it matched: the lexer records the furthest such read as the token's
//! lookahead, which is what edits are checked against. Choosing between
//! candidates (longest match, literal over pattern, precedence) is the
//! lexer's job.
//!
//! Patterns are validated with `regex` and run as anchored dense DFAs from
//! `regex-automata`, stepped one byte at a time so the point where the
//! automaton dies is observable.

use regex::bytes::Regex;
use regex_automata::dfa::{dense, Automaton, StartKind};
use regex_automata::util::primitives::StateID;
use regex_automata::{Anchored, Input};

use crate::error::GrammarTableError;
use crate::table::TokenPattern;

#[derive(Clone, Debug)]
pub enum TokenMatcher {
    Literal(Box<[u8]>),
    Pattern(dense::DFA<Vec<u32>>),
}

/// Result of running one matcher at one position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TokenScan {
    /// Length of the match; never `Some(0)`.
    pub len: Option<usize>,
    /// Bytes the matcher read, counting the one that ended the match or
    /// ruled it out.
    pub examined: usize,
}

impl TokenMatcher {
    /// Compile a token pattern. `name` is only used for error messages.
    pub fn compile(name: &str, pattern: &TokenPattern) -> Result<Self, GrammarTableError> {
        match pattern {
            TokenPattern::Literal(text) if text.is_empty() => {
                Err(GrammarTableError::EmptyToken(name.to_owned()))
            }
            TokenPattern::Literal(text) => Ok(TokenMatcher::Literal(text.as_bytes().into())),
            TokenPattern::Regex(source) => {
                let regex = Regex::new(&format!("^(?:{source})")).map_err(|source| {
                    GrammarTableError::InvalidPattern {
                        symbol: name.to_owned(),
                        source,
                    }
                })?;
                if regex.is_match(b"") {
                    return Err(GrammarTableError::EmptyToken(name.to_owned()));
                }
                let dfa = dense::Builder::new()
                    .configure(dense::DFA::config().start_kind(StartKind::Anchored))
                    .build(source)
                    .map_err(|source| GrammarTableError::UnsupportedPattern {
                        symbol: name.to_owned(),
                        source,
                    })?;
                Ok(TokenMatcher::Pattern(dfa))
            }
        }
    }

    /// Run the matcher at the start of `input`.
    pub fn scan(&self, input: &[u8]) -> TokenScan {
        match self {
            TokenMatcher::Literal(bytes) => {
                let common = bytes
                    .iter()
                    .zip(input)
                    .take_while(|(expected, actual)| expected == actual)
                    .count();
                if common == bytes.len() {
                    TokenScan {
                        len: Some(common),
                        examined: common,
                    }
                } else {
                    TokenScan {
                        len: None,
                        examined: (common + 1).min(input.len()),
                    }
                }
            }
            TokenMatcher::Pattern(dfa) => scan_dfa(dfa, input),
        }
    }

    /// Length of the match at the start of `input`. Empty matches are
    /// reported as no match.
    pub fn match_len(&self, input: &[u8]) -> Option<usize> {
        self.scan(input).len
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, TokenMatcher::Literal(_))
    }
}

/// Leftmost-first anchored search. Match states trail the input by one
/// byte, so entering one after byte `i` means `input[..i]` matched.
fn scan_dfa(dfa: &dense::DFA<Vec<u32>>, input: &[u8]) -> TokenScan {
    let Ok(mut state) = dfa.start_state_forward(&Input::new(input).anchored(Anchored::Yes)) else {
        return TokenScan {
            len: None,
            examined: input.len(),
        };
    };
    let mut last_match = None;
    for (i, &byte) in input.iter().enumerate() {
        let previous = state;
        state = dfa.next_state(state, byte);
        if !dfa.is_special_state(state) {
            continue;
        }
        if dfa.is_match_state(state) {
            last_match = Some(i);
        } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
            // After a match whose state leads nowhere, the dying byte was
            // never in question.
            let examined = if dfa.is_match_state(previous) && leads_nowhere(dfa, previous) {
                i
            } else {
                i + 1
            };
            return TokenScan {
                len: last_match.filter(|&len| len > 0),
                examined,
            };
        }
    }
    if dfa.is_match_state(dfa.next_eoi_state(state)) {
        last_match = Some(input.len());
    }
    TokenScan {
        len: last_match.filter(|&len| len > 0),
        examined: input.len(),
    }
}

fn leads_nowhere(dfa: &dense::DFA<Vec<u32>>, state: StateID) -> bool {
    (0..=u8::MAX).all(|byte| dfa.is_dead_state(dfa.next_state(state, byte)))
}
