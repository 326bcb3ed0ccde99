//! Per-paragraph scan for lazy continuation lines.
//!
//! A content token's paragraph is walked one inline token at a time. Only the
//! token that opens a physical line carries that line's indentation, so the
//! scan alternates between `Processing` (next token opens a line, check it)
//! and `Waiting` (rest of the line, don't). Every line-opening token must
//! start at the content token's own column.
//!
//! With admonitions enabled, a token whose text starts with `!!!` opens a
//! callout. Lines inside a callout are expected four columns right of the
//! marker; while a token sits at or past that column it is accepted regardless
//! of the paragraph's column. The first token to fall short of it closes the
//! callout (and, if it opens a line, is checked against the paragraph's
//! column like any other).

use crate::tokens::{Token, TokenTree, TokenType};

/// Marker opening a callout block.
pub const CALLOUT_MARKER: &str = "!!!";

/// Indentation of callout content relative to its marker.
pub const CALLOUT_INDENT: usize = 4;

/// Inline types that describe indentation rather than content.
const SKIPPED: &[TokenType] = &[TokenType::LinePrefix, TokenType::ListItemIndent];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// The next token opens a physical line.
    #[default]
    Processing,
    /// Inside a line, already checked.
    Waiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Callout {
    pub active: bool,
    /// Column callout content is expected at. Zero when inactive.
    pub column: usize,
}

/// State threaded through one paragraph's inline tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineState {
    pub phase: Phase,
    pub callout: Callout,
}

/// Rules for one content token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationCheck {
    /// Column every line of the paragraph should start at.
    pub expected_column: usize,
    pub admonitions: bool,
}

impl ContinuationCheck {
    pub fn new(expected_column: usize, admonitions: bool) -> Self {
        Self {
            expected_column,
            admonitions,
        }
    }

    fn continues_callout(&self, state: LineState, token: &Token) -> bool {
        self.admonitions && state.callout.active && token.start_column >= state.callout.column
    }

    /// Whether `token` sits at the wrong column, given the state before it.
    pub fn is_lazy(&self, state: LineState, token: &Token) -> bool {
        !self.continues_callout(state, token) && token.start_column != self.expected_column
    }

    /// Consumes one inline token. Returns the state for the next token and
    /// whether this token opens a lazy line.
    pub fn step(&self, state: LineState, token: &Token) -> (LineState, bool) {
        let lazy = state.phase == Phase::Processing && self.is_lazy(state, token);

        let phase = if token.kind == TokenType::LineEnding {
            Phase::Processing
        } else {
            Phase::Waiting
        };

        let callout = if !self.admonitions {
            state.callout
        } else if token.text.starts_with(CALLOUT_MARKER) {
            Callout {
                active: true,
                column: token.start_column + CALLOUT_INDENT,
            }
        } else if self.continues_callout(state, token) {
            state.callout
        } else {
            Callout::default()
        };

        (LineState { phase, callout }, lazy)
    }
}

/// The paragraph's inline tokens that matter for indentation, in order.
///
/// Empty when the content token has no children or its first child is not a
/// paragraph.
pub fn inline_tokens<'a>(tree: &'a TokenTree, content: &Token) -> Vec<&'a Token> {
    let Some(paragraph) = content
        .children
        .first()
        .and_then(|&id| tree.get(id))
        .filter(|token| token.kind == TokenType::Paragraph)
    else {
        return Vec::new();
    };

    paragraph
        .children
        .iter()
        .filter_map(|&id| tree.get(id))
        .filter(|token| !SKIPPED.contains(&token.kind))
        .collect()
}

/// Inline tokens of `content` that open a lazy continuation line.
pub fn lazy_lines<'a>(tree: &'a TokenTree, content: &Token, admonitions: bool) -> Vec<&'a Token> {
    let check = ContinuationCheck::new(content.start_column, admonitions);
    inline_tokens(tree, content)
        .into_iter()
        .scan(LineState::default(), |state, token| {
            let (next, lazy) = check.step(*state, token);
            *state = next;
            Some(lazy.then_some(token))
        })
        .flatten()
        .collect()
}
