//! # Lazy Continuation Line Rule
//!
//! Flags paragraph lines inside list items whose indentation differs from
//! the column the paragraph started at, and proposes an edit for each.
//!
//! ## Modules
//!
//! - **`continuation`**: Per-paragraph line scan, including callout handling
//! - **`fix`**: Fix records and the edit that realigns one line
//!
//! The rule reads a [`TokenTree`] and reports through a callback. It never
//! touches document text; see [`crate::fixes::apply_fixes`] for that.

pub mod continuation;
pub mod fix;

use serde::{Deserialize, Serialize};

use crate::parsing::parse_tokens;
use crate::tokens::TokenTree;
use crate::tokens::dump::dump_tree;
use crate::tokens::select::{content_tokens, list_tokens};
use continuation::lazy_lines;
use fix::{FixInfo, build_fix};

/// Options for [`LazyContinuationLines`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Accept `!!!` callout bodies at their own, deeper indentation.
    #[serde(default)]
    pub admonitions: bool,
}

/// What a rule gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleParams<'a> {
    pub tokens: &'a TokenTree,
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub line_number: usize,
    pub detail: String,
    /// Start column and length, in characters, of the offending token's
    /// first line.
    pub range: (usize, usize),
    pub fix_info: FixInfo,
}

/// A check a host can register and run.
pub trait Rule {
    fn names(&self) -> &'static [&'static str];
    fn description(&self) -> &'static str;
    fn tags(&self) -> &'static [&'static str];

    /// Reports each problem in `params` through `on_error`, in document order.
    fn check(&self, params: &RuleParams<'_>, on_error: &mut dyn FnMut(Violation));
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LazyContinuationLines {
    pub config: RuleConfig,
}

impl LazyContinuationLines {
    pub const NAME: &'static str = "lazy-continuation-lines";

    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }
}

impl Rule for LazyContinuationLines {
    fn names(&self) -> &'static [&'static str] {
        &[Self::NAME]
    }

    fn description(&self) -> &'static str {
        "Lazy continuation lines are not allowed"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["indentation", "lists"]
    }

    fn check(&self, params: &RuleParams<'_>, on_error: &mut dyn FnMut(Violation)) {
        let tree = params.tokens;
        let tracing = log::log_enabled!(log::Level::Trace);
        for list in list_tokens(tree) {
            if tracing {
                log::trace!("list tokens:\n{}", dump_tree(tree, &[list]));
            }
            for content_id in content_tokens(tree, list) {
                let Some(content) = tree.get(content_id) else {
                    continue;
                };
                if tracing {
                    log::trace!("content tokens:\n{}", dump_tree(tree, &[content_id]));
                }

                let expected = content.start_column;
                for token in lazy_lines(tree, content, self.config.admonitions) {
                    let violation = Violation {
                        line_number: token.start_line,
                        detail: format!("Lazy continuation line: '{}'", token.text),
                        range: (token.start_column, token.first_line_len()),
                        fix_info: build_fix(token.start_line, token.start_column, expected),
                    };
                    log::debug!(
                        "{}:{} expected column {}: {}",
                        violation.line_number,
                        token.start_column,
                        expected,
                        violation.detail
                    );
                    on_error(violation);
                }
            }
        }
    }
}

/// Parses `text` and runs [`LazyContinuationLines`] over it.
pub fn lint(text: &str, config: &RuleConfig) -> Vec<Violation> {
    let tokens = parse_tokens(text);
    let rule = LazyContinuationLines::new(*config);
    let mut violations = Vec::new();
    rule.check(&RuleParams { tokens: &tokens }, &mut |v| violations.push(v));
    violations
}
