use std::fmt::Write;

use super::traverse::{TokenVisitor, walk};
use super::{Token, TokenId, TokenTree, TokenType};

/// Types whose text is noise in a dump: containers and whitespace.
const STRUCTURAL: &[TokenType] = &[
    TokenType::BlockQuote,
    TokenType::Content,
    TokenType::Paragraph,
    TokenType::LineEnding,
    TokenType::ListItemIndent,
    TokenType::ListOrdered,
    TokenType::ListUnordered,
    TokenType::ListItemPrefix,
    TokenType::LinePrefix,
    TokenType::LineEndingBlank,
];

struct Dump {
    out: String,
}

impl TokenVisitor<usize> for Dump {
    fn visit(&mut self, _id: TokenId, token: &Token, indent: &usize) {
        let _ = write!(
            self.out,
            "{:indent$}{}: {} {}",
            "",
            token.start_line,
            token.kind,
            token.start_column,
            indent = *indent
        );
        if !STRUCTURAL.contains(&token.kind) {
            let _ = write!(self.out, " \"{}\"", token.text.replace('\n', "\\n"));
        }
        self.out.push('\n');
    }

    fn next_state(&self, indent: &usize) -> usize {
        indent + 2
    }
}

/// Renders each subtree rooted at `roots`, one token per line:
///
/// ```text
/// 1: listUnordered 1
///   1: listItemPrefix 1
///   1: content 3
///     1: paragraph 3
///       1: data 3 "list item"
/// ```
pub fn dump_tree(tree: &TokenTree, roots: &[TokenId]) -> String {
    let mut dump = Dump { out: String::new() };
    for &root in roots {
        walk(tree, root, &mut dump, 0);
    }
    dump.out
}
