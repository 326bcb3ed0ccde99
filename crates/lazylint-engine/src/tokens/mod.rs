//! # Token Tree
//!
//! The lexical token tree the rule runs over. Tokens are stored in an arena
//! (`TokenTree`) and refer to their children by `TokenId`, so a producer can
//! describe any shape it likes, including malformed ones where a token is
//! reachable twice. Consumers never assume the tree is acyclic: the traversal
//! in [`traverse`] guards against re-visits.
//!
//! ## Modules
//!
//! - **`traverse`**: Depth-first walker with injectable visit/descend/stop strategies
//! - **`select`**: Type-filtered extraction and list/content discovery
//! - **`dump`**: Indented, human-readable rendering of a subtree for debugging

pub mod dump;
pub mod select;
pub mod traverse;

use std::fmt;
use std::ops::Index;

use serde::{Serialize, Serializer};

/// Index of a token inside its `TokenTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TokenId(usize);

impl TokenId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The type tag of a token.
///
/// Named variants cover the types this crate's producer emits and the rule
/// compares against. Anything else a producer hands us lands in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenType {
    ListOrdered,
    ListUnordered,
    ListItemPrefix,
    ListItemIndent,
    BlockQuote,
    Content,
    Paragraph,
    LineEnding,
    LineEndingBlank,
    LinePrefix,
    LineSuffix,
    HardBreak,
    Data,
    Emphasis,
    Strong,
    Strikethrough,
    Link,
    Image,
    Autolink,
    CodeText,
    HtmlText,
    MathText,
    FootnoteReference,
    TaskListCheck,
    AtxHeading,
    SetextHeading,
    CodeFenced,
    CodeIndented,
    HtmlFlow,
    ThematicBreak,
    Table,
    FootnoteDefinition,
    Other(String),
}

impl TokenType {
    pub fn as_str(&self) -> &str {
        match self {
            TokenType::ListOrdered => "listOrdered",
            TokenType::ListUnordered => "listUnordered",
            TokenType::ListItemPrefix => "listItemPrefix",
            TokenType::ListItemIndent => "listItemIndent",
            TokenType::BlockQuote => "blockQuote",
            TokenType::Content => "content",
            TokenType::Paragraph => "paragraph",
            TokenType::LineEnding => "lineEnding",
            TokenType::LineEndingBlank => "lineEndingBlank",
            TokenType::LinePrefix => "linePrefix",
            TokenType::LineSuffix => "lineSuffix",
            TokenType::HardBreak => "hardBreak",
            TokenType::Data => "data",
            TokenType::Emphasis => "emphasis",
            TokenType::Strong => "strong",
            TokenType::Strikethrough => "strikethrough",
            TokenType::Link => "link",
            TokenType::Image => "image",
            TokenType::Autolink => "autolink",
            TokenType::CodeText => "codeText",
            TokenType::HtmlText => "htmlText",
            TokenType::MathText => "mathText",
            TokenType::FootnoteReference => "footnoteReference",
            TokenType::TaskListCheck => "taskListCheck",
            TokenType::AtxHeading => "atxHeading",
            TokenType::SetextHeading => "setextHeading",
            TokenType::CodeFenced => "codeFenced",
            TokenType::CodeIndented => "codeIndented",
            TokenType::HtmlFlow => "htmlFlow",
            TokenType::ThematicBreak => "thematicBreak",
            TokenType::Table => "table",
            TokenType::FootnoteDefinition => "footnoteDefinition",
            TokenType::Other(name) => name,
        }
    }

    /// Parses a producer's type tag. Unknown tags are kept verbatim.
    pub fn from_name(name: &str) -> Self {
        match name {
            "listOrdered" => TokenType::ListOrdered,
            "listUnordered" => TokenType::ListUnordered,
            "listItemPrefix" => TokenType::ListItemPrefix,
            "listItemIndent" => TokenType::ListItemIndent,
            "blockQuote" => TokenType::BlockQuote,
            "content" => TokenType::Content,
            "paragraph" => TokenType::Paragraph,
            "lineEnding" => TokenType::LineEnding,
            "lineEndingBlank" => TokenType::LineEndingBlank,
            "linePrefix" => TokenType::LinePrefix,
            "lineSuffix" => TokenType::LineSuffix,
            "hardBreak" => TokenType::HardBreak,
            "data" => TokenType::Data,
            "emphasis" => TokenType::Emphasis,
            "strong" => TokenType::Strong,
            "strikethrough" => TokenType::Strikethrough,
            "link" => TokenType::Link,
            "image" => TokenType::Image,
            "autolink" => TokenType::Autolink,
            "codeText" => TokenType::CodeText,
            "htmlText" => TokenType::HtmlText,
            "mathText" => TokenType::MathText,
            "footnoteReference" => TokenType::FootnoteReference,
            "taskListCheck" => TokenType::TaskListCheck,
            "atxHeading" => TokenType::AtxHeading,
            "setextHeading" => TokenType::SetextHeading,
            "codeFenced" => TokenType::CodeFenced,
            "codeIndented" => TokenType::CodeIndented,
            "htmlFlow" => TokenType::HtmlFlow,
            "thematicBreak" => TokenType::ThematicBreak,
            "table" => TokenType::Table,
            "footnoteDefinition" => TokenType::FootnoteDefinition,
            other => TokenType::Other(other.to_string()),
        }
    }

    /// True for `listOrdered` and `listUnordered`.
    pub fn is_list(&self) -> bool {
        matches!(self, TokenType::ListOrdered | TokenType::ListUnordered)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TokenType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single lexical token.
///
/// Lines and columns are 1-based. `end_column` is exclusive, so a one-line
/// token covers `start_column..end_column`. Columns count characters, not
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenType,
    pub text: String,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub children: Vec<TokenId>,
}

impl Token {
    /// Builds a childless token starting at `start_line:start_column`, with
    /// its end position derived from `text`.
    pub fn new(
        kind: TokenType,
        text: impl Into<String>,
        start_line: usize,
        start_column: usize,
    ) -> Self {
        let text = text.into();
        let (end_line, end_column) = match text.rfind('\n') {
            Some(last_newline) => (
                start_line + text.matches('\n').count(),
                text[last_newline + 1..].chars().count() + 1,
            ),
            None => (start_line, start_column + text.chars().count()),
        };
        Self {
            kind,
            text,
            start_line,
            start_column,
            end_line,
            end_column,
            children: Vec::new(),
        }
    }

    /// Character count of the token's first line.
    pub fn first_line_len(&self) -> usize {
        self.text
            .split('\n')
            .next()
            .map(|line| line.trim_end_matches('\r').chars().count())
            .unwrap_or(0)
    }
}

/// Arena owning every token of a document plus the ordered top-level roots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenTree {
    tokens: Vec<Token>,
    roots: Vec<TokenId>,
}

impl TokenTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a token without attaching it anywhere.
    pub fn push(&mut self, token: Token) -> TokenId {
        let id = TokenId(self.tokens.len());
        self.tokens.push(token);
        id
    }

    /// Appends `id` to the document's top-level tokens.
    pub fn push_root(&mut self, id: TokenId) {
        self.roots.push(id);
    }

    /// Appends `child` to `parent`'s children. Unknown parents are ignored.
    pub fn append_child(&mut self, parent: TokenId, child: TokenId) {
        if let Some(token) = self.tokens.get_mut(parent.0) {
            token.children.push(child);
        }
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.tokens.get_mut(id.0)
    }

    pub fn roots(&self) -> &[TokenId] {
        &self.roots
    }

    /// Children of `id`, or an empty slice for unknown ids.
    pub fn children(&self, id: TokenId) -> &[TokenId] {
        self.get(id).map_or(&[], |token| token.children.as_slice())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Index<TokenId> for TokenTree {
    type Output = Token;

    fn index(&self, id: TokenId) -> &Token {
        &self.tokens[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_end_position_single_line() {
        let token = Token::new(TokenType::Data, "lazy", 2, 5);
        assert_eq!(token.end_line, 2);
        assert_eq!(token.end_column, 9);
    }

    #[test]
    fn token_end_position_multi_line() {
        let token = Token::new(TokenType::Strong, "**a\nbc**", 3, 7);
        assert_eq!(token.end_line, 4);
        assert_eq!(token.end_column, 5);
        assert_eq!(token.first_line_len(), 3);
    }

    #[test]
    fn token_columns_count_characters() {
        let token = Token::new(TokenType::Data, "héllo", 1, 1);
        assert_eq!(token.end_column, 6);
    }

    #[test]
    fn type_names_round_trip_through_from_name() {
        for kind in [
            TokenType::ListOrdered,
            TokenType::Content,
            TokenType::LinePrefix,
            TokenType::CodeText,
        ] {
            assert_eq!(TokenType::from_name(kind.as_str()), kind);
        }
        assert_eq!(
            TokenType::from_name("gfmFootnoteCall"),
            TokenType::Other("gfmFootnoteCall".to_string())
        );
    }

    #[test]
    fn append_child_to_unknown_parent_is_ignored() {
        let mut tree = TokenTree::new();
        let child = tree.push(Token::new(TokenType::Data, "x", 1, 1));
        tree.append_child(TokenId(42), child);
        assert!(tree.children(TokenId(42)).is_empty());
        assert_eq!(tree.len(), 1);
    }
}
