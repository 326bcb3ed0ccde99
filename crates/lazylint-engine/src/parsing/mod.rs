//! # Markdown Tokenization
//!
//! Turns Markdown text into the [`TokenTree`] the rule consumes, using
//! pulldown-cmark for structure and an xi-rope backed [`LineIndex`] for
//! positions.
//!
//! ## Tree Shape
//!
//! - Lists (`listOrdered`/`listUnordered`) hold their items flattened: each
//!   item contributes a `listItemPrefix` followed by its blocks
//! - Every paragraph is a `content` token wrapping a single `paragraph`;
//!   tight list items, which pulldown-cmark reports without paragraph events,
//!   get one synthesized around their inline run
//! - Paragraph children are the top-level inline constructs in source order.
//!   Adjacent text merges into one `data` token, each break yields a
//!   `lineEnding`, and indentation before a continuation line's first token
//!   yields a `linePrefix`. Nested inline structure is not expanded
//! - Headings, code, HTML blocks and tables are leaves
//!
//! Tokenization never fails.

pub mod position;

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};

use crate::tokens::{Token, TokenId, TokenTree, TokenType};
pub use position::{LineIndex, Position};

/// Tokenizes `text`.
pub fn parse_tokens(text: &str) -> TokenTree {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_MATH);

    let mut builder = TreeBuilder::new(text);
    for (event, range) in Parser::new_ext(text, options).into_offset_iter() {
        builder.handle(event, range);
    }
    builder.finish()
}

enum Frame {
    /// List, block quote or footnote definition: blocks attach to it.
    Container(TokenId),
    /// List item. Its blocks attach to the enclosing list.
    Item,
    Paragraph(ParagraphFrame),
    /// Block whose contents are not tokenized. Counts nested starts so the
    /// matching end can be found.
    Opaque { depth: usize },
}

struct ParagraphFrame {
    content: TokenId,
    paragraph: TokenId,
    /// Synthesized for a tight list item; closes at the next block event.
    implicit: bool,
    /// Source covered by inline tokens so far.
    span: Option<Range<usize>>,
    /// Nesting inside emphasis, links and the like. Only depth 0 is tokenized.
    inline_depth: usize,
    /// Start of the current physical line, until its first token is seen.
    line_start: Option<usize>,
    /// Trailing `data` token that adjacent text can extend.
    open_data: Option<(TokenId, Range<usize>)>,
}

impl ParagraphFrame {
    fn cover(&mut self, range: &Range<usize>) {
        self.span = Some(match self.span.take() {
            Some(span) => span.start.min(range.start)..span.end.max(range.end),
            None => range.clone(),
        });
    }
}

struct TreeBuilder<'s> {
    source: &'s str,
    index: LineIndex,
    tree: TokenTree,
    stack: Vec<Frame>,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            index: LineIndex::new(source),
            tree: TokenTree::new(),
            stack: Vec::new(),
        }
    }

    fn finish(mut self) -> TokenTree {
        self.close_implicit();
        self.tree
    }

    fn handle(&mut self, event: Event<'_>, range: Range<usize>) {
        if let Some(Frame::Opaque { depth }) = self.stack.last_mut() {
            match event {
                Event::Start(_) => *depth += 1,
                Event::End(_) if *depth == 0 => {
                    self.stack.pop();
                }
                Event::End(_) => *depth -= 1,
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start(tag, range),
            Event::End(tag) => self.end(tag),
            Event::Text(_) => self.text(range),
            Event::Code(_) => self.inline(TokenType::CodeText, range, false),
            Event::InlineMath(_) | Event::DisplayMath(_) => {
                self.inline(TokenType::MathText, range, false)
            }
            Event::Html(_) | Event::InlineHtml(_) => self.inline(TokenType::HtmlText, range, false),
            Event::FootnoteReference(_) => self.inline(TokenType::FootnoteReference, range, false),
            Event::TaskListMarker(_) => self.inline(TokenType::TaskListCheck, range, false),
            Event::SoftBreak => self.line_break(range, TokenType::LineSuffix),
            Event::HardBreak => self.line_break(range, TokenType::HardBreak),
            Event::Rule => {
                self.close_implicit();
                self.block_token(TokenType::ThematicBreak, range);
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>, range: Range<usize>) {
        match tag {
            Tag::Paragraph => {
                self.close_implicit();
                let frame = self.new_paragraph(range, false);
                self.stack.push(Frame::Paragraph(frame));
            }
            Tag::List(first_number) => {
                let kind = if first_number.is_some() {
                    TokenType::ListOrdered
                } else {
                    TokenType::ListUnordered
                };
                self.open_container(kind, range);
            }
            Tag::Item => {
                self.close_implicit();
                self.list_item_prefix(range);
                self.stack.push(Frame::Item);
            }
            Tag::BlockQuote(_) => self.open_container(TokenType::BlockQuote, range),
            Tag::FootnoteDefinition(_) => {
                self.open_container(TokenType::FootnoteDefinition, range)
            }
            Tag::Heading { .. } => {
                let atx = self
                    .slice(&range)
                    .trim_start_matches([' ', '\t'])
                    .starts_with('#');
                let kind = if atx {
                    TokenType::AtxHeading
                } else {
                    TokenType::SetextHeading
                };
                self.open_opaque(Some(kind), range);
            }
            Tag::CodeBlock(CodeBlockKind::Fenced(_)) => {
                self.open_opaque(Some(TokenType::CodeFenced), range)
            }
            Tag::CodeBlock(CodeBlockKind::Indented) => {
                self.open_opaque(Some(TokenType::CodeIndented), range)
            }
            Tag::HtmlBlock => self.open_opaque(Some(TokenType::HtmlFlow), range),
            Tag::Table(_) => self.open_opaque(Some(TokenType::Table), range),
            Tag::Emphasis => self.inline(TokenType::Emphasis, range, true),
            Tag::Strong => self.inline(TokenType::Strong, range, true),
            Tag::Strikethrough => self.inline(TokenType::Strikethrough, range, true),
            Tag::Link { link_type, .. } => {
                let kind = match link_type {
                    LinkType::Autolink | LinkType::Email => TokenType::Autolink,
                    _ => TokenType::Link,
                };
                self.inline(kind, range, true)
            }
            Tag::Image { .. } => self.inline(TokenType::Image, range, true),
            // Table internals and extensions not enabled above
            _ => self.open_opaque(None, range),
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.close_paragraph(),
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image => {
                if let Some(Frame::Paragraph(frame)) = self.stack.last_mut() {
                    frame.inline_depth = frame.inline_depth.saturating_sub(1);
                }
            }
            // Items, lists, block quotes, footnote definitions
            _ => {
                self.close_implicit();
                self.stack.pop();
            }
        }
    }

    fn slice(&self, range: &Range<usize>) -> &'s str {
        self.source.get(range.clone()).unwrap_or_default()
    }

    fn token(&mut self, kind: TokenType, range: Range<usize>) -> TokenId {
        let token = self.make_token(kind, &range);
        self.tree.push(token)
    }

    fn make_token(&self, kind: TokenType, range: &Range<usize>) -> Token {
        let start = self.index.position(range.start);
        let end = self.index.position(range.end);
        Token {
            kind,
            text: self.slice(range).to_string(),
            start_line: start.line,
            start_column: start.column,
            end_line: end.line,
            end_column: end.column,
            children: Vec::new(),
        }
    }

    /// Moves an existing token to cover `range`, keeping its type and children.
    fn reshape(&mut self, id: TokenId, range: &Range<usize>) {
        let Some(kind) = self.tree.get(id).map(|token| token.kind.clone()) else {
            return;
        };
        let Token {
            text,
            start_line,
            start_column,
            end_line,
            end_column,
            ..
        } = self.make_token(kind, range);
        if let Some(token) = self.tree.get_mut(id) {
            token.text = text;
            token.start_line = start_line;
            token.start_column = start_column;
            token.end_line = end_line;
            token.end_column = end_column;
        }
    }

    /// The token new blocks attach to; `None` means the document root.
    fn block_parent(&self) -> Option<TokenId> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Container(id) => Some(*id),
            _ => None,
        })
    }

    fn attach_block(&mut self, id: TokenId) {
        match self.block_parent() {
            Some(parent) => self.tree.append_child(parent, id),
            None => self.tree.push_root(id),
        }
    }

    fn block_token(&mut self, kind: TokenType, range: Range<usize>) -> TokenId {
        let id = self.token(kind, range);
        self.attach_block(id);
        id
    }

    fn open_container(&mut self, kind: TokenType, range: Range<usize>) {
        self.close_implicit();
        let id = self.block_token(kind, range);
        self.stack.push(Frame::Container(id));
    }

    fn open_opaque(&mut self, kind: Option<TokenType>, range: Range<usize>) {
        self.close_implicit();
        if let Some(kind) = kind {
            self.block_token(kind, range);
        }
        self.stack.push(Frame::Opaque { depth: 0 });
    }

    /// Marker plus the whitespace after it, e.g. `"- "` or `"1. "`.
    fn list_item_prefix(&mut self, range: Range<usize>) {
        let item = self.slice(&range);
        let marker_start = range.start + (item.len() - item.trim_start_matches([' ', '\t']).len());
        let rest = self.slice(&(marker_start..range.end));
        let marker_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let after = &rest[marker_len..];
        let padding = after.len() - after.trim_start_matches([' ', '\t']).len();
        self.block_token(
            TokenType::ListItemPrefix,
            marker_start..marker_start + marker_len + padding,
        );
    }

    fn new_paragraph(&mut self, range: Range<usize>, implicit: bool) -> ParagraphFrame {
        let content = self.block_token(TokenType::Content, range.clone());
        let paragraph = self.token(TokenType::Paragraph, range);
        self.tree.append_child(content, paragraph);
        ParagraphFrame {
            content,
            paragraph,
            implicit,
            span: None,
            inline_depth: 0,
            line_start: None,
            open_data: None,
        }
    }

    /// Pops the open paragraph, or starts an implicit one at `range`.
    fn take_paragraph(&mut self, range: &Range<usize>) -> ParagraphFrame {
        match self.stack.pop() {
            Some(Frame::Paragraph(frame)) => frame,
            other => {
                self.stack.extend(other);
                self.new_paragraph(range.clone(), true)
            }
        }
    }

    fn close_paragraph(&mut self) {
        if !matches!(self.stack.last(), Some(Frame::Paragraph(_))) {
            return;
        }
        if let Some(Frame::Paragraph(frame)) = self.stack.pop()
            && let Some(span) = frame.span
        {
            self.reshape(frame.content, &span);
            self.reshape(frame.paragraph, &span);
        }
    }

    fn close_implicit(&mut self) {
        if let Some(Frame::Paragraph(frame)) = self.stack.last()
            && frame.implicit
        {
            self.close_paragraph();
        }
    }

    /// Appends an inline token at depth 0, emitting the line's indentation
    /// first if this token opens a continuation line.
    fn push_inline(&mut self, frame: &mut ParagraphFrame, kind: TokenType, range: Range<usize>) {
        if kind != TokenType::LineEnding
            && let Some(line_start) = frame.line_start.take()
        {
            self.line_prefix(frame, line_start, range.start);
        }
        let id = self.token(kind, range.clone());
        self.tree.append_child(frame.paragraph, id);
        frame.cover(&range);
        frame.open_data = None;
    }

    /// Whitespace between a continuation line's start, past any `>` markers,
    /// and its first token.
    fn line_prefix(&mut self, frame: &ParagraphFrame, line_start: usize, token_start: usize) {
        let Some(gap) = self.source.get(line_start..token_start) else {
            return;
        };
        let indent_start = match gap.rfind('>') {
            Some(marker) if gap[marker + 1..].starts_with(' ') => line_start + marker + 2,
            Some(marker) => line_start + marker + 1,
            None => line_start,
        };
        let indent = self.slice(&(indent_start..token_start));
        if !indent.is_empty() && indent.chars().all(|c| c == ' ' || c == '\t') {
            let id = self.token(TokenType::LinePrefix, indent_start..token_start);
            self.tree.append_child(frame.paragraph, id);
        }
    }

    fn inline(&mut self, kind: TokenType, range: Range<usize>, opens: bool) {
        let mut frame = self.take_paragraph(&range);
        if frame.inline_depth == 0 {
            self.push_inline(&mut frame, kind, range);
        }
        if opens {
            frame.inline_depth += 1;
        }
        self.stack.push(Frame::Paragraph(frame));
    }

    fn text(&mut self, range: Range<usize>) {
        let mut frame = self.take_paragraph(&range);
        if frame.inline_depth == 0 {
            let floor = frame.span.as_ref().map_or(0, |span| span.end);
            let range = self.escape_start(&range, floor)..range.end;
            match frame.open_data.take() {
                Some((id, data)) if data.end == range.start => {
                    let merged = data.start..range.end;
                    self.reshape(id, &merged);
                    frame.cover(&merged);
                    frame.open_data = Some((id, merged));
                }
                _ => {
                    self.push_inline(&mut frame, TokenType::Data, range.clone());
                    let id = last_child(&self.tree, frame.paragraph);
                    frame.open_data = id.map(|id| (id, range));
                }
            }
        }
        self.stack.push(Frame::Paragraph(frame));
    }

    /// Start of a text run, moved back onto the backslash when the run's
    /// first character is escaped. Never moves before `floor`.
    fn escape_start(&self, range: &Range<usize>, floor: usize) -> usize {
        let before = &self.source.as_bytes()[floor.min(range.start)..range.start];
        let backslashes = before.iter().rev().take_while(|&&b| b == b'\\').count();
        if backslashes % 2 == 1 {
            range.start - 1
        } else {
            range.start
        }
    }

    /// A soft or hard break: whatever precedes the newline becomes a
    /// `prefix_kind` token, the newline itself a `lineEnding`.
    fn line_break(&mut self, range: Range<usize>, prefix_kind: TokenType) {
        let mut frame = self.take_paragraph(&range);
        if frame.inline_depth == 0 {
            let text = self.slice(&range);
            let (ending_start, next_line) = match text.find('\n') {
                Some(newline) => {
                    let cr = usize::from(text[..newline].ends_with('\r'));
                    (range.start + newline - cr, range.start + newline + 1)
                }
                None => (range.start, range.end),
            };
            if ending_start > range.start {
                self.push_inline(&mut frame, prefix_kind, range.start..ending_start);
            }
            self.push_inline(&mut frame, TokenType::LineEnding, ending_start..next_line);
            frame.line_start = Some(next_line);
        }
        self.stack.push(Frame::Paragraph(frame));
    }
}

fn last_child(tree: &TokenTree, paragraph: TokenId) -> Option<TokenId> {
    tree.children(paragraph).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::dump::dump_tree;
    use pretty_assertions::assert_eq;

    fn kinds(tree: &TokenTree, ids: &[TokenId]) -> Vec<String> {
        ids.iter().map(|&id| tree[id].kind.to_string()).collect()
    }

    fn paragraph_children(tree: &TokenTree, content: TokenId) -> Vec<(String, String, usize, usize)> {
        let paragraph = tree.children(content)[0];
        tree.children(paragraph)
            .iter()
            .map(|&id| {
                let t = &tree[id];
                (t.kind.to_string(), t.text.clone(), t.start_line, t.start_column)
            })
            .collect()
    }

    fn row(kind: &str, text: &str, line: usize, column: usize) -> (String, String, usize, usize) {
        (kind.to_string(), text.to_string(), line, column)
    }

    #[test]
    fn empty_document_has_no_tokens() {
        let tree = parse_tokens("");
        assert!(tree.is_empty());
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn tight_list_item_gets_synthesized_content() {
        let tree = parse_tokens("- list item\nlazy\n    lazy\n");
        assert_eq!(kinds(&tree, tree.roots()), vec!["listUnordered"]);

        let list = tree.roots()[0];
        assert_eq!(kinds(&tree, tree.children(list)), vec!["listItemPrefix", "content"]);

        let prefix = &tree[tree.children(list)[0]];
        assert_eq!(prefix.text, "- ");

        let content = tree.children(list)[1];
        assert_eq!(tree[content].start_column, 3);
        assert_eq!(
            paragraph_children(&tree, content),
            vec![
                row("data", "list item", 1, 3),
                row("lineEnding", "\n", 1, 12),
                row("data", "lazy", 2, 1),
                row("lineEnding", "\n", 2, 5),
                row("linePrefix", "    ", 3, 1),
                row("data", "lazy", 3, 5),
            ]
        );
    }

    #[test]
    fn ordered_list_content_starts_after_marker() {
        let tree = parse_tokens("1. list item\n");
        let list = tree.roots()[0];
        assert_eq!(tree[list].kind, TokenType::ListOrdered);
        let content = tree.children(list)[1];
        assert_eq!(tree[content].start_column, 4);
        assert_eq!(tree[content].text, "list item");
    }

    #[test]
    fn emphasis_is_one_token_covering_its_source() {
        let tree = parse_tokens("- list item\n**lazy** and _more_\n");
        let content = tree.children(tree.roots()[0])[1];
        assert_eq!(
            paragraph_children(&tree, content),
            vec![
                row("data", "list item", 1, 3),
                row("lineEnding", "\n", 1, 12),
                row("strong", "**lazy**", 2, 1),
                row("data", " and ", 2, 9),
                row("emphasis", "_more_", 2, 14),
            ]
        );
    }

    #[test]
    fn block_quote_inside_list_holds_the_content() {
        let tree = parse_tokens("1. > list item\nlazy\n");
        let list = tree.roots()[0];
        assert_eq!(kinds(&tree, tree.children(list)), vec!["listItemPrefix", "blockQuote"]);
        let quote = tree.children(list)[1];
        let content = tree.children(quote)[0];
        assert_eq!(tree[content].kind, TokenType::Content);
        assert_eq!(tree[content].start_column, 6);
    }

    #[test]
    fn quoted_continuation_line_prefix_skips_marker() {
        let tree = parse_tokens("> - item\n>     more\n");
        let quote = tree.roots()[0];
        let list = tree.children(quote)[0];
        let content = tree.children(list)[1];
        assert_eq!(
            paragraph_children(&tree, content),
            vec![
                row("data", "item", 1, 5),
                row("lineEnding", "\n", 1, 9),
                row("linePrefix", "    ", 2, 3),
                row("data", "more", 2, 7),
            ]
        );
    }

    #[test]
    fn nested_list_closes_the_implicit_paragraph() {
        let tree = parse_tokens("- outer\n  - inner\n- second\n");
        let list = tree.roots()[0];
        assert_eq!(
            kinds(&tree, tree.children(list)),
            vec![
                "listItemPrefix",
                "content",
                "listUnordered",
                "listItemPrefix",
                "content"
            ]
        );
        let inner = tree.children(list)[2];
        assert_eq!(kinds(&tree, tree.children(inner)), vec!["listItemPrefix", "content"]);
        assert_eq!(tree[tree.children(inner)[1]].text, "inner");
    }

    #[test]
    fn loose_list_paragraphs_are_separate_contents() {
        let tree = parse_tokens("- list item\n\n  new paragraph\n");
        let list = tree.roots()[0];
        assert_eq!(
            kinds(&tree, tree.children(list)),
            vec!["listItemPrefix", "content", "content"]
        );
        let second = &tree[tree.children(list)[2]];
        assert_eq!((second.start_line, second.start_column), (3, 3));
    }

    #[test]
    fn escaped_first_word_keeps_its_backslash() {
        let tree = parse_tokens("- \\*item\n  more\n");
        let content = tree.children(tree.roots()[0])[1];
        assert_eq!(tree[content].start_column, 3);
        assert_eq!(
            paragraph_children(&tree, content),
            vec![
                row("data", "\\*item", 1, 3),
                row("lineEnding", "\n", 1, 9),
                row("linePrefix", "  ", 2, 1),
                row("data", "more", 2, 3),
            ]
        );
    }

    #[test]
    fn escaped_line_start_keeps_its_backslash() {
        let tree = parse_tokens("- item\n  \\*x\n");
        let content = tree.children(tree.roots()[0])[1];
        assert_eq!(
            paragraph_children(&tree, content),
            vec![
                row("data", "item", 1, 3),
                row("lineEnding", "\n", 1, 7),
                row("linePrefix", "  ", 2, 1),
                row("data", "\\*x", 2, 3),
            ]
        );
    }

    #[test]
    fn escape_inside_a_line_does_not_split_the_text() {
        let tree = parse_tokens("- a \\*b\n");
        let content = tree.children(tree.roots()[0])[1];
        assert_eq!(paragraph_children(&tree, content), vec![row("data", "a \\*b", 1, 3)]);
    }

    #[test]
    fn headings_and_code_are_leaves() {
        let tree = parse_tokens("# Title\n\n```\n- not a list\n```\n");
        assert_eq!(kinds(&tree, tree.roots()), vec!["atxHeading", "codeFenced"]);
        assert!(tree.roots().iter().all(|&id| tree.children(id).is_empty()));
    }

    #[test]
    fn dump_of_small_list() {
        let tree = parse_tokens("- a\n  b\n");
        let expected = "\
1: listUnordered 1
  1: listItemPrefix 1
  1: content 3
    1: paragraph 3
      1: data 3 \"a\"
      1: lineEnding 4
      2: linePrefix 1
      2: data 3 \"b\"
";
        assert_eq!(dump_tree(&tree, tree.roots()), expected);
    }
}
