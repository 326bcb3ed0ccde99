use std::collections::HashSet;

use super::traverse::{TokenVisitor, walk};
use super::{Token, TokenId, TokenTree, TokenType};

/// Filter for [`extract_by_type`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Extract<'a> {
    /// Types to collect. `None` collects every type.
    pub included: Option<&'a [TokenType]>,
    /// Types never collected, even if included.
    pub excluded: &'a [TokenType],
    /// Tokens the walk must not descend past. The token itself is still
    /// considered for collection.
    pub stop: Option<fn(&Token) -> bool>,
}

impl Extract<'_> {
    fn wants(&self, token: &Token) -> bool {
        let included = self
            .included
            .is_none_or(|types| types.contains(&token.kind));
        included && !self.excluded.contains(&token.kind)
    }
}

struct Collector<'f> {
    filter: Extract<'f>,
    found: Vec<TokenId>,
}

impl TokenVisitor<()> for Collector<'_> {
    fn visit(&mut self, id: TokenId, token: &Token, _state: &()) {
        if self.filter.wants(token) {
            self.found.push(id);
        }
    }

    fn should_stop(&self, token: &Token, _state: &()) -> bool {
        self.filter.stop.is_some_and(|stop| stop(token))
    }
}

/// Collects matching tokens reachable from `root` (inclusive), in pre-order.
pub fn extract_by_type(tree: &TokenTree, root: TokenId, filter: Extract<'_>) -> Vec<TokenId> {
    let mut collector = Collector {
        filter,
        found: Vec::new(),
    };
    walk(tree, root, &mut collector, ());
    collector.found
}

const LIST_TYPES: &[TokenType] = &[TokenType::ListOrdered, TokenType::ListUnordered];
const CONTENT_TYPES: &[TokenType] = &[TokenType::Content];

fn is_list(token: &Token) -> bool {
    token.kind.is_list()
}

/// Every list token in the document.
///
/// A list is collected exactly once, by the walk that starts closest to it:
/// walks stop at the first list they meet, and each collected list is then
/// searched for its own nested lists. Order is pre-order by list, so an outer
/// list comes before the lists nested inside it.
pub fn list_tokens(tree: &TokenTree) -> Vec<TokenId> {
    let mut lists = Vec::new();
    let mut seen = HashSet::new();
    let mut pending = nested_lists(tree, tree.roots());
    pending.reverse();

    while let Some(list) = pending.pop() {
        if !seen.insert(list) {
            continue;
        }
        lists.push(list);
        let mut nested = nested_lists(tree, tree.children(list));
        nested.reverse();
        pending.extend(nested);
    }
    lists
}

/// The lists closest to each of `starts`, in order.
fn nested_lists(tree: &TokenTree, starts: &[TokenId]) -> Vec<TokenId> {
    let filter = Extract {
        included: Some(LIST_TYPES),
        stop: Some(is_list),
        ..Default::default()
    };
    starts
        .iter()
        .flat_map(|&start| extract_by_type(tree, start, filter))
        .collect()
}

/// Content tokens belonging to `list` itself.
///
/// Searches the list's children, passing through block quotes and any other
/// wrapper, but never into a nested list: those own their content.
pub fn content_tokens(tree: &TokenTree, list: TokenId) -> Vec<TokenId> {
    let filter = Extract {
        included: Some(CONTENT_TYPES),
        stop: Some(is_list),
        ..Default::default()
    };
    tree.children(list)
        .iter()
        .flat_map(|&child| extract_by_type(tree, child, filter))
        .collect()
}

/// Every `(list, content)` pair in the document, in discovery order.
pub fn list_content_tokens(tree: &TokenTree) -> Vec<(TokenId, TokenId)> {
    list_tokens(tree)
        .into_iter()
        .flat_map(|list| {
            content_tokens(tree, list)
                .into_iter()
                .map(move |content| (list, content))
        })
        .collect()
}
