use std::collections::HashSet;

use super::{Token, TokenId, TokenTree};

/// Strategies injected into [`traverse`].
///
/// `S` is state carried down the tree: each child receives
/// `next_state(&parent_state)`.
pub trait TokenVisitor<S: Clone> {
    /// Called once per reachable token, in pre-order, left to right.
    fn visit(&mut self, id: TokenId, token: &Token, state: &S);

    /// State handed to each child of the token being descended.
    fn next_state(&self, state: &S) -> S {
        state.clone()
    }

    /// Returning true keeps the walk out of `token`'s children. The token
    /// itself has already been visited.
    fn should_stop(&self, _token: &Token, _state: &S) -> bool {
        false
    }
}

/// Depth-first, pre-order walk from `root`.
///
/// `visited` is shared across the whole walk: a token already in it is
/// skipped along with everything below it. Pass a fresh set for an
/// independent walk, or a pre-filled one to fence tokens off. Ids that do not
/// resolve in `tree` are skipped.
pub fn traverse<S, V>(
    tree: &TokenTree,
    root: TokenId,
    visitor: &mut V,
    state: S,
    visited: &mut HashSet<TokenId>,
) where
    S: Clone,
    V: TokenVisitor<S> + ?Sized,
{
    // Explicit stack so deeply nested documents can't exhaust the call stack.
    // Children are pushed in reverse to pop left to right.
    let mut stack = vec![(root, state)];

    while let Some((id, state)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(token) = tree.get(id) else {
            continue;
        };

        visitor.visit(id, token, &state);

        if visitor.should_stop(token, &state) {
            continue;
        }

        for &child in token.children.iter().rev() {
            stack.push((child, visitor.next_state(&state)));
        }
    }
}

/// Walks from `root` with a fresh visited set.
pub fn walk<S, V>(tree: &TokenTree, root: TokenId, visitor: &mut V, state: S)
where
    S: Clone,
    V: TokenVisitor<S> + ?Sized,
{
    let mut visited = HashSet::new();
    traverse(tree, root, visitor, state, &mut visited);
}
