// walk.rs — Filterable lazy traversal of the model graph
//
// `GraphWalk` is a pre-order depth-first iterator over the property edges of
// a `ModelGraph`, starting at the repository roots. Children are visited in
// property declaration order. Every reachable node is offered to the filter
// exactly once; the filter decides whether the node is emitted and whether
// its subtree is explored.
//
// Preconditions: the graph is not mutated while the walk is alive (enforced
//                by the shared borrow).
// Postconditions: no node is emitted twice.
// Failure modes: none; cancellation simply ends the sequence.
// Side effects: none.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::id::NodeId;
use crate::model::ModelGraph;

/// Per-node filter decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkVerdict {
    /// Emit the node and explore its children.
    AcceptAndContinue,
    /// Skip the node but explore its children.
    RejectAndContinue,
    /// Skip the node and its entire subtree.
    RejectAndStop,
}

/// Cooperative cancellation flag, checked before each node visit.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct GraphWalk<'g, F> {
    graph: &'g ModelGraph,
    filter: F,
    stack: Vec<NodeId>,
    visited: Vec<bool>,
    cancel: Option<CancelToken>,
    cancelled: bool,
}

impl<'g, F> GraphWalk<'g, F>
where
    F: FnMut(NodeId) -> WalkVerdict,
{
    /// Walk everything reachable from the repository roots.
    pub fn from_repository(graph: &'g ModelGraph, filter: F) -> Self {
        Self::from_roots(graph, graph.roots(), filter)
    }

    pub fn from_roots(graph: &'g ModelGraph, roots: &[NodeId], filter: F) -> Self {
        GraphWalk {
            graph,
            filter,
            stack: roots.iter().rev().copied().collect(),
            visited: vec![false; graph.len()],
            cancel: None,
            cancelled: false,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// True if the walk ended early because its token was cancelled.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    fn push_children(&mut self, node: NodeId) {
        let start = self.stack.len();
        self.stack.extend(self.graph.node(node).children());
        self.stack[start..].reverse();
    }
}

impl<'g, F> Iterator for GraphWalk<'g, F>
where
    F: FnMut(NodeId) -> WalkVerdict,
{
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                if !self.cancelled {
                    tracing::debug!(pending = self.stack.len(), "graph walk cancelled");
                }
                self.cancelled = true;
                self.stack.clear();
                return None;
            }
            let node = self.stack.pop()?;
            let seen = &mut self.visited[node.index()];
            if *seen {
                continue;
            }
            *seen = true;
            match (self.filter)(node) {
                WalkVerdict::AcceptAndContinue => {
                    self.push_children(node);
                    return Some(node);
                }
                WalkVerdict::RejectAndContinue => self.push_children(node),
                WalkVerdict::RejectAndStop => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root → a → {c, d}; root → b → c; d → root (back edge)
    fn diamond() -> (ModelGraph, [NodeId; 5]) {
        let mut g = ModelGraph::new();
        let root = g.add_node(Some("root".into()), None);
        let a = g.add_node(Some("a".into()), None);
        let b = g.add_node(Some("b".into()), None);
        let c = g.add_node(Some("c".into()), None);
        let d = g.add_node(Some("d".into()), None);
        g.set_to_many(root, "items", vec![a, b]);
        g.set_to_one(a, "left", c);
        g.set_to_one(a, "right", d);
        g.set_to_one(b, "only", c);
        g.set_to_one(d, "back", root);
        g.add_root(root);
        (g, [root, a, b, c, d])
    }

    #[test]
    fn preorder_declaration_order() {
        let (g, [root, a, b, c, d]) = diamond();
        let order: Vec<NodeId> =
            GraphWalk::from_repository(&g, |_| WalkVerdict::AcceptAndContinue).collect();
        assert_eq!(order, vec![root, a, c, d, b]);
    }

    #[test]
    fn filter_sees_each_node_once() {
        let (g, _) = diamond();
        let mut calls = vec![0u32; g.len()];
        let count = GraphWalk::from_repository(&g, |n| {
            calls[n.index()] += 1;
            WalkVerdict::AcceptAndContinue
        })
        .count();
        assert_eq!(count, 5);
        assert!(calls.iter().all(|&c| c == 1));
    }

    #[test]
    fn reject_and_continue_explores_children() {
        let (g, [root, a, b, c, d]) = diamond();
        let order: Vec<NodeId> = GraphWalk::from_repository(&g, |n| {
            if n == a {
                WalkVerdict::RejectAndContinue
            } else {
                WalkVerdict::AcceptAndContinue
            }
        })
        .collect();
        assert_eq!(order, vec![root, c, d, b]);
    }

    #[test]
    fn reject_and_stop_prunes_subtree() {
        let (g, [root, a, b, c, _d]) = diamond();
        let order: Vec<NodeId> = GraphWalk::from_repository(&g, |n| {
            if n == a {
                WalkVerdict::RejectAndStop
            } else {
                WalkVerdict::AcceptAndContinue
            }
        })
        .collect();
        // c is still reachable through b; d is not
        assert_eq!(order, vec![root, b, c]);
    }

    #[test]
    fn cancelled_walk_ends_early() {
        let (g, [root, ..]) = diamond();
        let token = CancelToken::new();
        let inner = token.clone();
        let mut walk = GraphWalk::from_repository(&g, move |_| {
            inner.cancel();
            WalkVerdict::AcceptAndContinue
        })
        .with_cancel(token);
        assert_eq!(walk.next(), Some(root));
        assert_eq!(walk.next(), None);
        assert!(walk.was_cancelled());
    }

    #[test]
    fn empty_repository() {
        let g = ModelGraph::new();
        let mut walk = GraphWalk::from_repository(&g, |_| WalkVerdict::AcceptAndContinue);
        assert_eq!(walk.next(), None);
        assert!(!walk.was_cancelled());
    }
}
