//! Preallocated, lock-per-node search tree.
//!
//! The pool is sized once per search and nodes are handed out by bumping an
//! atomic counter. A slot only becomes reachable after its parent edge
//! records the new id, which happens under the parent's lock.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use super::node::{MctsNode, NodeId};
use crate::core::PlayerId;

/// Node pool shared by all workers of one search.
pub struct SearchTree {
    slots: Box<[Mutex<MctsNode>]>,
    used: AtomicU32,
    player_count: usize,
}

impl SearchTree {
    /// Pool of `capacity` nodes holding `root` at index 0.
    pub fn new(root: MctsNode, capacity: usize, player_count: usize) -> Self {
        let capacity = capacity.clamp(1, u32::MAX as usize - 1);
        let mut slots: Vec<Mutex<MctsNode>> = Vec::with_capacity(capacity);
        slots.push(Mutex::new(root));
        slots.extend((1..capacity).map(|_| Mutex::new(MctsNode::root(PlayerId::new(0)))));
        Self {
            slots: slots.into_boxed_slice(),
            used: AtomicU32::new(1),
            player_count,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Lock a node.
    #[inline]
    pub fn lock(&self, id: NodeId) -> MutexGuard<'_, MctsNode> {
        self.slots[id.index()].lock()
    }

    /// Claim a slot for `node`. `None` when the pool is full.
    pub fn alloc(&self, node: MctsNode) -> Option<NodeId> {
        let capacity = self.slots.len() as u32;
        let index = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < capacity).then_some(n + 1))
            .ok()?;
        *self.slots[index as usize].lock() = node;
        Some(NodeId::new(index))
    }

    /// Nodes in use.
    #[must_use]
    pub fn len(&self) -> usize {
        self.used.load(Ordering::Acquire) as usize
    }

    /// Never true: the root is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.len() >= self.capacity()
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Check that every node's visits equal its edges' visits plus its own
    /// leaf visits, and that no traversal is left in flight.
    ///
    /// Only meaningful once all workers have stopped. Returns the first
    /// offending node.
    pub fn check_visits(&self) -> Result<(), NodeId> {
        for i in 0..self.len() {
            let id = NodeId::new(i as u32);
            let node = self.lock(id);
            let edge_visits: u64 = node.edges.iter().map(|e| u64::from(e.visits)).sum();
            let in_flight = node.edges.iter().any(|e| e.in_flight != 0);
            if in_flight || u64::from(node.visits) != edge_visits + u64::from(node.leaf_visits) {
                return Err(id);
            }
        }
        Ok(())
    }

    /// Get statistics about the tree.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            node_count: self.len(),
            ..TreeStats::default()
        };
        for i in 0..self.len() {
            let node = self.lock(NodeId::new(i as u32));
            stats.max_depth = stats.max_depth.max(node.depth);
            stats.terminal_count += usize::from(node.is_terminal());
            stats.total_edges += node.edges.len();
            stats.expanded_edges += node.edges.iter().filter(|e| e.is_expanded()).count();
            stats.killed_edges += node.edges.iter().filter(|e| e.killed).count();
        }
        stats
    }
}

impl std::fmt::Debug for SearchTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchTree")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("player_count", &self.player_count)
            .finish()
    }
}

/// Statistics about the search tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeStats {
    pub node_count: usize,
    pub max_depth: u16,
    pub terminal_count: usize,
    pub total_edges: usize,
    /// Edges with a child node.
    pub expanded_edges: usize,
    pub killed_edges: usize,
}

impl TreeStats {
    /// Average edges per node.
    #[must_use]
    pub fn branching_factor(&self) -> f64 {
        if self.node_count == 0 {
            0.0
        } else {
            self.total_edges as f64 / self.node_count as f64
        }
    }

    /// Expanded edges / total edges.
    #[must_use]
    pub fn expansion_ratio(&self) -> f64 {
        if self.total_edges == 0 {
            0.0
        } else {
            self.expanded_edges as f64 / self.total_edges as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Move, OpCode};

    const P0: PlayerId = PlayerId::new(0);

    #[test]
    fn test_tree_new() {
        let tree = SearchTree::new(MctsNode::root(P0), 8, 2);
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
        assert_eq!(tree.capacity(), 8);
        assert_eq!(tree.root(), NodeId::new(0));
    }

    #[test]
    fn test_alloc_until_exhausted() {
        let tree = SearchTree::new(MctsNode::root(P0), 3, 2);
        let a = tree.alloc(MctsNode::new(tree.root(), PlayerId::new(1), 1));
        let b = tree.alloc(MctsNode::new(tree.root(), PlayerId::new(1), 1));
        assert_eq!(a, Some(NodeId::new(1)));
        assert_eq!(b, Some(NodeId::new(2)));
        assert!(tree.is_exhausted());
        assert_eq!(tree.alloc(MctsNode::root(P0)), None);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.lock(NodeId::new(2)).depth, 1);
    }

    #[test]
    fn test_check_visits() {
        let tree = SearchTree::new(MctsNode::root(P0), 4, 2);
        {
            let mut root = tree.lock(tree.root());
            root.set_edges(vec![Move::new(OpCode::game(0)), Move::new(OpCode::game(1))], 2);
            root.edges[0].visits = 2;
            root.edges[1].visits = 1;
            root.visits = 3;
        }
        assert_eq!(tree.check_visits(), Ok(()));

        tree.lock(tree.root()).leaf_visits = 1;
        assert_eq!(tree.check_visits(), Err(tree.root()));
    }

    #[test]
    fn test_tree_stats() {
        let tree = SearchTree::new(MctsNode::root(P0), 4, 2);
        tree.lock(tree.root())
            .set_edges(vec![Move::new(OpCode::game(0)), Move::new(OpCode::game(1))], 2);
        let child = tree
            .alloc(MctsNode::terminal(tree.root(), PlayerId::new(1), 1, crate::mcts::draw_rewards(2)))
            .unwrap();
        tree.lock(tree.root()).edges[0].child = child;

        let stats = tree.stats();
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.max_depth, 1);
        assert_eq!(stats.terminal_count, 1);
        assert_eq!(stats.total_edges, 2);
        assert_eq!(stats.expansion_ratio(), 0.5);
        assert_eq!(stats.branching_factor(), 1.0);
    }
}
