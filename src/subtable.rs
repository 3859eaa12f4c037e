//! Per-variable subtables with intrusive collision chains.
//!
//! Every variable owns one subtable holding the nodes labelled with it. Nodes
//! stay in their variable's subtable when reordering moves the variable to
//! another level, so a swap only touches the two subtables involved.
//!
//! ```text
//! Subtable for x3:
//! ┌──────────────────────────────────────────┐
//! │ buckets: [NodeId; 2^bits]                │
//! │   [0] ───► @5 ──► @12 ──► ∅              │
//! │   [1] ───► ∅                             │
//! │   [2] ───► @3 ──► ∅                      │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Chains are threaded through [`Node::next`], so a subtable is just an
//! array of chain heads. The variable is implicit, hence the bucket index is
//! a hash of `(high, low)` only.

use crate::node::Node;
use crate::reference::Ref;
use crate::types::{NodeId, Var};
use crate::utils::MyHash;

/// Default number of bucket bits (2^8 buckets per variable).
pub const DEFAULT_BUCKET_BITS: usize = 8;

/// Average chain length that triggers doubling the bucket array.
const MAX_CHAIN: usize = 4;

#[derive(Debug, Clone)]
pub struct Subtable {
    pub variable: Var,
    buckets: Vec<NodeId>,
    bitmask: u64,
    count: usize,
}

impl Subtable {
    pub fn new(variable: Var) -> Self {
        Self::with_bucket_bits(variable, DEFAULT_BUCKET_BITS)
    }

    pub fn with_bucket_bits(variable: Var, bits: usize) -> Self {
        let num_buckets = 1usize << bits;
        Self {
            variable,
            buckets: vec![NodeId::INVALID; num_buckets],
            bitmask: (num_buckets - 1) as u64,
            count: 0,
        }
    }

    #[inline]
    fn bucket_index(&self, high: Ref, low: Ref) -> usize {
        (hash_children(high, low) & self.bitmask) as usize
    }

    /// Looks up the node with the given children.
    pub fn find(&self, high: Ref, low: Ref, nodes: &[Node]) -> Option<NodeId> {
        let mut current = self.buckets[self.bucket_index(high, low)];
        while current != NodeId::INVALID {
            let node = &nodes[current.index()];
            if node.high == high && node.low == low {
                return Some(current);
            }
            current = node.next;
        }
        None
    }

    /// Links node `id` (whose children are already set) into its chain,
    /// doubling the bucket array first if chains grew too long.
    pub fn insert(&mut self, id: NodeId, nodes: &mut [Node]) {
        if self.count >= self.buckets.len() * MAX_CHAIN {
            self.resize(nodes);
        }
        self.link(id, nodes);
    }

    fn link(&mut self, id: NodeId, nodes: &mut [Node]) {
        let node = &nodes[id.index()];
        let bucket = self.bucket_index(node.high, node.low);
        nodes[id.index()].next = self.buckets[bucket];
        self.buckets[bucket] = id;
        self.count += 1;
    }

    /// Unlinks node `id` from its chain. The node's children must still be
    /// the ones it was inserted with.
    ///
    /// Returns `false` if the node was not found.
    pub fn remove(&mut self, id: NodeId, nodes: &mut [Node]) -> bool {
        let node = &nodes[id.index()];
        let bucket = self.bucket_index(node.high, node.low);

        let mut prev = NodeId::INVALID;
        let mut current = self.buckets[bucket];
        while current != NodeId::INVALID {
            let next = nodes[current.index()].next;
            if current == id {
                if prev == NodeId::INVALID {
                    self.buckets[bucket] = next;
                } else {
                    nodes[prev.index()].next = next;
                }
                nodes[id.index()].next = NodeId::INVALID;
                self.count -= 1;
                return true;
            }
            prev = current;
            current = next;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Collects the ids of all nodes in this subtable.
    pub fn ids(&self, nodes: &[Node]) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.count);
        for &head in &self.buckets {
            let mut current = head;
            while current != NodeId::INVALID {
                ids.push(current);
                current = nodes[current.index()].next;
            }
        }
        ids
    }

    /// Forgets every node without touching the arena.
    pub fn clear(&mut self) {
        self.buckets.fill(NodeId::INVALID);
        self.count = 0;
    }

    /// Doubles the bucket array and rehashes all chains.
    pub fn resize(&mut self, nodes: &mut [Node]) {
        log::debug!(
            "Resizing subtable for {}: {} -> {} buckets",
            self.variable,
            self.buckets.len(),
            self.buckets.len() * 2
        );
        let ids = self.ids(nodes);
        let num_buckets = self.buckets.len() * 2;
        self.buckets = vec![NodeId::INVALID; num_buckets];
        self.bitmask = (num_buckets - 1) as u64;
        self.count = 0;
        for id in ids {
            self.link(id, nodes);
        }
    }
}

#[inline]
fn hash_children(high: Ref, low: Ref) -> u64 {
    MyHash::hash(&(high.raw() as u64, low.raw() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(id: u32, negated: bool) -> Ref {
        Ref::new(NodeId::new(id), negated)
    }

    fn make_nodes() -> Vec<Node> {
        let x = Var::new(0);
        let mut nodes = vec![Node::terminal(0.0); 5];
        nodes[1] = Node::new(x, r(0, false), r(0, true));
        nodes[2] = Node::new(x, r(1, false), r(0, true));
        nodes[3] = Node::new(x, r(0, false), r(2, true));
        nodes[4] = Node::new(x, r(2, false), r(1, false));
        nodes
    }

    #[test]
    fn test_insert_find_remove() {
        let mut nodes = make_nodes();
        let mut st = Subtable::new(Var::new(0));

        assert!(st.find(r(0, false), r(0, true), &nodes).is_none());
        st.insert(NodeId::new(1), &mut nodes);
        assert_eq!(st.find(r(0, false), r(0, true), &nodes), Some(NodeId::new(1)));
        assert_eq!(st.len(), 1);

        assert!(st.remove(NodeId::new(1), &mut nodes));
        assert!(!st.remove(NodeId::new(1), &mut nodes));
        assert!(st.find(r(0, false), r(0, true), &nodes).is_none());
        assert!(st.is_empty());
    }

    #[test]
    fn test_collision_chains() {
        let mut nodes = make_nodes();
        // A single bucket: everything collides.
        let mut st = Subtable::with_bucket_bits(Var::new(0), 0);
        for id in 1..=3 {
            st.insert(NodeId::new(id), &mut nodes);
        }
        assert_eq!(st.len(), 3);

        // Unlink from the middle of the chain.
        assert!(st.remove(NodeId::new(2), &mut nodes));
        assert_eq!(st.find(r(0, false), r(0, true), &nodes), Some(NodeId::new(1)));
        assert_eq!(st.find(r(0, false), r(2, true), &nodes), Some(NodeId::new(3)));
        assert!(st.find(r(1, false), r(0, true), &nodes).is_none());
    }

    #[test]
    fn test_resize_keeps_nodes() {
        let mut nodes = make_nodes();
        let mut st = Subtable::with_bucket_bits(Var::new(0), 0);
        for id in 1..=4 {
            st.insert(NodeId::new(id), &mut nodes);
        }
        st.resize(&mut nodes);
        assert_eq!(st.num_buckets(), 2);
        assert_eq!(st.len(), 4);

        let mut ids: Vec<u32> = st.ids(&nodes).into_iter().map(|id| id.raw()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(st.find(r(2, false), r(1, false), &nodes), Some(NodeId::new(4)));
    }

    #[test]
    fn test_automatic_growth() {
        let mut nodes = make_nodes();
        let mut st = Subtable::with_bucket_bits(Var::new(0), 0);
        // 1 bucket * MAX_CHAIN entries fit before doubling.
        for id in 1..=4 {
            st.insert(NodeId::new(id), &mut nodes);
        }
        assert_eq!(st.num_buckets(), 1);
        st.remove(NodeId::new(4), &mut nodes);
        st.insert(NodeId::new(4), &mut nodes);
        assert_eq!(st.num_buckets(), 1);
        assert_eq!(st.len(), 4);
    }
}
