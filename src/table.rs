//! Canonicalizing node storage.
//!
//! A [`NodeTable`] owns the node arena of one diagram kind together with one
//! [`Subtable`] per variable and, for ADDs, a value-indexed table of leaves.
//! [`NodeTable::make`] is the single place where nodes come into existence,
//! so it enforces the reduction rule of the kind and, for BDDs, the
//! complement-edge normal form (then-edges are never complemented).
//!
//! Reference counts live in the nodes. A node whose count drops to zero is
//! *dead*: it stays in its subtable, may be resurrected by a lookup, and is
//! reclaimed by the next sweep.

use std::collections::HashMap;

use crate::node::Node;
use crate::reference::Ref;
use crate::subtable::Subtable;
use crate::types::{Kind, NodeId, Var};

/// The arena has no free slot left within its capacity.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TableFull;

/// BDD constant `true`.
pub const BDD_ONE: Ref = Ref::positive(NodeId::new(0));
/// BDD constant `false`.
pub const BDD_ZERO: Ref = Ref::negative(NodeId::new(0));

/// ADD leaf `0.0`.
pub const ADD_ZERO: Ref = Ref::positive(NodeId::new(0));
/// ADD leaf `1.0`.
pub const ADD_ONE: Ref = Ref::positive(NodeId::new(1));
/// ADD leaf `+∞`.
pub const ADD_PLUS_INF: Ref = Ref::positive(NodeId::new(2));
/// ADD leaf `-∞`.
pub const ADD_MINUS_INF: Ref = Ref::positive(NodeId::new(3));

/// ZDD empty family `∅`.
pub const ZDD_EMPTY: Ref = Ref::positive(NodeId::new(0));
/// ZDD base family `{∅}`.
pub const ZDD_BASE: Ref = Ref::positive(NodeId::new(1));

pub struct NodeTable {
    kind: Kind,
    nodes: Vec<Node>,
    free_head: NodeId,
    subtables: Vec<Subtable>,
    constants: HashMap<u64, NodeId>,
    bucket_bits: usize,
    /// Maximum number of arena slots for bounded allocations.
    max_slots: Option<usize>,
    /// Non-terminal nodes currently allocated (dead ones included).
    internal: usize,
    /// Allocated nodes with a zero reference count.
    dead: usize,
    peak: usize,
}

impl NodeTable {
    pub fn new(kind: Kind, bucket_bits: usize, max_slots: Option<usize>) -> Self {
        let mut table = Self {
            kind,
            nodes: Vec::new(),
            free_head: NodeId::INVALID,
            subtables: Vec::new(),
            constants: HashMap::new(),
            bucket_bits,
            max_slots,
            internal: 0,
            dead: 0,
            peak: 0,
        };
        table.init_terminals();
        table
    }

    fn init_terminals(&mut self) {
        match self.kind {
            Kind::Bdd => {
                self.nodes.push(Node::terminal(1.0));
            }
            Kind::Zdd => {
                self.nodes.push(Node::terminal(0.0));
                self.nodes.push(Node::terminal(1.0));
            }
            Kind::Add => {
                for value in [0.0, 1.0, f64::INFINITY, f64::NEG_INFINITY] {
                    let id = NodeId::new(self.nodes.len() as u32);
                    self.nodes.push(Node::terminal(value));
                    self.constants.insert(value_key(value), id);
                }
            }
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn var(&self, r: Ref) -> Var {
        self.nodes[r.id().index()].var
    }

    #[inline]
    pub fn is_terminal(&self, r: Ref) -> bool {
        self.nodes[r.id().index()].is_terminal()
    }

    /// Then-child, with the complement of `r` pushed down.
    #[inline]
    pub fn high(&self, r: Ref) -> Ref {
        self.nodes[r.id().index()].high.negate_if(r.is_negated())
    }

    /// Else-child, with the complement of `r` pushed down.
    #[inline]
    pub fn low(&self, r: Ref) -> Ref {
        self.nodes[r.id().index()].low.negate_if(r.is_negated())
    }

    /// Leaf value of an ADD terminal.
    pub fn value(&self, r: Ref) -> Option<f64> {
        let node = &self.nodes[r.id().index()];
        if node.is_terminal() && self.kind == Kind::Add {
            Some(node.value)
        } else {
            None
        }
    }

    pub fn num_vars(&self) -> usize {
        self.subtables.len()
    }

    /// Makes room for variables `0..=var`.
    pub fn ensure_var(&mut self, var: Var) {
        while self.subtables.len() <= var.as_usize() {
            let v = Var::new(self.subtables.len() as u32);
            self.subtables.push(Subtable::with_bucket_bits(v, self.bucket_bits));
        }
    }

    pub fn subtable(&self, var: Var) -> &Subtable {
        &self.subtables[var.as_usize()]
    }

    /// Number of allocated non-terminal nodes, dead ones included.
    pub fn internal_len(&self) -> usize {
        self.internal
    }

    /// Number of allocated non-terminal nodes with a positive count.
    pub fn live_len(&self) -> usize {
        // Dead ADD leaves are counted in `dead` but not in `internal`.
        self.internal + self.constants.len() - self.permanent_terminals() - self.dead
    }

    fn permanent_terminals(&self) -> usize {
        match self.kind {
            Kind::Add => 4,
            _ => 0,
        }
    }

    pub fn dead(&self) -> usize {
        self.dead
    }

    pub fn peak(&self) -> usize {
        self.peak
    }

    pub fn set_max_slots(&mut self, max_slots: Option<usize>) {
        self.max_slots = max_slots;
    }

    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Looks up an existing node without applying reduction rules.
    pub fn find(&self, var: Var, high: Ref, low: Ref) -> Option<Ref> {
        self.subtables[var.as_usize()]
            .find(high, low, &self.nodes)
            .map(Ref::positive)
    }

    /// Returns the canonical node `(var, high, low)`, creating it if needed.
    ///
    /// Applies the reduction rule of the table's kind. Children must be
    /// alive and strictly below `var` in the current order. When `bounded`
    /// is set, allocation respects the capacity limit.
    pub fn make(&mut self, var: Var, high: Ref, low: Ref, bounded: bool) -> Result<Ref, TableFull> {
        match self.kind {
            Kind::Bdd => {
                if high == low {
                    return Ok(high);
                }
                if high.is_negated() {
                    return self.find_or_insert(var, -high, -low, bounded).map(|r| -r);
                }
            }
            Kind::Add => {
                if high == low {
                    return Ok(high);
                }
            }
            Kind::Zdd => {
                if high == ZDD_EMPTY {
                    return Ok(low);
                }
            }
        }
        self.find_or_insert(var, high, low, bounded)
    }

    fn find_or_insert(&mut self, var: Var, high: Ref, low: Ref, bounded: bool) -> Result<Ref, TableFull> {
        debug_assert!(!high.is_negated() || self.kind != Kind::Bdd);
        if let Some(r) = self.find(var, high, low) {
            return Ok(r);
        }
        let id = self.alloc(Node::new(var, high, low), bounded)?;
        self.inc_ref(high.id());
        self.inc_ref(low.id());
        self.internal += 1;
        self.subtables[var.as_usize()].insert(id, &mut self.nodes);
        Ok(Ref::positive(id))
    }

    /// Returns the ADD leaf holding `value`, creating it if needed.
    pub fn constant(&mut self, value: f64, bounded: bool) -> Result<Ref, TableFull> {
        debug_assert_eq!(self.kind, Kind::Add);
        let key = value_key(value);
        if let Some(&id) = self.constants.get(&key) {
            return Ok(Ref::positive(id));
        }
        let mut node = Node::terminal(normalize(value));
        node.refs = 0;
        let id = self.alloc(node, bounded)?;
        self.constants.insert(key, id);
        Ok(Ref::positive(id))
    }

    fn alloc(&mut self, node: Node, bounded: bool) -> Result<NodeId, TableFull> {
        let id = if self.free_head != NodeId::INVALID {
            let id = self.free_head;
            self.free_head = self.nodes[id.index()].next;
            self.nodes[id.index()] = node;
            id
        } else {
            if bounded && self.max_slots.is_some_and(|max| self.nodes.len() >= max) {
                return Err(TableFull);
            }
            if self.nodes.len() > NodeId::MAX as usize {
                return Err(TableFull);
            }
            self.nodes.push(node);
            NodeId::new((self.nodes.len() - 1) as u32)
        };
        if node.refs == 0 {
            self.dead += 1;
        }
        self.peak = self.peak.max(self.internal + 1);
        Ok(id)
    }

    pub fn inc_ref(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        if node.is_permanent() {
            return;
        }
        if node.refs == 0 {
            self.dead -= 1;
        }
        node.refs += 1;
    }

    pub fn dec_ref(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        if node.is_permanent() {
            return;
        }
        debug_assert!(node.refs > 0, "reference count underflow on {}", id);
        node.refs = node.refs.saturating_sub(1);
        if node.refs == 0 {
            self.dead += 1;
        }
    }

    pub fn pin(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        node.pins += 1;
    }

    pub fn unpin(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        debug_assert!(node.pins > 0, "unbalanced unpin on {}", id);
        node.pins = node.pins.saturating_sub(1);
    }

    /// Returns a node's slot to the free list and drops its references to
    /// its children. The node must be reclaimable.
    ///
    /// Returns the children ids so callers can cascade.
    pub fn free(&mut self, id: NodeId) -> Option<(NodeId, NodeId)> {
        let node = self.nodes[id.index()];
        debug_assert!(node.is_reclaimable() && !node.is_free());
        let children = if node.is_terminal() {
            self.constants.remove(&value_key(node.value));
            None
        } else {
            self.subtables[node.var.as_usize()].remove(id, &mut self.nodes);
            self.internal -= 1;
            Some((node.high.id(), node.low.id()))
        };
        self.dead -= 1;
        self.nodes[id.index()] = Node {
            next: self.free_head,
            ..Node::default()
        };
        self.free_head = id;
        if let Some((high, low)) = children {
            self.dec_ref(high);
            self.dec_ref(low);
        }
        children
    }

    /// Frees `id` and every descendant that becomes reclaimable as a result.
    pub fn free_cascade(&mut self, id: NodeId) -> usize {
        let mut freed = 0;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            if node.is_free() || node.is_permanent() || !node.is_reclaimable() {
                continue;
            }
            if let Some((high, low)) = self.free(id) {
                stack.push(high);
                stack.push(low);
            }
            freed += 1;
        }
        freed
    }

    /// Frees every reclaimable node.
    ///
    /// `levels` lists the variables from the top level down; visiting
    /// parents before children lets one pass collect whole dead subgraphs.
    pub fn sweep(&mut self, levels: &[Var]) -> usize {
        let mut freed = 0;
        for &var in levels {
            if var.as_usize() >= self.subtables.len() {
                continue;
            }
            for id in self.subtables[var.as_usize()].ids(&self.nodes) {
                if self.nodes[id.index()].is_reclaimable() {
                    self.free(id);
                    freed += 1;
                }
            }
        }
        let leaves: Vec<NodeId> = self.constants.values().copied().collect();
        for id in leaves {
            let node = &self.nodes[id.index()];
            if !node.is_permanent() && node.is_reclaimable() {
                self.free(id);
                freed += 1;
            }
        }
        freed
    }

    /// Rewrites an internal node in place and moves it to the subtable of
    /// its new variable. Reference counts are the caller's business.
    pub(crate) fn relabel(&mut self, id: NodeId, var: Var, high: Ref, low: Ref) {
        let node = &mut self.nodes[id.index()];
        node.var = var;
        node.high = high;
        node.low = low;
        self.subtables[var.as_usize()].insert(id, &mut self.nodes);
    }

    /// Unlinks an internal node from its subtable without freeing it.
    pub(crate) fn unlink(&mut self, id: NodeId) {
        let var = self.nodes[id.index()].var;
        self.subtables[var.as_usize()].remove(id, &mut self.nodes);
    }

    /// Drops every node, terminals excepted.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.constants.clear();
        self.free_head = NodeId::INVALID;
        for st in &mut self.subtables {
            st.clear();
        }
        self.internal = 0;
        self.dead = 0;
        self.init_terminals();
    }
}

fn normalize(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

fn value_key(value: f64) -> u64 {
    normalize(value).to_bits()
}
