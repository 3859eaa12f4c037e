use crate::reference::Ref;
use crate::types::{NodeId, Var};

/// A decision diagram node as stored in a [`NodeTable`](crate::table::NodeTable).
///
/// Internal nodes carry a variable and two children. Terminal nodes carry
/// [`Var::TERMINAL`] and, in ADD tables, a leaf value. Recycled slots carry
/// [`Var::FREE`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Node {
    pub var: Var,
    /// Then-child. Never complemented in BDD tables.
    pub high: Ref,
    /// Else-child. May be complemented in BDD tables.
    pub low: Ref,
    /// Next node in the intrusive collision chain, or the next free slot.
    pub next: NodeId,
    /// Parent edges plus outstanding handles.
    pub refs: u32,
    /// In-flight recursive calls holding this node.
    pub pins: u32,
    /// Leaf value of ADD terminals.
    pub value: f64,
}

impl Node {
    /// Reference count of nodes that are never reclaimed.
    pub const PERMANENT: u32 = u32::MAX;

    pub fn new(var: Var, high: Ref, low: Ref) -> Self {
        Self {
            var,
            high,
            low,
            next: NodeId::INVALID,
            refs: 0,
            pins: 0,
            value: 0.0,
        }
    }

    pub fn terminal(value: f64) -> Self {
        Self {
            var: Var::TERMINAL,
            high: Ref::INVALID,
            low: Ref::INVALID,
            next: NodeId::INVALID,
            refs: Self::PERMANENT,
            pins: 0,
            value,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.var.is_terminal()
    }

    pub fn is_free(&self) -> bool {
        self.var == Var::FREE
    }

    pub fn is_permanent(&self) -> bool {
        self.refs == Self::PERMANENT
    }

    /// A node nobody references and no recursion holds.
    pub fn is_reclaimable(&self) -> bool {
        self.refs == 0 && self.pins == 0
    }
}

impl Default for Node {
    fn default() -> Self {
        Self {
            var: Var::FREE,
            high: Ref::INVALID,
            low: Ref::INVALID,
            next: NodeId::INVALID,
            refs: 0,
            pins: 0,
            value: 0.0,
        }
    }
}
