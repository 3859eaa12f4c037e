//! Owned diagram handles.
//!
//! A [`Diagram`] keeps its root node alive: creating or cloning a handle
//! increments the node's reference count, dropping it decrements it. The
//! kind marker fixes which node table the root lives in, so a BDD can never
//! be passed where a ZDD is expected.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Not;
use std::rc::Rc;

use crate::error::DdResult;
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::{BDD_ONE, BDD_ZERO, ZDD_BASE, ZDD_EMPTY};
use crate::types::{Kind, Var};

mod sealed {
    pub trait Sealed {}
}

/// Type-level tag of a diagram kind.
pub trait DiagramKind: sealed::Sealed + 'static {
    const KIND: Kind;
}

/// Marker of Boolean diagrams.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BddKind {}

/// Marker of algebraic (real-valued) diagrams.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AddKind {}

/// Marker of zero-suppressed diagrams.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ZddKind {}

impl sealed::Sealed for BddKind {}
impl sealed::Sealed for AddKind {}
impl sealed::Sealed for ZddKind {}

impl DiagramKind for BddKind {
    const KIND: Kind = Kind::Bdd;
}

impl DiagramKind for AddKind {
    const KIND: Kind = Kind::Add;
}

impl DiagramKind for ZddKind {
    const KIND: Kind = Kind::Zdd;
}

/// An owned reference to the root of a decision diagram.
pub struct Diagram<K: DiagramKind> {
    pub(crate) core: Rc<Core>,
    pub(crate) node: Ref,
    _kind: PhantomData<K>,
}

/// A Boolean function with complement edges.
pub type Bdd = Diagram<BddKind>;
/// A function from assignments to `f64`.
pub type Add = Diagram<AddKind>;
/// A family of sets.
pub type Zdd = Diagram<ZddKind>;

impl<K: DiagramKind> Diagram<K> {
    pub(crate) fn from_raw(core: Rc<Core>, node: Ref) -> Self {
        core.acquire(K::KIND, node);
        Self {
            core,
            node,
            _kind: PhantomData,
        }
    }

    pub fn kind(&self) -> Kind {
        K::KIND
    }

    /// The root reference. Stable only until the next garbage collection
    /// frees and reuses slots of *other* nodes; the root itself stays put.
    pub fn node(&self) -> Ref {
        self.node
    }

    /// The manager this diagram belongs to.
    pub fn manager(&self) -> Manager {
        Manager {
            core: self.core.clone(),
        }
    }

    pub fn belongs_to(&self, manager: &Manager) -> bool {
        Rc::ptr_eq(&self.core, &manager.core)
    }

    pub fn is_constant(&self) -> bool {
        !self.core.is_destroyed() && self.core.is_terminal(K::KIND, self.node)
    }

    /// Variable of the root node, or `None` for a terminal.
    pub fn top_var(&self) -> Option<Var> {
        if self.is_constant() || self.core.is_destroyed() {
            None
        } else {
            Some(self.core.var_of(K::KIND, self.node))
        }
    }

    /// Number of distinct nodes reachable from the root, terminals included.
    pub fn size(&self) -> usize {
        if self.core.is_destroyed() {
            return 0;
        }
        reachable(&self.core, K::KIND, [self.node]).len()
    }

    /// Variables appearing in the diagram, sorted by index.
    pub fn support(&self) -> Vec<Var> {
        if self.core.is_destroyed() {
            return Vec::new();
        }
        let table = self.core.forest(K::KIND).table.borrow();
        let mut vars: Vec<Var> = reachable(&self.core, K::KIND, [self.node])
            .into_iter()
            .map(|id| table.node(id).var)
            .filter(|v| !v.is_terminal())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        vars.sort();
        vars
    }
}

impl Manager {
    /// Number of distinct nodes reachable from any of `roots`, terminals
    /// included. Every root must belong to this manager.
    pub fn shared_size<'a, K: DiagramKind + 'a>(
        &self,
        roots: impl IntoIterator<Item = &'a Diagram<K>>,
    ) -> DdResult<usize> {
        let roots = roots.into_iter().map(|f| self.check(f)).collect::<DdResult<Vec<Ref>>>()?;
        self.query(|core| Ok(reachable(core, K::KIND, roots).len()))
    }
}

/// Node ids reachable from `roots`.
pub(crate) fn reachable(core: &Core, kind: Kind, roots: impl IntoIterator<Item = Ref>) -> HashSet<crate::types::NodeId> {
    let table = core.forest(kind).table.borrow();
    let mut visited = HashSet::new();
    let mut stack: Vec<Ref> = roots.into_iter().collect();
    while let Some(r) = stack.pop() {
        if visited.insert(r.id()) && !table.is_terminal(r) {
            let node = table.node(r.id());
            stack.push(node.high);
            stack.push(node.low);
        }
    }
    visited
}

impl<K: DiagramKind> Clone for Diagram<K> {
    fn clone(&self) -> Self {
        Self::from_raw(self.core.clone(), self.node)
    }
}

impl<K: DiagramKind> Drop for Diagram<K> {
    fn drop(&mut self) {
        self.core.release(K::KIND, self.node);
    }
}

impl<K: DiagramKind> PartialEq for Diagram<K> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core) && self.node == other.node
    }
}

impl<K: DiagramKind> Eq for Diagram<K> {}

impl<K: DiagramKind> Hash for Diagram<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.core.id.hash(state);
        self.node.hash(state);
    }
}

impl<K: DiagramKind> fmt::Debug for Diagram<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", K::KIND, self.node)
    }
}

impl<K: DiagramKind> fmt::Display for Diagram<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)
    }
}

impl Bdd {
    pub fn is_one(&self) -> bool {
        self.node == BDD_ONE
    }

    pub fn is_zero(&self) -> bool {
        self.node == BDD_ZERO
    }
}

impl Not for &Bdd {
    type Output = Bdd;

    /// Negation flips the complement bit and never allocates.
    fn not(self) -> Bdd {
        Bdd::from_raw(self.core.clone(), -self.node)
    }
}

impl Not for Bdd {
    type Output = Bdd;

    fn not(self) -> Bdd {
        !&self
    }
}

impl Add {
    /// Leaf value if the diagram is a constant.
    pub fn value(&self) -> Option<f64> {
        if self.core.is_destroyed() {
            None
        } else {
            self.core.leaf_value(self.node)
        }
    }
}

impl Zdd {
    /// Whether this is the empty family.
    pub fn is_empty(&self) -> bool {
        self.node == ZDD_EMPTY
    }

    /// Whether this is the family containing only the empty set.
    pub fn is_base(&self) -> bool {
        self.node == ZDD_BASE
    }
}
