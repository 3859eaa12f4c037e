//! Type-safe wrappers for variables, levels, literals and node ids.
//!
//! Variable indices are stable: reordering moves a variable to another
//! [`Level`] but never changes its [`Var`]. Keeping the two apart in the type
//! system prevents the classic mistake of comparing indices where positions
//! in the current order are meant.

use std::fmt;
use std::ops::Neg;

/// A variable index (0-based).
///
/// Indices are assigned at creation time and never change. The position of a
/// variable in the current order is its [`Level`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Marker stored in terminal nodes.
    pub(crate) const TERMINAL: Var = Var(u32::MAX);
    /// Marker stored in recycled arena slots.
    pub(crate) const FREE: Var = Var(u32::MAX - 1);
    /// Largest index a manager accepts, in either variable space.
    pub const MAX_INDEX: u32 = 0xFFFF;

    /// Creates a variable with the given index.
    pub const fn new(index: u32) -> Self {
        Var(index)
    }

    /// Returns the raw variable index.
    pub const fn index(self) -> u32 {
        self.0
    }

    pub(crate) const fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn is_terminal(self) -> bool {
        self.0 == Self::TERMINAL.0
    }

    /// Positive literal of this variable.
    pub fn pos(self) -> Lit {
        Lit::new(self, true)
    }

    /// Negative literal of this variable.
    pub fn neg(self) -> Lit {
        Lit::new(self, false)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "terminal")
        } else {
            write!(f, "x{}", self.0)
        }
    }
}

impl From<u32> for Var {
    fn from(index: u32) -> Self {
        Var(index)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A level in the variable ordering (0 is the topmost level).
///
/// Terminals live below every level, at [`Level::TERMINAL`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(usize);

impl Level {
    /// The pseudo-level of terminal nodes, below every variable.
    pub const TERMINAL: Level = Level(usize::MAX);

    /// Creates a new level with the given index.
    pub const fn new(index: usize) -> Self {
        Level(index)
    }

    /// Returns the raw level index.
    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns the next level down.
    pub fn next(self) -> Self {
        Level(self.0 + 1)
    }

    /// Returns the previous level up, or `None` at the top.
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Level)
    }

    /// Returns `true` for level 0.
    pub fn is_top(self) -> bool {
        self.0 == 0
    }

    pub fn is_terminal(self) -> bool {
        self.0 == usize::MAX
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "L⊥")
        } else {
            write!(f, "L{}", self.0)
        }
    }
}

impl From<usize> for Level {
    fn from(index: usize) -> Self {
        Level(index)
    }
}

/// A literal: a variable with a polarity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit {
    var: Var,
    positive: bool,
}

impl Lit {
    pub const fn new(var: Var, positive: bool) -> Self {
        Lit { var, positive }
    }

    pub const fn var(self) -> Var {
        self.var
    }

    pub const fn is_positive(self) -> bool {
        self.positive
    }

    pub const fn is_negative(self) -> bool {
        !self.positive
    }
}

impl Neg for Lit {
    type Output = Lit;

    fn neg(self) -> Self::Output {
        Lit::new(self.var, !self.positive)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{}", self.var)
        } else {
            write!(f, "~{}", self.var)
        }
    }
}

/// Index of a node in a node table arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Largest id representable inside a [`Ref`](crate::reference::Ref).
    pub const MAX: u32 = 0x7FFF_FFFE;
    /// End-of-chain marker for intrusive hash chains.
    pub const INVALID: NodeId = NodeId(0x7FFF_FFFF);

    /// Creates a node id.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not fit in 31 bits.
    pub const fn new(id: u32) -> Self {
        assert!(id <= Self::MAX, "node id does not fit in 31 bits");
        NodeId(id)
    }

    pub(crate) const fn from_raw(id: u32) -> Self {
        NodeId(id & 0x7FFF_FFFF)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId::new(id)
    }
}

/// The three diagram kinds a manager represents.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Kind {
    /// Boolean-valued, with complement edges.
    Bdd,
    /// Arbitrary (real) leaf values.
    Add,
    /// Zero-suppressed families of sets.
    Zdd,
}

impl Kind {
    /// The variable space this kind is ordered in.
    pub fn space(self) -> Space {
        match self {
            Kind::Bdd | Kind::Add => Space::Bdd,
            Kind::Zdd => Space::Zdd,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Bdd => write!(f, "BDD"),
            Kind::Add => write!(f, "ADD"),
            Kind::Zdd => write!(f, "ZDD"),
        }
    }
}

/// An independently ordered variable space.
///
/// BDDs and ADDs share [`Space::Bdd`]; ZDDs have their own.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Space {
    Bdd,
    Zdd,
}

impl Space {
    /// Kinds whose tables are ordered by this space.
    pub fn kinds(self) -> &'static [Kind] {
        match self {
            Space::Bdd => &[Kind::Bdd, Kind::Add],
            Space::Zdd => &[Kind::Zdd],
        }
    }
}
