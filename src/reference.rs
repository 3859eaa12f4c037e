use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::types::NodeId;

/// A reference to a node, potentially complemented.
///
/// The least significant bit is the complement flag and the remaining bits
/// store the node id. Only BDD references ever carry the flag: ADD and ZDD
/// tables have no complement edges.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Ref(u32);

impl Ref {
    /// Sentinel for an invalid/uninitialized reference.
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates a new reference with the given node id and complement flag.
    pub const fn new(id: NodeId, negated: bool) -> Self {
        Self((id.raw() << 1) | (negated as u32))
    }

    /// Creates a regular (non-complemented) reference.
    pub const fn positive(id: NodeId) -> Self {
        Self::new(id, false)
    }

    /// Creates a complemented reference.
    pub const fn negative(id: NodeId) -> Self {
        Self::new(id, true)
    }

    /// Returns the node id this reference points to.
    #[inline]
    pub const fn id(self) -> NodeId {
        NodeId::from_raw(self.0 >> 1)
    }

    /// Returns `true` if this reference is complemented.
    #[inline]
    pub const fn is_negated(self) -> bool {
        (self.0 & 1) != 0
    }

    /// Returns the same reference with the complement flag cleared.
    #[inline]
    pub const fn regular(self) -> Self {
        Self(self.0 & !1)
    }

    /// Complements the reference if `flag` is set.
    #[inline]
    pub const fn negate_if(self, flag: bool) -> Self {
        Self(self.0 ^ (flag as u32))
    }

    /// Returns the raw underlying value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Default for Ref {
    fn default() -> Self {
        Self::INVALID
    }
}

// -Ref
impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_negated() {
            write!(f, "~{}", self.id())
        } else {
            write!(f, "{}", self.id())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_polarity() {
        let id = NodeId::new(42);

        let pos = Ref::positive(id);
        let neg = Ref::negative(id);
        assert_eq!(pos.id(), id);
        assert_eq!(neg.id(), id);
        assert!(!pos.is_negated());
        assert!(neg.is_negated());
        assert_ne!(pos, neg);
        assert_eq!(neg.regular(), pos);
    }

    #[test]
    fn test_ref_negation() {
        let pos = Ref::positive(NodeId::new(5));

        assert_eq!(-pos, Ref::negative(NodeId::new(5)));
        assert_eq!(-(-pos), pos);
        assert_eq!(pos.negate_if(false), pos);
        assert_eq!(pos.negate_if(true), -pos);
    }

    #[test]
    fn test_ref_display() {
        let r = Ref::positive(NodeId::new(7));
        assert_eq!(r.to_string(), "@7");
        assert_eq!((-r).to_string(), "~@7");
    }

    #[test]
    fn test_ref_max_id() {
        let r = Ref::negative(NodeId::new(NodeId::MAX));
        assert_eq!(r.id().raw(), NodeId::MAX);
        assert!(r.is_negated());
        assert_ne!(r, Ref::INVALID);
    }
}
