//! Operation cache (computed table).
//!
//! Memoizes recursive calls keyed by an [`OpKey`]: the operator tag, the
//! operand references and any auxiliary key such as a quantification cube or
//! a substituted variable. The cache is a pure optimization: a miss only
//! recomputes, and a collision simply overwrites the older entry.
//!
//! Node identities are not stable across garbage collection and reordering,
//! so the manager invalidates every cache after either event.

mod direct_mapped;

pub use direct_mapped::{DirectMappedCache, DEFAULT_CACHE_BITS};

use crate::add::{AddOp, AddUnaryOp, LeafTest};
use crate::reference::Ref;
use crate::types::Var;
use crate::utils::{pairing2, pairing4, MyHash};
use crate::zdd::{ZddOp, ZddVarOp};

/// The operation cache of one diagram kind.
pub type OperationCache = DirectMappedCache<OpKey, Ref>;

/// Key of a memoized recursive call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum OpKey {
    #[default]
    None,
    Ite(Ref, Ref, Ref),
    And(Ref, Ref),
    Xor(Ref, Ref),
    Leq(Ref, Ref),
    Exists(Ref, Ref),
    AndExists(Ref, Ref, Ref),
    Compose(Ref, Ref, Var),
    Cofactor(Ref, Ref),
    CofactorVar(Ref, Var, bool),
    Restrict(Ref, Ref),
    Constrain(Ref, Ref),
    BddToAdd(Ref),
    AddApply(AddOp, Ref, Ref),
    AddUnary(AddUnaryOp, Ref),
    AddIthBit(Ref, u32),
    AddIte(Ref, Ref, Ref),
    AddExists(Ref, Ref),
    AddForall(Ref, Ref),
    AddCompose(Ref, Ref, Var),
    /// ADD to BDD conversion; the two words are leaf-test bounds as bits.
    AddToBdd(LeafTest, Ref, u64, u64),
    Zdd(ZddOp, Ref, Ref),
    ZddVar(ZddVarOp, Ref, Var),
}

impl OpKey {
    /// Tag and three operand words.
    fn words(&self) -> (u64, u64, u64, u64) {
        let r = |x: &Ref| x.raw() as u64;
        match self {
            OpKey::None => (0, 0, 0, 0),
            OpKey::Ite(f, g, h) => (1, r(f), r(g), r(h)),
            OpKey::And(f, g) => (2, r(f), r(g), 0),
            OpKey::Xor(f, g) => (3, r(f), r(g), 0),
            OpKey::Leq(f, g) => (4, r(f), r(g), 0),
            OpKey::Exists(f, c) => (5, r(f), r(c), 0),
            OpKey::AndExists(f, g, c) => (6, r(f), r(g), r(c)),
            OpKey::Compose(f, g, v) => (7, r(f), r(g), v.index() as u64),
            OpKey::Cofactor(f, c) => (8, r(f), r(c), 0),
            OpKey::CofactorVar(f, v, b) => (9, r(f), v.index() as u64, *b as u64),
            OpKey::Restrict(f, c) => (10, r(f), r(c), 0),
            OpKey::Constrain(f, c) => (11, r(f), r(c), 0),
            OpKey::BddToAdd(f) => (12, r(f), 0, 0),
            OpKey::AddApply(op, f, g) => (pairing2(13, *op as u64), r(f), r(g), 0),
            OpKey::AddUnary(op, f) => (pairing2(14, *op as u64), r(f), 0, 0),
            OpKey::AddIthBit(f, bit) => (15, r(f), *bit as u64, 0),
            OpKey::AddIte(f, g, h) => (16, r(f), r(g), r(h)),
            OpKey::AddExists(f, c) => (17, r(f), r(c), 0),
            OpKey::AddForall(f, c) => (18, r(f), r(c), 0),
            OpKey::AddCompose(f, g, v) => (19, r(f), r(g), v.index() as u64),
            OpKey::AddToBdd(test, f, a, b) => (pairing2(20, *test as u64), r(f), *a, *b),
            OpKey::Zdd(op, f, g) => (pairing2(21, *op as u64), r(f), r(g), 0),
            OpKey::ZddVar(op, f, v) => (pairing2(22, *op as u64), r(f), v.index() as u64, 0),
        }
    }
}

impl MyHash for OpKey {
    fn hash(&self) -> u64 {
        let (tag, a, b, c) = self.words();
        pairing4(tag, a, b, c)
    }
}
