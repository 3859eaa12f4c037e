//! Evaluation of diagrams under a variable assignment.
//!
//! Evaluation follows a single path from the root to a terminal, so it only
//! needs values for the variables met along the way.

use std::collections::HashMap;

use crate::error::{DdError, DdResult};
use crate::handle::{Add, Bdd, Zdd};
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::{BDD_ONE, ZDD_BASE};
use crate::types::{Kind, Lit, Var};

/// A source of variable values.
pub trait Assignment {
    fn value(&self, var: Var) -> Option<bool>;
}

/// Indexed by variable index.
impl Assignment for [bool] {
    fn value(&self, var: Var) -> Option<bool> {
        self.get(var.as_usize()).copied()
    }
}

impl Assignment for Vec<bool> {
    fn value(&self, var: Var) -> Option<bool> {
        self.as_slice().value(var)
    }
}

impl<const N: usize> Assignment for [bool; N] {
    fn value(&self, var: Var) -> Option<bool> {
        self.as_slice().value(var)
    }
}

impl Assignment for HashMap<Var, bool> {
    fn value(&self, var: Var) -> Option<bool> {
        self.get(&var).copied()
    }
}

/// A list of literals, as produced by cube enumeration.
impl Assignment for [Lit] {
    fn value(&self, var: Var) -> Option<bool> {
        self.iter().find(|l| l.var() == var).map(|l| l.is_positive())
    }
}

impl Core {
    /// Follows the path selected by `assignment` and returns the terminal.
    fn follow<A: Assignment + ?Sized>(&self, kind: Kind, mut r: Ref, assignment: &A) -> DdResult<Ref> {
        while !self.is_terminal(kind, r) {
            let var = self.var_of(kind, r);
            let value = assignment
                .value(var)
                .ok_or_else(|| DdError::invalid(format!("no value for variable {}", var)))?;
            let (high, low) = self.children(kind, r);
            r = if value { high } else { low };
        }
        Ok(r)
    }

    /// ZDD paths skip absent variables, so every level must be checked.
    fn zdd_follow<A: Assignment + ?Sized>(&self, mut r: Ref, assignment: &A) -> DdResult<bool> {
        let vars = self.space(crate::types::Space::Zdd).order.borrow().vars().to_vec();
        for var in vars {
            let value = assignment.value(var).unwrap_or(false);
            let at_var = !self.is_terminal(Kind::Zdd, r) && self.var_of(Kind::Zdd, r) == var;
            if at_var {
                let (high, low) = self.children(Kind::Zdd, r);
                r = if value { high } else { low };
            } else if value {
                return Ok(false);
            }
        }
        Ok(r == ZDD_BASE)
    }
}

impl Manager {
    /// Value of `f` under `assignment`.
    ///
    /// ```
    /// use dd_rs::manager::Manager;
    ///
    /// let mgr = Manager::new(2, 0, None);
    /// let x0 = mgr.var(0).unwrap();
    /// let x1 = mgr.var(1).unwrap();
    /// let f = mgr.and(&x0, &!&x1).unwrap();
    /// assert!(mgr.eval(&f, &[true, false]).unwrap());
    /// assert!(!mgr.eval(&f, &[true, true]).unwrap());
    /// ```
    pub fn eval<A: Assignment + ?Sized>(&self, f: &Bdd, assignment: &A) -> DdResult<bool> {
        let f = self.check(f)?;
        self.query(|core| Ok(core.follow(Kind::Bdd, f, assignment)? == BDD_ONE))
    }

    /// Leaf value of `f` under `assignment`.
    pub fn add_eval<A: Assignment + ?Sized>(&self, f: &Add, assignment: &A) -> DdResult<f64> {
        let f = self.check(f)?;
        self.query(|core| {
            let leaf = core.follow(Kind::Add, f, assignment)?;
            core.leaf_value(leaf)
                .ok_or_else(|| DdError::invalid("path does not end in a leaf"))
        })
    }

    /// Whether the set `{ v | assignment(v) }` belongs to the family `f`.
    /// Missing values count as `false`.
    pub fn zdd_eval<A: Assignment + ?Sized>(&self, f: &Zdd, assignment: &A) -> DdResult<bool> {
        let f = self.check(f)?;
        self.query(|core| core.zdd_follow(f, assignment))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_eval_var() {
        let mgr = Manager::new(2, 0, None);
        let x = mgr.var(1).unwrap();
        assert!(mgr.eval(&x, &[false, true]).unwrap());
        assert!(!mgr.eval(&x, &[true, false]).unwrap());
        assert!(!mgr.eval(&!&x, &[false, true]).unwrap());
    }

    #[test]
    fn test_eval_constants_need_nothing() {
        let mgr = Manager::new(2, 0, None);
        let empty: [bool; 0] = [];
        assert!(mgr.eval(&mgr.one(), &empty).unwrap());
        assert!(!mgr.eval(&mgr.zero(), &empty).unwrap());
    }

    #[test]
    fn test_eval_missing_value() {
        let mgr = Manager::new(3, 0, None);
        let f = mgr.and(&mgr.var(0).unwrap(), &mgr.var(2).unwrap()).unwrap();
        assert!(mgr.eval(&f, &[false]).is_ok());
        assert!(matches!(mgr.eval(&f, &[true]), Err(DdError::InvalidArgument(_))));
    }

    #[test]
    fn test_eval_map_and_literals() {
        let mgr = Manager::new(3, 0, None);
        let f = mgr.xor(&mgr.var(0).unwrap(), &mgr.var(2).unwrap()).unwrap();
        let map: HashMap<Var, bool> = [(Var::new(0), true), (Var::new(2), false)].into_iter().collect();
        assert!(mgr.eval(&f, &map).unwrap());
        let lits = [Var::new(0).pos(), Var::new(2).pos()];
        assert!(!mgr.eval(&f, &lits[..]).unwrap());
    }

    #[test]
    fn test_add_eval() {
        let mgr = Manager::new(2, 0, None);
        let x = mgr.add_var(0).unwrap();
        let c = mgr.add_const(2.5).unwrap();
        let f = mgr.add_times(&x, &c).unwrap();
        assert_eq!(mgr.add_eval(&f, &[true, false]).unwrap(), 2.5);
        assert_eq!(mgr.add_eval(&f, &[false, false]).unwrap(), 0.0);
    }

    #[test]
    fn test_zdd_eval() {
        let mgr = Manager::new(0, 3, None);
        let f = mgr.zdd_from_sets(&[vec![Var::new(0), Var::new(2)], vec![]]).unwrap();
        assert!(mgr.zdd_eval(&f, &[true, false, true]).unwrap());
        assert!(mgr.zdd_eval(&f, &[false, false, false]).unwrap());
        assert!(!mgr.zdd_eval(&f, &[true, true, true]).unwrap());
        assert!(!mgr.zdd_eval(&f, &[true]).unwrap());
    }
}
