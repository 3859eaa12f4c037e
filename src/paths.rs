//! Lazy enumeration of cubes, minterms and ZDD sets.
//!
//! Each iterator walks the diagram depth-first, then-branch first, keeping an
//! explicit stack so that it can stop between items and be resumed later.
//! Iterators own a handle to their root, so the root stays alive while they
//! exist, and can be rewound with `restart`.
//!
//! Reordering rewrites nodes in place. An iterator remembers the manager's
//! epoch when it was created (or last restarted); once the epoch moves on, it
//! yields nothing more and reports [`is_interrupted`](Cubes::is_interrupted).
//!
//! # Examples
//!
//! ```
//! use dd_rs::manager::Manager;
//!
//! let mgr = Manager::new(3, 0, None);
//! let x0 = mgr.var(0).unwrap();
//! let x2 = mgr.var(2).unwrap();
//! let f = mgr.or(&x0, &x2).unwrap();
//!
//! // One cube per path to `true`.
//! let cubes: Vec<_> = mgr.cubes(&f).unwrap().collect();
//! assert_eq!(cubes.len(), 2);
//! ```

use log::debug;

use crate::error::{DdError, DdResult};
use crate::handle::{Bdd, DiagramKind, Diagram, Zdd};
use crate::manager::Manager;
use crate::reference::Ref;
use crate::table::{BDD_ONE, BDD_ZERO, ZDD_BASE, ZDD_EMPTY};
use crate::types::{Lit, Var};

/// Which branch to explore next.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Branch {
    High,
    Low,
}

/// Stack frame for the iterative traversal.
#[derive(Debug, Copy, Clone)]
struct StackFrame {
    node: Ref,
    next_branch: Option<Branch>,
}

/// Depth-first walk over the paths of a diagram that end in `accept`.
///
/// Invariant: `path` holds one literal per edge taken, so it is one shorter
/// than `stack` while a walk is in progress.
struct Walk<K: DiagramKind> {
    root: Diagram<K>,
    accept: Ref,
    reject: Ref,
    epoch: u64,
    interrupted: bool,
    stack: Vec<StackFrame>,
    path: Vec<Lit>,
}

impl<K: DiagramKind> Walk<K> {
    fn new(root: Diagram<K>, accept: Ref, reject: Ref) -> Self {
        let epoch = root.core.epoch.get();
        let mut walk = Walk {
            root,
            accept,
            reject,
            epoch,
            interrupted: false,
            stack: Vec::new(),
            path: Vec::new(),
        };
        walk.restart();
        walk
    }

    fn restart(&mut self) {
        self.epoch = self.root.core.epoch.get();
        self.interrupted = false;
        self.path.clear();
        self.stack.clear();
        self.stack.push(StackFrame {
            node: self.root.node,
            next_branch: Some(Branch::High),
        });
    }

    fn backtrack(&mut self) {
        self.stack.pop();
        self.path.pop();
    }

    fn next_path(&mut self) -> Option<Vec<Lit>> {
        if self.stack.is_empty() {
            return None;
        }
        let core = self.root.core.clone();
        if core.is_destroyed() || core.epoch.get() != self.epoch {
            debug!("path enumeration interrupted after {} levels", self.path.len());
            self.interrupted = true;
            self.stack.clear();
            self.path.clear();
            return None;
        }
        let kind = K::KIND;
        loop {
            let frame = self.stack.last_mut()?;
            let node = frame.node;

            if node == self.accept {
                let result = self.path.clone();
                self.backtrack();
                return Some(result);
            }
            if node == self.reject || core.is_terminal(kind, node) {
                self.backtrack();
                continue;
            }

            let var = core.var_of(kind, node);
            match frame.next_branch {
                Some(Branch::High) => {
                    frame.next_branch = Some(Branch::Low);
                    let (high, _) = core.children(kind, node);
                    self.path.push(var.pos());
                    self.stack.push(StackFrame {
                        node: high,
                        next_branch: Some(Branch::High),
                    });
                }
                Some(Branch::Low) => {
                    frame.next_branch = None;
                    let (_, low) = core.children(kind, node);
                    self.path.push(var.neg());
                    self.stack.push(StackFrame {
                        node: low,
                        next_branch: Some(Branch::High),
                    });
                }
                None => self.backtrack(),
            }
        }
    }
}

/// Iterator over the cubes of a BDD: one list of literals per path from the
/// root to `true`, top-down. Variables not on a path are don't-cares.
pub struct Cubes {
    walk: Walk<crate::handle::BddKind>,
}

impl Cubes {
    /// Whether enumeration stopped early because the diagram was reordered
    /// or the manager destroyed.
    pub fn is_interrupted(&self) -> bool {
        self.walk.interrupted
    }

    /// Starts over from the first cube.
    pub fn restart(&mut self) {
        self.walk.restart();
    }
}

impl Iterator for Cubes {
    type Item = Vec<Lit>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walk.next_path()
    }
}

/// Iterator over the full assignments to a fixed list of variables that
/// satisfy a BDD. Each item lists one literal per variable, in the order the
/// variables were given.
pub struct Minterms {
    cubes: Cubes,
    vars: Vec<Var>,
    /// Values fixed by the current cube, `None` for don't-cares.
    fixed: Vec<Option<bool>>,
    /// Odometer over the don't-care positions of `fixed`.
    free: Vec<usize>,
    counter: Vec<bool>,
    exhausted: bool,
}

impl Minterms {
    pub fn is_interrupted(&self) -> bool {
        self.cubes.is_interrupted()
    }

    pub fn restart(&mut self) {
        self.cubes.restart();
        self.fixed.clear();
        self.free.clear();
        self.counter.clear();
        self.exhausted = true;
    }

    fn load(&mut self, cube: &[Lit]) {
        self.fixed = self
            .vars
            .iter()
            .map(|&v| cube.iter().find(|l| l.var() == v).map(|l| l.is_positive()))
            .collect();
        self.free = (0..self.vars.len()).filter(|&i| self.fixed[i].is_none()).collect();
        self.counter = vec![false; self.free.len()];
        self.exhausted = false;
    }

    fn current(&self) -> Vec<Lit> {
        let mut values = self.fixed.clone();
        for (&pos, &bit) in self.free.iter().zip(&self.counter) {
            values[pos] = Some(bit);
        }
        self.vars
            .iter()
            .zip(values)
            .map(|(&v, b)| if b == Some(true) { v.pos() } else { v.neg() })
            .collect()
    }

    /// Advances the odometer; returns false once it wraps around.
    fn advance(&mut self) -> bool {
        for bit in self.counter.iter_mut().rev() {
            if *bit {
                *bit = false;
            } else {
                *bit = true;
                return true;
            }
        }
        false
    }
}

impl Iterator for Minterms {
    type Item = Vec<Lit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            let cube = self.cubes.next()?;
            self.load(&cube);
        }
        let minterm = self.current();
        if !self.advance() {
            self.exhausted = true;
        }
        Some(minterm)
    }
}

/// Iterator over the sets of a ZDD family, each listing its variables in
/// top-down order.
pub struct ZddSets {
    walk: Walk<crate::handle::ZddKind>,
}

impl ZddSets {
    pub fn is_interrupted(&self) -> bool {
        self.walk.interrupted
    }

    pub fn restart(&mut self) {
        self.walk.restart();
    }
}

impl Iterator for ZddSets {
    type Item = Vec<Var>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.walk.next_path()?;
        Some(path.into_iter().filter(|l| l.is_positive()).map(|l| l.var()).collect())
    }
}

impl Manager {
    /// Lazily enumerates the cubes of `f`.
    pub fn cubes(&self, f: &Bdd) -> DdResult<Cubes> {
        self.check(f)?;
        let _guard = self.core.enter()?;
        Ok(Cubes {
            walk: Walk::new(f.clone(), BDD_ONE, BDD_ZERO),
        })
    }

    /// Lazily enumerates the satisfying assignments of `f` to `vars`, which
    /// must cover the support of `f`.
    ///
    /// ```
    /// use dd_rs::manager::Manager;
    /// use dd_rs::types::Var;
    ///
    /// let mgr = Manager::new(2, 0, None);
    /// let f = mgr.var(0).unwrap();
    /// let all: Vec<_> = mgr.minterms(&f, &[Var::new(0), Var::new(1)]).unwrap().collect();
    /// assert_eq!(all.len(), 2);
    /// ```
    pub fn minterms(&self, f: &Bdd, vars: &[Var]) -> DdResult<Minterms> {
        if let Some(v) = f.support().into_iter().find(|v| !vars.contains(v)) {
            return Err(DdError::invalid(format!("variable {} of the support is missing", v)));
        }
        let cubes = self.cubes(f)?;
        Ok(Minterms {
            cubes,
            vars: vars.to_vec(),
            fixed: Vec::new(),
            free: Vec::new(),
            counter: Vec::new(),
            exhausted: true,
        })
    }

    /// Lazily enumerates the sets of the family `f`.
    pub fn zdd_sets(&self, f: &Zdd) -> DdResult<ZddSets> {
        self.check(f)?;
        let _guard = self.core.enter()?;
        Ok(ZddSets {
            walk: Walk::new(f.clone(), ZDD_BASE, ZDD_EMPTY),
        })
    }
}
