//! Debug utilities for inspecting diagram structure.
//!
//! [`Manager::check_invariants`] walks every node table and verifies the
//! structural properties all algorithms rely on. The remaining helpers are
//! mostly useful in tests and during development.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use crate::error::{DdError, DdResult};
use crate::handle::{reachable, Diagram, DiagramKind};
use crate::manager::{Core, Manager};
use crate::reference::Ref;
use crate::table::ZDD_EMPTY;
use crate::types::{Kind, Level, NodeId, Space, Var};

/// Detailed information about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// The reference to this node
    pub node_ref: Ref,
    /// Variable at this node (None for terminals)
    pub variable: Option<Var>,
    /// Level of the variable in the current order (None for terminals)
    pub level: Option<Level>,
    /// Then-child, complement pushed down
    pub high: Option<Ref>,
    /// Else-child, complement pushed down
    pub low: Option<Ref>,
    /// Leaf value of an ADD terminal
    pub value: Option<f64>,
    /// Reference count of the underlying node
    pub refs: u32,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.variable, self.value) {
            (None, Some(value)) => write!(f, "{}(leaf {})", self.node_ref, value),
            (None, None) => write!(f, "{}(terminal)", self.node_ref),
            (Some(var), _) => write!(
                f,
                "{}(var={}, level={}, high={}, low={}, refs={})",
                self.node_ref,
                var,
                self.level.map_or("?".to_string(), |l| l.to_string()),
                self.high.map_or("?".to_string(), |r| r.to_string()),
                self.low.map_or("?".to_string(), |r| r.to_string()),
                self.refs,
            ),
        }
    }
}

fn violation(kind: Kind, msg: impl std::fmt::Display) -> DdError {
    DdError::Corrupted(format!("{} table: {}", kind, msg))
}

impl Core {
    fn node_info(&self, kind: Kind, r: Ref) -> NodeInfo {
        let table = self.forest(kind).table.borrow();
        let node = *table.node(r.id());
        if node.is_terminal() {
            return NodeInfo {
                node_ref: r,
                variable: None,
                level: None,
                high: None,
                low: None,
                value: table.value(r),
                refs: node.refs,
            };
        }
        NodeInfo {
            node_ref: r,
            variable: Some(node.var),
            level: Some(self.var_level(kind.space(), node.var)),
            high: Some(table.high(r)),
            low: Some(table.low(r)),
            value: None,
            refs: node.refs,
        }
    }

    fn check_space(&self, space: Space) -> DdResult<()> {
        let order = self.space(space).order.borrow();
        let expected: Vec<Var> = (0..order.len() as u32).map(Var::new).collect();
        if !order.is_permutation(&expected) {
            return Err(DdError::Corrupted(format!("{:?} order is not a permutation", space)));
        }
        if !self.space(space).groups.borrow().is_respected_by(&order) {
            return Err(DdError::Corrupted(format!("{:?} order splits a variable group", space)));
        }
        Ok(())
    }

    fn check_table(&self, kind: Kind) -> DdResult<()> {
        let table = self.forest(kind).table.borrow();
        let space = kind.space();
        let num_vars = self.num_vars(space);
        if table.num_vars() < num_vars {
            return Err(violation(kind, format!("{} subtables for {} variables", table.num_vars(), num_vars)));
        }

        let mut seen = HashSet::new();
        let mut parents: HashMap<NodeId, u32> = HashMap::new();
        let mut internal = 0;
        for index in 0..num_vars {
            let var = Var::new(index as u32);
            let level = self.var_level(space, var);
            for id in table.subtable(var).ids(table.nodes()) {
                internal += 1;
                let node = *table.node(id);
                if node.var != var {
                    return Err(violation(kind, format!("node {} of {} filed under {}", id, node.var, var)));
                }
                if !seen.insert((node.high, node.low, var)) {
                    return Err(violation(kind, format!("duplicate node {} = ({}, {}, {})", id, var, node.high, node.low)));
                }
                match kind {
                    Kind::Bdd if node.high.is_negated() => {
                        return Err(violation(kind, format!("complemented then-edge at {}", id)));
                    }
                    Kind::Bdd | Kind::Add if node.high == node.low => {
                        return Err(violation(kind, format!("redundant test at {}", id)));
                    }
                    Kind::Zdd if node.high == ZDD_EMPTY => {
                        return Err(violation(kind, format!("then-edge to the empty family at {}", id)));
                    }
                    _ => {}
                }
                for child in [node.high, node.low] {
                    let child_node = table.node(child.id());
                    if child_node.is_free() {
                        return Err(violation(kind, format!("node {} points to freed slot {}", id, child.id())));
                    }
                    if self.var_level(space, child_node.var) <= level {
                        return Err(violation(kind, format!("node {} at {} has child {} at or above it", id, level, child)));
                    }
                    *parents.entry(child.id()).or_default() += 1;
                }
            }
        }
        if internal != table.internal_len() {
            return Err(violation(kind, format!("{} nodes in subtables, {} counted", internal, table.internal_len())));
        }
        for (id, count) in parents {
            let node = table.node(id);
            if !node.is_permanent() && node.refs < count {
                return Err(violation(kind, format!("node {} has {} references but {} parents", id, node.refs, count)));
            }
        }
        Ok(())
    }

    pub(crate) fn check_invariants(&self) -> DdResult<()> {
        for space in [Space::Bdd, Space::Zdd] {
            self.check_space(space)?;
        }
        for kind in [Kind::Bdd, Kind::Add, Kind::Zdd] {
            self.check_table(kind)?;
        }
        Ok(())
    }
}

impl Manager {
    /// Verifies the node tables and variable orders: every node is
    /// canonical for its kind, sits above its children in the current order
    /// and holds at least one reference per parent; orders are permutations
    /// that keep every group contiguous.
    ///
    /// Returns [`DdError::Corrupted`] describing the first violation.
    pub fn check_invariants(&self) -> DdResult<()> {
        self.query(|core| core.check_invariants())
    }

    /// Detailed information about the root node of `f`.
    pub fn node_info<K: DiagramKind>(&self, f: &Diagram<K>) -> DdResult<NodeInfo> {
        let r = self.check(f)?;
        self.query(|core| Ok(core.node_info(K::KIND, r)))
    }

    /// One line per node reachable from `f`, top level first.
    pub fn debug_string<K: DiagramKind>(&self, f: &Diagram<K>) -> DdResult<String> {
        let r = self.check(f)?;
        self.query(|core| {
            let mut infos: Vec<NodeInfo> = reachable(core, K::KIND, [r])
                .into_iter()
                .map(|id| core.node_info(K::KIND, Ref::positive(id)))
                .collect();
            infos.sort_by_key(|info| (info.level.unwrap_or(Level::TERMINAL), info.node_ref.id()));
            let mut out = String::new();
            let _ = writeln!(out, "{} rooted at {}:", K::KIND, r);
            for info in infos {
                let _ = writeln!(out, "  {}", info);
            }
            Ok(out)
        })
    }

    /// The BDD variable order, one `level: var` entry per line.
    pub fn debug_ordering(&self) -> String {
        let mut out = String::new();
        for (level, var) in self.order().into_iter().enumerate() {
            let _ = writeln!(out, "{}: {}", level, var);
        }
        out
    }
}
