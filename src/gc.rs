//! Reference management and garbage collection.
//!
//! Handles hold external references; parent edges hold the rest. Results
//! of an in-flight recursion are protected by a [`Pin`], which keeps a node
//! alive across an emergency collection until the result is either linked
//! under a parent or wrapped in a handle.

use log::{debug, info};

use crate::error::DdResult;
use crate::manager::{Core, Manager, Mode};
use crate::reference::Ref;
use crate::types::{Kind, Space};

/// Keeps one node alive for the duration of a scope.
pub(crate) struct Pin<'a> {
    core: &'a Core,
    kind: Kind,
    node: Ref,
}

impl Pin<'_> {
    #[inline]
    pub(crate) fn get(&self) -> Ref {
        self.node
    }
}

impl Drop for Pin<'_> {
    fn drop(&mut self) {
        self.core.forest(self.kind).table.borrow_mut().unpin(self.node.id());
    }
}

impl Core {
    /// Pins `node` until the returned guard is dropped.
    #[inline]
    pub(crate) fn pin(&self, kind: Kind, node: Ref) -> Pin<'_> {
        self.forest(kind).table.borrow_mut().pin(node.id());
        Pin { core: self, kind, node }
    }

    /// Frees every node with no references and no pins, in all tables.
    pub(crate) fn sweep_all(&self) -> usize {
        let mut freed = 0;
        for space in [Space::Bdd, Space::Zdd] {
            let levels = self.space(space).order.borrow().vars().to_vec();
            for &kind in space.kinds() {
                freed += self.forest(kind).table.borrow_mut().sweep(&levels);
            }
        }
        // Freed slots may be reused, so no cached identity survives.
        self.invalidate_caches();
        let mut counters = self.counters.borrow_mut();
        counters.collections += 1;
        counters.reclaimed += freed;
        freed
    }

    /// A full collection between top-level calls.
    pub(crate) fn collect(&self) -> usize {
        let _mode = self.set_mode(Mode::Collecting);
        let before = self.live_nodes();
        let freed = self.sweep_all();
        if self.config.borrow().report_gc {
            info!("Garbage collection: freed {} nodes, {} live", freed, before);
        } else {
            debug!("Garbage collection: freed {} nodes, {} live", freed, before);
        }
        freed
    }

    /// Collection triggered by a full table in the middle of a recursion.
    ///
    /// Pinned nodes and everything reachable from them survive.
    pub(crate) fn emergency_collect(&self) -> usize {
        let freed = self.sweep_all();
        debug!("Emergency garbage collection: freed {} nodes", freed);
        freed
    }

    pub(crate) fn dead_nodes(&self) -> usize {
        [Kind::Bdd, Kind::Add, Kind::Zdd]
            .iter()
            .map(|&k| self.forest(k).table.borrow().dead())
            .sum()
    }

    /// Runs a collection if enough nodes are dead.
    pub(crate) fn maybe_collect(&self) {
        let (enabled, ratio, min_dead) = {
            let config = self.config.borrow();
            (config.gc_enabled, config.gc_dead_ratio, config.gc_min_dead)
        };
        if !enabled {
            return;
        }
        let dead = self.dead_nodes();
        let live = self.live_nodes();
        if dead >= min_dead && dead as f64 > ratio * live as f64 {
            self.collect();
        }
    }
}

impl Manager {
    /// Reclaims every unreferenced node and returns how many were freed.
    pub fn collect_garbage(&self) -> DdResult<usize> {
        let _guard = self.core.enter()?;
        Ok(self.core.collect())
    }

    /// Number of nodes with a zero reference count, across all kinds.
    pub fn dead_nodes(&self) -> usize {
        self.core.dead_nodes()
    }

    /// Number of nodes with a positive reference count, across all kinds.
    pub fn live_nodes(&self) -> usize {
        self.core.live_nodes()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use crate::config::ManagerConfig;
    use crate::manager::Manager;

    #[test]
    fn test_dropped_results_become_dead() {
        let mgr = Manager::with_config(ManagerConfig::default().with_vars(3).with_gc(false));
        let x = mgr.var(0).unwrap();
        let y = mgr.var(1).unwrap();
        let f = mgr.and(&x, &y).unwrap();
        assert_eq!(mgr.dead_nodes(), 0);
        drop(f);
        assert_eq!(mgr.dead_nodes(), 1);
        assert_eq!(mgr.collect_garbage().unwrap(), 1);
        assert_eq!(mgr.dead_nodes(), 0);
    }

    #[test]
    fn test_dead_nodes_are_resurrected() {
        let mgr = Manager::with_config(ManagerConfig::default().with_vars(2).with_gc(false));
        let x = mgr.var(0).unwrap();
        let y = mgr.var(1).unwrap();
        let f = mgr.or(&x, &y).unwrap();
        let id = f.node();
        drop(f);
        let g = mgr.or(&y, &x).unwrap();
        assert_eq!(g.node(), id);
        assert_eq!(mgr.dead_nodes(), 0);
    }

    #[test]
    fn test_collection_keeps_referenced_nodes() {
        let mgr = Manager::with_config(ManagerConfig::default().with_vars(4).with_gc(false));
        let vars: Vec<_> = (0..4).map(|i| mgr.var(i).unwrap()).collect();
        let f = mgr.xor(&vars[0], &vars[1]).unwrap();
        let g = mgr.and(&f, &vars[2]).unwrap();
        let h = mgr.or(&g, &vars[3]).unwrap();
        let size = h.size();
        drop(g);
        mgr.collect_garbage().unwrap();
        assert!(mgr.check_invariants().is_ok());
        assert_eq!(h.size(), size);
        let again = mgr.or(&mgr.and(&f, &vars[2]).unwrap(), &vars[3]).unwrap();
        assert_eq!(again, h);
    }

    #[test]
    fn test_emergency_collection_under_memory_limit() {
        // Room for a handful of nodes per table only.
        let config = ManagerConfig::default()
            .with_vars(12)
            .with_memory_limit(16 * 3 * std::mem::size_of::<crate::node::Node>());
        let mgr = Manager::with_config(config);
        for round in 0..20 {
            let i = round % 11;
            let x = mgr.var(i).unwrap();
            let y = mgr.var(i + 1).unwrap();
            let f = mgr.xor(&x, &y).unwrap();
            assert_eq!(f.size(), 3);
        }
        assert!(mgr.stats().collections > 0);
        assert!(mgr.check_invariants().is_ok());
    }

    #[test]
    fn test_out_of_memory_leaves_manager_usable() {
        let config = ManagerConfig::default()
            .with_vars(16)
            .with_memory_limit(8 * 3 * std::mem::size_of::<crate::node::Node>());
        let mgr = Manager::with_config(config);
        let vars: Vec<_> = (0..16).map(|i| mgr.var(i).ok()).collect();
        let err = vars.iter().position(|v| v.is_none());
        assert!(err.is_some());
        let result = mgr.var(15);
        assert!(matches!(result, Err(crate::error::DdError::OutOfMemory { .. })));
        drop(vars);
        mgr.collect_garbage().unwrap();
        assert!(mgr.var(15).is_ok());
        assert!(mgr.check_invariants().is_ok());
    }
}
