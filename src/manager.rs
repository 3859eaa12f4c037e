//! The diagram manager.
//!
//! A [`Manager`] owns one node table and one operation cache per diagram
//! kind, the variable orders of the two variable spaces, and the
//! bookkeeping for garbage collection, reordering and resource limits.
//! Every handle ([`Bdd`], [`Add`], [`Zdd`]) holds a shared pointer to the
//! manager context it belongs to, so several managers can coexist and
//! combining handles of different managers is detected.
//!
//! # Execution model
//!
//! A manager is single-threaded. Every public operation first checks the
//! mode flag: it must be [`Mode::Idle`], then it is set to [`Mode::Busy`] for
//! the duration of the recursion. Garbage collection and reordering run only
//! when the manager is idle again, after the result has been wrapped in a
//! handle. The one exception is the emergency collection triggered when a
//! node table is full; it reclaims only nodes that are neither referenced
//! nor pinned by the in-flight recursion.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::cache::{OpKey, OperationCache};
use crate::config::ManagerConfig;
use crate::error::{DdError, DdResult, Limit};
use crate::handle::{Add, Bdd, Diagram, DiagramKind, Zdd};
use crate::order::{GroupTree, VariableOrder};
use crate::reference::Ref;
use crate::table::{NodeTable, TableFull, ZDD_EMPTY};
use crate::types::{Kind, Level, Space, Var};

static NEXT_MANAGER_ID: AtomicUsize = AtomicUsize::new(1);

/// Number of recursive steps between two clock reads.
const CLOCK_STRIDE: u32 = 64;

/// What the manager is doing right now.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    Idle,
    Busy,
    Collecting,
    Reordering,
}

/// Node table and operation cache of one diagram kind.
pub(crate) struct Forest {
    pub(crate) table: RefCell<NodeTable>,
    pub(crate) cache: RefCell<OperationCache>,
}

impl Forest {
    fn new(kind: Kind, config: &ManagerConfig) -> Self {
        Self {
            table: RefCell::new(NodeTable::new(kind, config.bucket_bits, config.max_slots())),
            cache: RefCell::new(OperationCache::new(config.cache_bits)),
        }
    }
}

/// Per-space state: order, groups, names and the auto-reorder trigger.
pub(crate) struct SpaceState {
    pub(crate) order: RefCell<VariableOrder>,
    pub(crate) groups: RefCell<GroupTree>,
    pub(crate) names: RefCell<Vec<Option<String>>>,
    pub(crate) next_reorder: Cell<usize>,
    pub(crate) auto_reorderings: Cell<usize>,
}

impl SpaceState {
    fn new(threshold: usize) -> Self {
        Self {
            order: RefCell::new(VariableOrder::default()),
            groups: RefCell::new(GroupTree::default()),
            names: RefCell::new(Vec::new()),
            next_reorder: Cell::new(threshold),
            auto_reorderings: Cell::new(0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Counters {
    pub(crate) collections: usize,
    pub(crate) reclaimed: usize,
    pub(crate) reorderings: usize,
    pub(crate) swaps: usize,
}

/// The shared manager context every handle points to.
pub(crate) struct Core {
    pub(crate) id: usize,
    pub(crate) config: RefCell<ManagerConfig>,
    mode: Cell<Mode>,
    destroyed: Cell<bool>,
    bdd: Forest,
    add: Forest,
    zdd: Forest,
    bdd_space: SpaceState,
    zdd_space: SpaceState,
    start: Instant,
    deadline: Cell<Option<Instant>>,
    steps: Cell<u32>,
    pub(crate) counters: RefCell<Counters>,
    /// Bumped whenever node contents change meaning (reordering, destroy).
    pub(crate) epoch: Cell<u64>,
    pub(crate) background: Cell<Ref>,
    pub(crate) zdd_multiplicity: Cell<Option<usize>>,
}

/// Marks the manager busy for the lifetime of a public call.
pub(crate) struct OpGuard<'a> {
    core: &'a Core,
    previous: Mode,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.core.mode.set(self.previous);
    }
}

impl Core {
    fn new(config: ManagerConfig) -> Self {
        let now = Instant::now();
        let core = Self {
            id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
            mode: Cell::new(Mode::Idle),
            destroyed: Cell::new(false),
            bdd: Forest::new(Kind::Bdd, &config),
            add: Forest::new(Kind::Add, &config),
            zdd: Forest::new(Kind::Zdd, &config),
            bdd_space: SpaceState::new(config.reorder_threshold),
            zdd_space: SpaceState::new(config.reorder_threshold),
            start: now,
            deadline: Cell::new(config.time_limit.map(|t| now + t)),
            steps: Cell::new(0),
            counters: RefCell::new(Counters::default()),
            epoch: Cell::new(0),
            background: Cell::new(crate::table::ADD_ZERO),
            zdd_multiplicity: Cell::new(None),
            config: RefCell::new(config),
        };
        let (n, nz) = {
            let config = core.config.borrow();
            (config.num_vars, config.num_zdd_vars)
        };
        let limit = Var::MAX_INDEX as usize + 1;
        if n > limit || nz > limit {
            warn!("Variable counts {}/{} clamped to {}", n, nz, limit);
        }
        let (n, nz) = (n.min(limit), nz.min(limit));
        for _ in 0..n {
            core.push_var(Space::Bdd);
        }
        for _ in 0..nz {
            core.push_var(Space::Zdd);
        }
        core
    }

    #[inline]
    pub(crate) fn forest(&self, kind: Kind) -> &Forest {
        match kind {
            Kind::Bdd => &self.bdd,
            Kind::Add => &self.add,
            Kind::Zdd => &self.zdd,
        }
    }

    #[inline]
    pub(crate) fn space(&self, space: Space) -> &SpaceState {
        match space {
            Space::Bdd => &self.bdd_space,
            Space::Zdd => &self.zdd_space,
        }
    }

    pub(crate) fn mode(&self) -> Mode {
        self.mode.get()
    }

    pub(crate) fn set_mode(&self, mode: Mode) -> OpGuard<'_> {
        let previous = self.mode.replace(mode);
        OpGuard { core: self, previous }
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Entry check of every public operation.
    pub(crate) fn enter(&self) -> DdResult<OpGuard<'_>> {
        if self.destroyed.get() {
            return Err(DdError::invalid("manager has been destroyed"));
        }
        if self.mode.get() != Mode::Idle {
            return Err(DdError::invalid(format!("manager is busy ({:?})", self.mode.get())));
        }
        self.check_deadline()?;
        Ok(self.set_mode(Mode::Busy))
    }

    fn check_deadline(&self) -> DdResult<()> {
        match self.deadline.get() {
            Some(deadline) if Instant::now() >= deadline => Err(DdError::ResourceLimitExceeded(Limit::Time)),
            _ => Ok(()),
        }
    }

    /// Safe point inside recursions and reordering passes.
    #[inline]
    pub(crate) fn check_limits(&self) -> DdResult<()> {
        let steps = self.steps.get().wrapping_add(1);
        self.steps.set(steps);
        if steps % CLOCK_STRIDE == 0 {
            self.check_deadline()?;
        }
        Ok(())
    }

    pub(crate) fn set_deadline(&self, deadline: Option<Instant>) {
        self.deadline.set(deadline);
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline.get()
    }

    // ------------------------------------------------------------------
    // Variables and levels

    pub(crate) fn num_vars(&self, space: Space) -> usize {
        self.space(space).order.borrow().len()
    }

    /// Appends a variable at the bottom level of `space`.
    pub(crate) fn push_var(&self, space: Space) -> Var {
        let var = self.space(space).order.borrow_mut().push();
        self.register_var(space, var);
        var
    }

    pub(crate) fn insert_var(&self, space: Space, level: Level) -> Var {
        let var = self.space(space).order.borrow_mut().insert(level);
        self.register_var(space, var);
        var
    }

    fn register_var(&self, space: Space, var: Var) {
        for &kind in space.kinds() {
            self.forest(kind).table.borrow_mut().ensure_var(var);
        }
        self.space(space).names.borrow_mut().push(None);
    }

    /// Creates variables until `var` exists. Indices above
    /// [`Var::MAX_INDEX`] are rejected before anything is created.
    pub(crate) fn ensure_var(&self, space: Space, var: Var) -> DdResult<()> {
        if var.index() > Var::MAX_INDEX {
            return Err(DdError::invalid(format!(
                "variable index {} exceeds the maximum {}",
                var.index(),
                Var::MAX_INDEX
            )));
        }
        while self.num_vars(space) <= var.as_usize() {
            self.push_var(space);
        }
        Ok(())
    }

    /// Fails if `space` cannot take another variable.
    pub(crate) fn check_room(&self, space: Space) -> DdResult<()> {
        if self.num_vars(space) > Var::MAX_INDEX as usize {
            return Err(DdError::invalid(format!(
                "{:?} space already holds the maximum of {} variables",
                space,
                Var::MAX_INDEX as usize + 1
            )));
        }
        Ok(())
    }

    pub(crate) fn check_var(&self, space: Space, var: Var) -> DdResult<()> {
        if var.as_usize() < self.num_vars(space) {
            Ok(())
        } else {
            Err(DdError::invalid(format!("variable {} does not exist", var)))
        }
    }

    #[inline]
    pub(crate) fn var_level(&self, space: Space, var: Var) -> Level {
        if var.is_terminal() {
            Level::TERMINAL
        } else {
            self.space(space).order.borrow().level(var)
        }
    }

    #[inline]
    pub(crate) fn var_at(&self, space: Space, level: Level) -> Var {
        self.space(space).order.borrow().var_at(level)
    }

    #[inline]
    pub(crate) fn var_of(&self, kind: Kind, r: Ref) -> Var {
        self.forest(kind).table.borrow().var(r)
    }

    /// Level of the top variable of `r`, or [`Level::TERMINAL`].
    #[inline]
    pub(crate) fn level(&self, kind: Kind, r: Ref) -> Level {
        let var = self.var_of(kind, r);
        self.var_level(kind.space(), var)
    }

    #[inline]
    pub(crate) fn is_terminal(&self, kind: Kind, r: Ref) -> bool {
        self.forest(kind).table.borrow().is_terminal(r)
    }

    /// Then- and else-children of `r`, with complements pushed down.
    #[inline]
    pub(crate) fn children(&self, kind: Kind, r: Ref) -> (Ref, Ref) {
        let table = self.forest(kind).table.borrow();
        (table.high(r), table.low(r))
    }

    /// Cofactors of `r` with respect to the variable at `level`.
    ///
    /// Nodes below `level` do not depend on that variable. For ZDDs a
    /// skipped variable means "absent", so the positive cofactor is empty.
    #[inline]
    pub(crate) fn cofactors(&self, kind: Kind, r: Ref, level: Level) -> (Ref, Ref) {
        if self.level(kind, r) == level {
            self.children(kind, r)
        } else if kind == Kind::Zdd {
            (ZDD_EMPTY, r)
        } else {
            (r, r)
        }
    }

    pub(crate) fn leaf_value(&self, r: Ref) -> Option<f64> {
        self.add.table.borrow().value(r)
    }

    // ------------------------------------------------------------------
    // Node creation

    /// Returns the canonical node `(var, high, low)` of `kind`.
    ///
    /// Children must be held alive by the caller (referenced or pinned).
    pub(crate) fn unique(&self, kind: Kind, var: Var, high: Ref, low: Ref) -> DdResult<Ref> {
        let (high, low, negated) = match kind {
            Kind::Bdd | Kind::Add if high == low => return Ok(high),
            Kind::Zdd if high == ZDD_EMPTY => return Ok(low),
            Kind::Bdd if high.is_negated() => (-high, -low, true),
            _ => (high, low, false),
        };
        debug_assert!(self.level(kind, high) > self.var_level(kind.space(), var));
        debug_assert!(self.level(kind, low) > self.var_level(kind.space(), var));

        let forest = self.forest(kind);
        if let Some(r) = forest.table.borrow().find(var, high, low) {
            return Ok(r.negate_if(negated));
        }
        // Swaps must not fail halfway, so reordering ignores both ceilings.
        let bounded = self.mode.get() != Mode::Reordering;
        if bounded {
            self.check_node_ceiling()?;
        }
        let made = forest.table.borrow_mut().make(var, high, low, bounded);
        let r = match made {
            Ok(r) => r,
            Err(TableFull) => {
                self.emergency_collect();
                let retry = forest.table.borrow_mut().make(var, high, low, true);
                retry.map_err(|_| self.out_of_memory(kind))?
            }
        };
        Ok(r.negate_if(negated))
    }

    /// Returns the ADD leaf holding `value`.
    pub(crate) fn constant(&self, value: f64) -> DdResult<Ref> {
        if value.is_nan() {
            return Err(DdError::invalid("NaN is not a valid leaf value"));
        }
        let made = self.add.table.borrow_mut().constant(value, true);
        match made {
            Ok(r) => Ok(r),
            Err(TableFull) => {
                self.emergency_collect();
                let retry = self.add.table.borrow_mut().constant(value, true);
                retry.map_err(|_| self.out_of_memory(Kind::Add))
            }
        }
    }

    fn out_of_memory(&self, kind: Kind) -> DdError {
        DdError::OutOfMemory {
            nodes: self.forest(kind).table.borrow().arena_len(),
        }
    }

    fn check_node_ceiling(&self) -> DdResult<()> {
        let max = self.config.borrow().max_live_nodes;
        if let Some(max) = max {
            if self.live_nodes() >= max {
                return Err(DdError::ResourceLimitExceeded(Limit::Nodes(max)));
            }
        }
        Ok(())
    }

    /// Live nodes across all kinds.
    pub(crate) fn live_nodes(&self) -> usize {
        [Kind::Bdd, Kind::Add, Kind::Zdd]
            .iter()
            .map(|&k| self.forest(k).table.borrow().live_len())
            .sum()
    }

    /// Allocated internal nodes of a space, which is what reordering minimizes.
    pub(crate) fn space_size(&self, space: Space) -> usize {
        space
            .kinds()
            .iter()
            .map(|&k| self.forest(k).table.borrow().internal_len())
            .sum()
    }

    // ------------------------------------------------------------------
    // Operation cache

    #[inline]
    pub(crate) fn cache_get(&self, kind: Kind, key: &OpKey) -> Option<Ref> {
        self.forest(kind).cache.borrow().get(key)
    }

    #[inline]
    pub(crate) fn cache_put(&self, kind: Kind, key: OpKey, r: Ref) {
        self.forest(kind).cache.borrow_mut().insert(key, r);
    }

    pub(crate) fn invalidate_caches(&self) {
        for kind in [Kind::Bdd, Kind::Add, Kind::Zdd] {
            self.forest(kind).cache.borrow_mut().invalidate();
        }
    }

    // ------------------------------------------------------------------
    // Handles

    pub(crate) fn acquire(&self, kind: Kind, r: Ref) {
        if !self.destroyed.get() {
            self.forest(kind).table.borrow_mut().inc_ref(r.id());
        }
    }

    pub(crate) fn release(&self, kind: Kind, r: Ref) {
        if !self.destroyed.get() {
            self.forest(kind).table.borrow_mut().dec_ref(r.id());
        }
    }

    fn destroy(&self) {
        debug!("Destroying manager #{}", self.id);
        for kind in [Kind::Bdd, Kind::Add, Kind::Zdd] {
            self.forest(kind).table.borrow_mut().clear();
        }
        self.invalidate_caches();
        self.epoch.set(self.epoch.get() + 1);
        self.destroyed.set(true);
    }

    /// Runs automatic collection and reordering if they are due.
    pub(crate) fn maintain(&self) {
        if self.mode.get() != Mode::Idle || self.destroyed.get() {
            return;
        }
        self.maybe_collect();
        for space in [Space::Bdd, Space::Zdd] {
            if let Err(e) = self.maybe_reorder(space) {
                debug!("Automatic reordering of {:?} space aborted: {}", space, e);
            }
        }
    }
}

/// A decision diagram manager.
///
/// Cloning a `Manager` yields another reference to the same manager.
///
/// ```
/// use dd_rs::manager::Manager;
///
/// let mgr = Manager::new(3, 0, None);
/// let x0 = mgr.var(0).unwrap();
/// let x1 = mgr.var(1).unwrap();
/// let f = mgr.and(&x0, &x1).unwrap();
/// assert_eq!(f.size(), 3);
/// ```
#[derive(Clone)]
pub struct Manager {
    pub(crate) core: Rc<Core>,
}

impl Default for Manager {
    fn default() -> Self {
        Manager::with_config(ManagerConfig::default())
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("Manager")
            .field("id", &self.core.id)
            .field("vars", &self.num_vars())
            .field("zdd_vars", &self.num_zdd_vars())
            .field("bdd_nodes", &stats.bdd_nodes)
            .field("add_nodes", &stats.add_nodes)
            .field("zdd_nodes", &stats.zdd_nodes)
            .field("dead", &stats.dead_nodes)
            .finish()
    }
}

impl PartialEq for Manager {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

impl Eq for Manager {}

/// A snapshot of manager statistics.
#[derive(Debug, Clone, Default)]
pub struct ManagerStats {
    pub bdd_nodes: usize,
    pub add_nodes: usize,
    pub zdd_nodes: usize,
    pub dead_nodes: usize,
    pub peak_nodes: usize,
    pub collections: usize,
    pub reclaimed: usize,
    pub reorderings: usize,
    pub swaps: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_faults: usize,
    pub elapsed: Duration,
}

impl ManagerStats {
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

impl Manager {
    /// Creates a manager with `num_vars` BDD/ADD variables, `num_zdd_vars`
    /// ZDD variables and an optional memory limit in bytes.
    pub fn new(num_vars: usize, num_zdd_vars: usize, memory_limit: Option<usize>) -> Self {
        let mut config = ManagerConfig::default().with_vars(num_vars).with_zdd_vars(num_zdd_vars);
        config.memory_limit = memory_limit;
        Self::with_config(config)
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        let core = Core::new(config);
        debug!("Created manager #{}", core.id);
        Manager { core: Rc::new(core) }
    }

    /// Frees every node. Outstanding handles stay valid as values but every
    /// operation on them fails afterwards.
    pub fn destroy(self) {
        self.core.destroy();
    }

    pub fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    pub fn mode(&self) -> Mode {
        self.core.mode()
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> ManagerConfig {
        self.core.config.borrow().clone()
    }

    pub fn stats(&self) -> ManagerStats {
        let core = &self.core;
        let mut stats = ManagerStats {
            elapsed: core.start.elapsed(),
            ..Default::default()
        };
        for kind in [Kind::Bdd, Kind::Add, Kind::Zdd] {
            let forest = core.forest(kind);
            let table = forest.table.borrow();
            let live = table.live_len();
            match kind {
                Kind::Bdd => stats.bdd_nodes = live,
                Kind::Add => stats.add_nodes = live,
                Kind::Zdd => stats.zdd_nodes = live,
            }
            stats.dead_nodes += table.dead();
            stats.peak_nodes += table.peak();
            let cache = forest.cache.borrow();
            stats.cache_hits += cache.hits();
            stats.cache_misses += cache.misses();
            stats.cache_faults += cache.faults();
        }
        let counters = core.counters.borrow();
        stats.collections = counters.collections;
        stats.reclaimed = counters.reclaimed;
        stats.reorderings = counters.reorderings;
        stats.swaps = counters.swaps;
        stats
    }

    // ------------------------------------------------------------------
    // Resource limits

    /// Sets a time limit counted from now.
    pub fn set_time_limit(&self, limit: Duration) {
        self.core.set_deadline(Some(Instant::now() + limit));
    }

    /// Extends the current time limit, or starts one counted from now.
    pub fn increase_time_limit(&self, extra: Duration) {
        let base = self.core.deadline().unwrap_or_else(Instant::now);
        self.core.set_deadline(Some(base + extra));
    }

    pub fn unset_time_limit(&self) {
        self.core.set_deadline(None);
    }

    /// Remaining time before the limit, if one is set.
    pub fn time_limit(&self) -> Option<Duration> {
        self.core.deadline().map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_time_limited(&self) -> bool {
        self.core.deadline().is_some()
    }

    /// Time since the manager was created.
    pub fn elapsed(&self) -> Duration {
        self.core.start.elapsed()
    }

    pub fn set_node_limit(&self, max_live_nodes: Option<usize>) {
        self.core.config.borrow_mut().max_live_nodes = max_live_nodes;
    }

    /// Changes the memory limit (in bytes) for future allocations.
    pub fn set_memory_limit(&self, bytes: Option<usize>) {
        let slots = {
            let mut config = self.core.config.borrow_mut();
            config.memory_limit = bytes;
            config.max_slots()
        };
        for kind in [Kind::Bdd, Kind::Add, Kind::Zdd] {
            self.core.forest(kind).table.borrow_mut().set_max_slots(slots);
        }
    }

    pub fn set_gc_enabled(&self, enabled: bool) {
        self.core.config.borrow_mut().gc_enabled = enabled;
    }

    // ------------------------------------------------------------------
    // Variables

    /// Number of BDD/ADD variables.
    pub fn num_vars(&self) -> usize {
        self.core.num_vars(Space::Bdd)
    }

    /// Number of ZDD variables.
    pub fn num_zdd_vars(&self) -> usize {
        self.core.num_vars(Space::Zdd)
    }

    /// Creates a new variable with the next free index, placed at the
    /// bottom level, and returns its projection function.
    pub fn new_var(&self) -> DdResult<Bdd> {
        let _guard = self.core.enter()?;
        self.core.check_room(Space::Bdd)?;
        let var = self.core.push_var(Space::Bdd);
        drop(_guard);
        self.var(var.index())
    }

    /// Creates a new variable at `level`, shifting the levels below it.
    pub fn new_var_at_level(&self, level: Level) -> DdResult<Bdd> {
        let var = {
            let _guard = self.core.enter()?;
            self.core.check_room(Space::Bdd)?;
            let space = self.core.space(Space::Bdd);
            if level.index() > space.order.borrow().len() {
                return Err(DdError::invalid(format!("level {} is out of range", level)));
            }
            if space.groups.borrow().splits_at(&space.order.borrow(), level) {
                return Err(DdError::invalid(format!("a new variable at {} would split a group", level)));
            }
            self.core.insert_var(Space::Bdd, level)
        };
        self.var(var.index())
    }

    /// Creates a new named variable.
    pub fn new_named_var(&self, name: &str) -> DdResult<Bdd> {
        if self.var_by_name(name).is_some() {
            return Err(DdError::invalid(format!("variable name '{}' is already taken", name)));
        }
        let f = self.new_var()?;
        let var = Var::new((self.num_vars() - 1) as u32);
        self.set_var_name(var, name)?;
        Ok(f)
    }

    /// The projection function of variable `index`, creating variables
    /// `0..=index` as needed.
    pub fn var(&self, index: u32) -> DdResult<Bdd> {
        let var = Var::new(index);
        self.run(|core| {
            core.ensure_var(Space::Bdd, var)?;
            core.bdd_var(var)
        })
    }

    /// The complemented projection function of variable `index`.
    pub fn nvar(&self, index: u32) -> DdResult<Bdd> {
        Ok(!&self.var(index)?)
    }

    /// Variable currently at `level` of the BDD/ADD order.
    pub fn var_at_level(&self, level: Level) -> Option<Var> {
        let order = self.core.space(Space::Bdd).order.borrow();
        (level.index() < order.len()).then(|| order.var_at(level))
    }

    pub fn level_of(&self, var: Var) -> Option<Level> {
        let order = self.core.space(Space::Bdd).order.borrow();
        (var.as_usize() < order.len()).then(|| order.level(var))
    }

    pub fn zdd_level_of(&self, var: Var) -> Option<Level> {
        let order = self.core.space(Space::Zdd).order.borrow();
        (var.as_usize() < order.len()).then(|| order.level(var))
    }

    pub fn set_var_name(&self, var: Var, name: &str) -> DdResult<()> {
        self.core.check_var(Space::Bdd, var)?;
        self.core.space(Space::Bdd).names.borrow_mut()[var.as_usize()] = Some(name.to_string());
        Ok(())
    }

    pub fn var_name(&self, var: Var) -> Option<String> {
        self.core.space(Space::Bdd).names.borrow().get(var.as_usize()).cloned().flatten()
    }

    pub fn var_by_name(&self, name: &str) -> Option<Var> {
        let names = self.core.space(Space::Bdd).names.borrow();
        names.iter().position(|n| n.as_deref() == Some(name)).map(|i| Var::new(i as u32))
    }

    /// Map from variable to name for every named BDD variable.
    pub fn var_names(&self) -> HashMap<Var, String> {
        let names = self.core.space(Space::Bdd).names.borrow();
        names
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.clone().map(|n| (Var::new(i as u32), n)))
            .collect()
    }

    /// Creates a new ZDD variable at the bottom of the ZDD order.
    pub fn new_zdd_var(&self) -> DdResult<Var> {
        let _guard = self.core.enter()?;
        self.core.check_room(Space::Zdd)?;
        Ok(self.core.push_var(Space::Zdd))
    }

    pub fn set_zdd_var_name(&self, var: Var, name: &str) -> DdResult<()> {
        self.core.check_var(Space::Zdd, var)?;
        self.core.space(Space::Zdd).names.borrow_mut()[var.as_usize()] = Some(name.to_string());
        Ok(())
    }

    pub fn zdd_var_name(&self, var: Var) -> Option<String> {
        self.core.space(Space::Zdd).names.borrow().get(var.as_usize()).cloned().flatten()
    }

    // ------------------------------------------------------------------
    // Plumbing shared by the operation modules

    /// Returns the node of a handle after checking it belongs to this manager.
    pub(crate) fn check<K: DiagramKind>(&self, f: &Diagram<K>) -> DdResult<Ref> {
        if !Rc::ptr_eq(&self.core, &f.core) {
            return Err(DdError::CrossManager);
        }
        Ok(f.node)
    }

    /// Runs a node-producing operation and wraps the result in a handle.
    pub(crate) fn run<K: DiagramKind>(&self, op: impl FnOnce(&Core) -> DdResult<Ref>) -> DdResult<Diagram<K>> {
        let r = {
            let _guard = self.core.enter()?;
            op(&self.core)?
        };
        let handle = Diagram::from_raw(self.core.clone(), r);
        self.core.maintain();
        Ok(handle)
    }

    /// Runs an operation producing a plain value.
    pub(crate) fn query<T>(&self, op: impl FnOnce(&Core) -> DdResult<T>) -> DdResult<T> {
        let _guard = self.core.enter()?;
        op(&self.core)
    }

    pub(crate) fn wrap<K: DiagramKind>(&self, r: Ref) -> Diagram<K> {
        Diagram::from_raw(self.core.clone(), r)
    }

    // Handle constructors used across modules.

    pub(crate) fn bdd(&self, r: Ref) -> Bdd {
        self.wrap(r)
    }

    pub(crate) fn add(&self, r: Ref) -> Add {
        self.wrap(r)
    }

    pub(crate) fn zdd(&self, r: Ref) -> Zdd {
        self.wrap(r)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_new_manager() {
        let mgr = Manager::new(3, 2, None);
        assert_eq!(mgr.num_vars(), 3);
        assert_eq!(mgr.num_zdd_vars(), 2);
        assert_eq!(mgr.mode(), Mode::Idle);
        assert_eq!(mgr.level_of(Var::new(2)), Some(Level::new(2)));
        assert_eq!(mgr.level_of(Var::new(3)), None);
    }

    #[test]
    fn test_var_creates_missing_variables() {
        let mgr = Manager::default();
        let x5 = mgr.var(5).unwrap();
        assert_eq!(mgr.num_vars(), 6);
        assert_eq!(x5.top_var(), Some(Var::new(5)));
    }

    #[test]
    fn test_var_index_above_maximum_is_rejected() {
        let mgr = Manager::new(2, 1, None);
        for index in [Var::MAX_INDEX + 1, u32::MAX - 1, u32::MAX] {
            assert!(matches!(mgr.var(index), Err(DdError::InvalidArgument(_))));
            assert!(matches!(mgr.add_var(index), Err(DdError::InvalidArgument(_))));
            assert!(matches!(mgr.zdd_var(Var::new(index)), Err(DdError::InvalidArgument(_))));
            assert!(matches!(mgr.zdd_singleton(Var::new(index)), Err(DdError::InvalidArgument(_))));
        }
        assert_eq!(mgr.num_vars(), 2);
        assert_eq!(mgr.num_zdd_vars(), 1);
        assert_eq!(mgr.mode(), Mode::Idle);
        let x = mgr.var(1).unwrap();
        assert_eq!(x.top_var(), Some(Var::new(1)));
    }

    #[test]
    fn test_new_var_appends_at_bottom() {
        let mgr = Manager::new(2, 0, None);
        let x = mgr.new_var().unwrap();
        assert_eq!(x.top_var(), Some(Var::new(2)));
        assert_eq!(mgr.level_of(Var::new(2)), Some(Level::new(2)));
    }

    #[test]
    fn test_new_var_at_level() {
        let mgr = Manager::new(3, 0, None);
        let x1 = mgr.var(1).unwrap();
        let x2 = mgr.var(2).unwrap();
        let f = mgr.and(&x1, &x2).unwrap();

        let y = mgr.new_var_at_level(Level::new(0)).unwrap();
        assert_eq!(y.top_var(), Some(Var::new(3)));
        assert_eq!(mgr.level_of(Var::new(3)), Some(Level::new(0)));
        assert_eq!(mgr.level_of(Var::new(0)), Some(Level::new(1)));
        assert!(mgr.check_invariants().is_ok());
        assert_eq!(f.size(), 3);
    }

    #[test]
    fn test_named_variables() {
        let mgr = Manager::default();
        let a = mgr.new_named_var("a").unwrap();
        let b = mgr.new_named_var("b").unwrap();
        assert_ne!(a, b);
        assert_eq!(mgr.var_by_name("b"), Some(Var::new(1)));
        assert_eq!(mgr.var_name(Var::new(0)).as_deref(), Some("a"));
        assert!(mgr.new_named_var("a").is_err());
    }

    #[test]
    fn test_cross_manager_is_rejected() {
        let m1 = Manager::new(2, 0, None);
        let m2 = Manager::new(2, 0, None);
        let x = m1.var(0).unwrap();
        let y = m2.var(1).unwrap();
        assert_eq!(m1.and(&x, &y).unwrap_err(), DdError::CrossManager);
    }

    #[test]
    fn test_destroyed_manager_rejects_operations() {
        let mgr = Manager::new(2, 0, None);
        let x = mgr.var(0).unwrap();
        let other = mgr.clone();
        mgr.destroy();
        assert!(other.is_destroyed());
        assert!(matches!(other.not(&x), Err(DdError::InvalidArgument(_))));
        drop(x);
    }

    #[test]
    fn test_time_limit() {
        let mgr = Manager::new(4, 0, None);
        let x = mgr.var(0).unwrap();
        mgr.set_time_limit(Duration::ZERO);
        assert!(mgr.is_time_limited());
        assert_eq!(
            mgr.and(&x, &x).unwrap_err(),
            DdError::ResourceLimitExceeded(Limit::Time)
        );
        mgr.unset_time_limit();
        assert!(mgr.and(&x, &x).is_ok());
    }

    #[test]
    fn test_node_limit() {
        let mgr = Manager::new(8, 0, None);
        let vars: Vec<Bdd> = (0..8).map(|i| mgr.var(i).unwrap()).collect();
        mgr.set_node_limit(Some(mgr.stats().bdd_nodes + 2));

        let mut f = mgr.one();
        let mut failed = false;
        for (i, x) in vars.iter().enumerate() {
            let y = &vars[(i + 3) % 8];
            match mgr.xor(x, y).and_then(|g| mgr.or(&f, &g)) {
                Ok(g) => f = g,
                Err(e) => {
                    assert!(matches!(e, DdError::ResourceLimitExceeded(Limit::Nodes(_))));
                    failed = true;
                    break;
                }
            }
        }
        assert!(failed);

        // The manager stays usable once the ceiling is lifted.
        mgr.set_node_limit(None);
        assert!(mgr.and(&vars[0], &vars[1]).is_ok());
        assert!(mgr.check_invariants().is_ok());
    }

    #[test]
    fn test_stats() {
        let mgr = Manager::new(2, 0, None);
        let x = mgr.var(0).unwrap();
        let y = mgr.var(1).unwrap();
        let _f = mgr.and(&x, &y).unwrap();
        let stats = mgr.stats();
        assert_eq!(stats.bdd_nodes, 3);
        assert_eq!(stats.add_nodes, 0);
        assert!(stats.cache_misses > 0 || stats.cache_hits > 0);
    }
}
