//! Dynamic variable reordering.
//!
//! # Theory: Variable Ordering
//!
//! The size of a decision diagram is highly sensitive to the order in which
//! variables appear. For `f = (x₁ ∧ y₁) ∨ (x₂ ∧ y₂) ∨ ... ∨ (xₙ ∧ yₙ)` the
//! interleaved order `x₁, y₁, x₂, y₂, ...` needs O(n) nodes while the
//! separated order `x₁, ..., xₙ, y₁, ..., yₙ` needs O(2ⁿ). Finding the best
//! order is NP-complete, so the manager improves it by local moves.
//!
//! # The swap primitive
//!
//! Every heuristic is built on one operation: exchanging the variables at
//! two adjacent levels `i` (variable `x`) and `i + 1` (variable `y`). Only
//! the `x`-nodes that have a `y`-child change. Such a node `x ? f₁ : f₀` is
//! rewritten *in place* into `y ? (x ? f₁₁ : f₀₁) : (x ? f₁₀ : f₀₀)`, so its
//! id, and with it every handle and parent edge pointing at it, keeps
//! denoting the same function. `y`-nodes that lose their last parent are
//! freed right away, which keeps the node count an accurate cost measure.
//! The BDD/ADD space swaps in both tables at once.
//!
//! # Blocks and groups
//!
//! Variable groups move as units. At each level of the group tree the
//! heuristics see a sequence of *blocks* (a group, or an ungrouped
//! variable) and only ever transpose neighbouring blocks; afterwards they
//! recurse into the groups that are not [`GroupKind::Fixed`].
//!
//! # Heuristics
//!
//! - **Sifting** (Rudell): each block, in decreasing order of node usage,
//!   is moved through every position and left at the best one. A direction
//!   is abandoned once the size grows beyond `max_growth` times the best.
//! - **Window permutation**: all permutations of 2 or 3 consecutive blocks.
//! - **Random**: random block exchanges, kept only when they help.
//! - **Exact**: every permutation of the blocks by plain changes, for at
//!   most [`EXACT_MAX_BLOCKS`] blocks.
//! - **Genetic**: a population of block orders evolved by order crossover
//!   and mutation.
//!
//! # References
//!
//! - R. Rudell. "Dynamic variable ordering for ordered binary decision diagrams."
//!   ICCAD 1993. DOI: 10.1109/ICCAD.1993.580054
//!
//! - C. Meinel & T. Theobald. "Algorithms and Data Structures in VLSI Design."
//!   Springer, 1998. Chapter 4.

use std::time::{Duration, Instant};

use log::{debug, info, trace};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{DdError, DdResult};
use crate::manager::{Core, Manager, Mode};
use crate::order::{GroupKind, GroupNode, VarGroup, VariableOrder};
use crate::types::{Kind, Level, NodeId, Space, Var};

/// Largest number of blocks [`ReorderMethod::Exact`] accepts in one group.
pub const EXACT_MAX_BLOCKS: usize = 8;

/// Reordering heuristics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ReorderMethod {
    /// Rudell's sifting, one pass.
    Sift,
    /// Sifting repeated while it improves.
    SiftConverge,
    /// Window permutation of width 2, repeated while it improves.
    Window2,
    /// Window permutation of width 3, repeated while it improves.
    Window3,
    /// Random block exchanges, kept when they improve.
    Random,
    /// Exhaustive search, for small block counts.
    Exact,
    /// Genetic search over block orders.
    Genetic,
}

/// Statistics collected during one reordering pass.
#[derive(Debug, Clone)]
pub struct ReorderStats {
    pub method: ReorderMethod,
    /// Number of adjacent level swaps performed.
    pub swaps: usize,
    /// Internal nodes of the space before the pass.
    pub initial_size: usize,
    /// Internal nodes of the space after the pass.
    pub final_size: usize,
    pub elapsed: Duration,
}

impl ReorderStats {
    /// Calculate the size reduction ratio.
    pub fn reduction_ratio(&self) -> f64 {
        if self.initial_size == 0 {
            return 0.0;
        }
        1.0 - (self.final_size as f64 / self.initial_size as f64)
    }

    /// Calculate the percentage reduction.
    pub fn reduction_percent(&self) -> f64 {
        self.reduction_ratio() * 100.0
    }
}

/// The members of one group, or a single ungrouped variable.
#[derive(Debug, Clone)]
struct Block {
    vars: Vec<Var>,
}

impl Block {
    fn lead(&self) -> Var {
        self.vars[0]
    }

    fn len(&self) -> usize {
        self.vars.len()
    }
}

/// A run of blocks occupying the levels starting at `lo`, in level order.
struct Frame {
    space: Space,
    lo: usize,
    blocks: Vec<Block>,
}

impl Frame {
    fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Topmost level of the block at position `k`.
    fn top(&self, k: usize) -> Level {
        Level::new(self.lo + self.blocks[..k].iter().map(Block::len).sum::<usize>())
    }

    fn leads(&self) -> Vec<Var> {
        self.blocks.iter().map(Block::lead).collect()
    }

    fn position(&self, lead: Var) -> Option<usize> {
        self.blocks.iter().position(|b| b.lead() == lead)
    }
}

impl Core {
    // ------------------------------------------------------------------
    // Swap primitive

    /// Exchanges the variables at `level` and `level + 1` in every table of
    /// `space`.
    pub(crate) fn swap_level(&self, space: Space, level: Level) -> DdResult<()> {
        self.check_limits()?;
        let (x, y) = {
            let order = self.space(space).order.borrow();
            (order.var_at(level), order.var_at(level.next()))
        };
        trace!("Swapping {} and {} at level {}", x, y, level);
        for &kind in space.kinds() {
            self.swap_in_kind(kind, level, x, y)?;
        }
        self.space(space).order.borrow_mut().swap_adjacent(level);
        self.counters.borrow_mut().swaps += 1;
        Ok(())
    }

    fn swap_in_kind(&self, kind: Kind, level: Level, x: Var, y: Var) -> DdResult<()> {
        let forest = self.forest(kind);
        let affected: Vec<NodeId> = {
            let table = forest.table.borrow();
            let ids = table.subtable(x).ids(table.nodes());
            ids.into_iter()
                .filter(|&id| {
                    let node = table.node(id);
                    table.var(node.high) == y || table.var(node.low) == y
                })
                .collect()
        };

        let lower = level.next();
        for id in affected {
            let node = *forest.table.borrow().node(id);
            let (f11, f10) = self.cofactors(kind, node.high, lower);
            let (f01, f00) = self.cofactors(kind, node.low, lower);
            let g1 = self.unique(kind, x, f11, f01)?;
            let g0 = self.unique(kind, x, f10, f00)?;

            let mut table = forest.table.borrow_mut();
            table.unlink(id);
            table.inc_ref(g1.id());
            table.inc_ref(g0.id());
            table.dec_ref(node.high.id());
            table.dec_ref(node.low.id());
            table.relabel(id, y, g1, g0);
        }

        // Former children of rewritten nodes may have lost their last parent.
        let mut table = forest.table.borrow_mut();
        let orphans: Vec<NodeId> = {
            let ids = table.subtable(y).ids(table.nodes());
            ids.into_iter().filter(|&id| table.node(id).is_reclaimable()).collect()
        };
        let mut freed = 0;
        for id in orphans {
            freed += table.free_cascade(id);
        }
        drop(table);
        self.counters.borrow_mut().reclaimed += freed;
        Ok(())
    }

    /// Moves the `upper` levels starting at `top` below the `lower` levels
    /// that follow them, keeping both blocks' internal order.
    fn swap_blocks(&self, space: Space, top: Level, upper: usize, lower: usize) -> DdResult<()> {
        for k in 0..lower {
            let from = top.index() + upper + k;
            for l in (top.index() + k..from).rev() {
                self.swap_level(space, Level::new(l))?;
            }
        }
        Ok(())
    }

    /// Moves the variables of `space` into the order `vars`, top-down.
    pub(crate) fn shuffle(&self, space: Space, vars: &[Var]) -> DdResult<()> {
        for (target, &var) in vars.iter().enumerate() {
            let current = self.var_level(space, var).index();
            for l in (target..current).rev() {
                self.swap_level(space, Level::new(l))?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Frames of blocks

    fn blocks_in(&self, space: Space, lo: usize, hi: usize, groups: &[GroupNode]) -> Vec<Block> {
        let order = self.space(space).order.borrow();
        let mut blocks = Vec::new();
        let mut l = lo;
        while l < hi {
            let var = order.var_at(Level::new(l));
            match groups.iter().find(|g| g.members.contains(&var)) {
                Some(g) => {
                    blocks.push(Block {
                        vars: g.members.iter().copied().collect(),
                    });
                    l += g.size();
                }
                None => {
                    blocks.push(Block { vars: vec![var] });
                    l += 1;
                }
            }
        }
        blocks
    }

    /// Exchanges the blocks at positions `k` and `k + 1`.
    fn transpose(&self, frame: &mut Frame, k: usize) -> DdResult<()> {
        let top = frame.top(k);
        self.swap_blocks(frame.space, top, frame.blocks[k].len(), frame.blocks[k + 1].len())?;
        frame.blocks.swap(k, k + 1);
        Ok(())
    }

    /// Exchanges the blocks at positions `i < j`, leaving the others in place.
    fn exchange(&self, frame: &mut Frame, i: usize, j: usize) -> DdResult<()> {
        for k in i..j {
            self.transpose(frame, k)?;
        }
        for k in (i..j - 1).rev() {
            self.transpose(frame, k)?;
        }
        Ok(())
    }

    /// Rearranges the blocks of `frame` into the order of `leads`.
    fn arrange(&self, frame: &mut Frame, leads: &[Var]) -> DdResult<()> {
        for (target, &lead) in leads.iter().enumerate() {
            let Some(mut k) = frame.position(lead) else {
                continue;
            };
            while k > target {
                self.transpose(frame, k - 1)?;
                k -= 1;
            }
        }
        Ok(())
    }

    /// Nodes labelled with the variables of `block`, a proxy for its weight.
    fn block_usage(&self, space: Space, block: &Block) -> usize {
        space
            .kinds()
            .iter()
            .map(|&kind| {
                let table = self.forest(kind).table.borrow();
                block.vars.iter().map(|&v| table.subtable(v).len()).sum::<usize>()
            })
            .sum()
    }

    // ------------------------------------------------------------------
    // Heuristics

    fn sift(&self, frame: &mut Frame, max_growth: f64) -> DdResult<()> {
        let n = frame.len();
        if n < 2 {
            return Ok(());
        }
        let mut queue: Vec<(usize, Var)> = frame
            .blocks
            .iter()
            .map(|b| (self.block_usage(frame.space, b), b.lead()))
            .collect();
        queue.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, lead) in queue {
            let Some(mut pos) = frame.position(lead) else {
                continue;
            };
            let mut best_size = self.space_size(frame.space);
            let mut best_pos = pos;
            let start_size = best_size;

            while pos > 0 {
                self.transpose(frame, pos - 1)?;
                pos -= 1;
                let size = self.space_size(frame.space);
                if size < best_size {
                    best_size = size;
                    best_pos = pos;
                }
                if size as f64 > max_growth * best_size as f64 {
                    break;
                }
            }
            while pos + 1 < n {
                self.transpose(frame, pos)?;
                pos += 1;
                let size = self.space_size(frame.space);
                if size < best_size {
                    best_size = size;
                    best_pos = pos;
                }
                if size as f64 > max_growth * best_size as f64 && pos > best_pos {
                    break;
                }
            }
            while pos > best_pos {
                self.transpose(frame, pos - 1)?;
                pos -= 1;
            }
            while pos < best_pos {
                self.transpose(frame, pos)?;
                pos += 1;
            }
            debug!("Sifted block of {}: size {} -> {}", lead, start_size, best_size);
        }
        Ok(())
    }

    fn sift_converge(&self, frame: &mut Frame, max_growth: f64) -> DdResult<()> {
        loop {
            let before = self.space_size(frame.space);
            self.sift(frame, max_growth)?;
            if self.space_size(frame.space) >= before {
                return Ok(());
            }
        }
    }

    fn window(&self, frame: &mut Frame, width: usize) -> DdResult<()> {
        let n = frame.len();
        if n < 2 {
            return Ok(());
        }
        // Adjacent transpositions visiting every permutation of the window.
        let steps: &[usize] = if width >= 3 && n >= 3 { &[0, 1, 0, 1, 0] } else { &[0] };
        let width = if steps.len() > 1 { 3 } else { 2 };

        loop {
            let mut improved = false;
            for k in 0..=n - width {
                let start = self.space_size(frame.space);
                let mut best = (start, 0);
                for (s, &t) in steps.iter().enumerate() {
                    self.transpose(frame, k + t)?;
                    let size = self.space_size(frame.space);
                    if size < best.0 {
                        best = (size, s + 1);
                    }
                }
                for s in (best.1..steps.len()).rev() {
                    self.transpose(frame, k + steps[s])?;
                }
                improved |= best.0 < start;
            }
            if !improved {
                return Ok(());
            }
        }
    }

    fn random(&self, frame: &mut Frame, rng: &mut ChaCha8Rng) -> DdResult<()> {
        let n = frame.len();
        if n < 2 {
            return Ok(());
        }
        for _ in 0..2 * n {
            let a = rng.random_range(0..n);
            let b = rng.random_range(0..n);
            if a == b {
                continue;
            }
            let (i, j) = (a.min(b), a.max(b));
            let before = self.space_size(frame.space);
            self.exchange(frame, i, j)?;
            if self.space_size(frame.space) >= before {
                self.exchange(frame, i, j)?;
            }
        }
        Ok(())
    }

    /// Visits all permutations by plain changes (Steinhaus-Johnson-Trotter),
    /// one block transposition per step.
    fn exact(&self, frame: &mut Frame) -> DdResult<()> {
        let n = frame.len();
        if n < 2 {
            return Ok(());
        }
        if n > EXACT_MAX_BLOCKS {
            return Err(DdError::invalid(format!(
                "exact reordering supports at most {} blocks, got {}",
                EXACT_MAX_BLOCKS, n
            )));
        }
        let mut best = (self.space_size(frame.space), frame.leads());
        let mut perm: Vec<usize> = (0..n).collect();
        let mut dir: Vec<isize> = vec![-1; n];
        loop {
            let mut mobile: Option<usize> = None;
            for i in 0..n {
                let j = i as isize + dir[perm[i]];
                if j >= 0 && (j as usize) < n && perm[j as usize] < perm[i] && mobile.map_or(true, |m| perm[i] > perm[m]) {
                    mobile = Some(i);
                }
            }
            let Some(i) = mobile else {
                break;
            };
            let j = (i as isize + dir[perm[i]]) as usize;
            self.transpose(frame, i.min(j))?;
            perm.swap(i, j);
            let moved = perm[j];
            for e in moved + 1..n {
                dir[e] = -dir[e];
            }
            let size = self.space_size(frame.space);
            if size < best.0 {
                best = (size, frame.leads());
            }
        }
        self.arrange(frame, &best.1)
    }

    fn genetic(&self, frame: &mut Frame, rng: &mut ChaCha8Rng) -> DdResult<()> {
        let n = frame.len();
        if n < 2 {
            return Ok(());
        }
        let population_size = (2 * n).clamp(4, 20);
        let mut population = vec![(frame.leads(), self.space_size(frame.space))];
        while population.len() < population_size {
            let mut individual = frame.leads();
            individual.shuffle(rng);
            self.arrange(frame, &individual)?;
            population.push((individual, self.space_size(frame.space)));
        }

        for _ in 0..2 * population_size {
            let a = rng.random_range(0..population.len());
            let b = rng.random_range(0..population.len());
            let mut child = order_crossover(&population[a].0, &population[b].0, rng);
            if rng.random_bool(0.25) {
                let i = rng.random_range(0..n);
                let j = rng.random_range(0..n);
                child.swap(i, j);
            }
            self.arrange(frame, &child)?;
            let size = self.space_size(frame.space);
            let worst = (0..population.len()).max_by_key(|&k| population[k].1).unwrap_or(0);
            if size < population[worst].1 && !population.iter().any(|(p, _)| *p == child) {
                population[worst] = (child, size);
            }
        }

        let best = (0..population.len()).min_by_key(|&k| population[k].1).unwrap_or(0);
        let leads = population[best].0.clone();
        self.arrange(frame, &leads)
    }

    /// Applies `method` to the blocks of levels `lo..hi`, then recurses into
    /// the groups that may be reordered internally.
    fn reorder_frame(
        &self,
        space: Space,
        method: ReorderMethod,
        lo: usize,
        hi: usize,
        groups: &[GroupNode],
        rng: &mut ChaCha8Rng,
    ) -> DdResult<()> {
        let mut frame = Frame {
            space,
            lo,
            blocks: self.blocks_in(space, lo, hi, groups),
        };
        let max_growth = self.config.borrow().max_growth;
        match method {
            ReorderMethod::Sift => self.sift(&mut frame, max_growth)?,
            ReorderMethod::SiftConverge => self.sift_converge(&mut frame, max_growth)?,
            ReorderMethod::Window2 => self.window(&mut frame, 2)?,
            ReorderMethod::Window3 => self.window(&mut frame, 3)?,
            ReorderMethod::Random => self.random(&mut frame, rng)?,
            ReorderMethod::Exact => self.exact(&mut frame)?,
            ReorderMethod::Genetic => self.genetic(&mut frame, rng)?,
        }

        for group in groups {
            if group.kind == GroupKind::Fixed || group.size() < 2 {
                continue;
            }
            let top = group.top(&self.space(space).order.borrow()).index();
            self.reorder_frame(space, method, top, top + group.size(), &group.children, rng)?;
        }
        Ok(())
    }

    /// Largest number of blocks any frame of `space` consists of.
    fn max_frame_blocks(&self, space: Space) -> usize {
        fn frame(len: usize, groups: &[GroupNode]) -> usize {
            let own = len - groups.iter().map(|g| g.size() - 1).sum::<usize>();
            groups
                .iter()
                .filter(|g| g.kind != GroupKind::Fixed)
                .map(|g| frame(g.size(), &g.children))
                .fold(own, usize::max)
        }
        let groups = self.space(space).groups.borrow();
        frame(self.num_vars(space), &groups.roots)
    }

    // ------------------------------------------------------------------
    // Passes

    /// Runs `op` with the manager in reordering mode. Dead nodes are
    /// collected first so that sizes measure live structure only.
    fn with_reordering<T>(&self, op: impl FnOnce(&Core) -> DdResult<T>) -> DdResult<T> {
        let _mode = self.set_mode(Mode::Reordering);
        self.sweep_all();
        let result = op(self);
        self.invalidate_caches();
        self.epoch.set(self.epoch.get() + 1);
        result
    }

    /// One full reordering pass over `space`.
    pub(crate) fn reorder_space(&self, space: Space, method: ReorderMethod) -> DdResult<ReorderStats> {
        if method == ReorderMethod::Exact && self.max_frame_blocks(space) > EXACT_MAX_BLOCKS {
            return Err(DdError::invalid(format!(
                "exact reordering supports at most {} blocks per group",
                EXACT_MAX_BLOCKS
            )));
        }

        let start = Instant::now();
        let swaps_before = self.counters.borrow().swaps;
        let (seed, report) = {
            let config = self.config.borrow();
            (config.seed, config.report_reordering)
        };
        let passes = self.counters.borrow().reorderings as u64;
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(passes));

        let (initial_size, final_size) = self.with_reordering(|core| {
            let initial = core.space_size(space);
            let roots = core.space(space).groups.borrow().roots.clone();
            core.reorder_frame(space, method, 0, core.num_vars(space), &roots, &mut rng)?;
            Ok((initial, core.space_size(space)))
        })?;
        self.counters.borrow_mut().reorderings += 1;

        let stats = ReorderStats {
            method,
            swaps: self.counters.borrow().swaps - swaps_before,
            initial_size,
            final_size,
            elapsed: start.elapsed(),
        };
        if report {
            info!(
                "Reordering {:?} space with {:?}: {} -> {} nodes ({:.1}% reduction), {} swaps in {:?}",
                space,
                method,
                stats.initial_size,
                stats.final_size,
                stats.reduction_percent(),
                stats.swaps,
                stats.elapsed
            );
        } else {
            debug!(
                "Reordering {:?} space with {:?}: {} -> {} nodes, {} swaps",
                space, method, stats.initial_size, stats.final_size, stats.swaps
            );
        }

        if space == Space::Bdd && self.config.borrow().realign_zdd && self.zdd_multiplicity.get().is_some() {
            self.zdd_realign()?;
        }
        Ok(stats)
    }

    fn space_live(&self, space: Space) -> usize {
        space
            .kinds()
            .iter()
            .map(|&k| self.forest(k).table.borrow().live_len())
            .sum()
    }

    /// Reorders `space` if automatic reordering is enabled and due.
    pub(crate) fn maybe_reorder(&self, space: Space) -> DdResult<()> {
        let (method, max_count, threshold) = {
            let config = self.config.borrow();
            let method = match space {
                Space::Bdd => config.auto_reorder,
                Space::Zdd => config.zdd_auto_reorder,
            };
            (method, config.max_auto_reorderings, config.reorder_threshold)
        };
        let Some(method) = method else {
            return Ok(());
        };
        let state = self.space(space);
        if max_count.is_some_and(|max| state.auto_reorderings.get() >= max) {
            return Ok(());
        }
        if self.space_live(space) <= state.next_reorder.get() {
            return Ok(());
        }

        self.reorder_space(space, method)?;
        state.auto_reorderings.set(state.auto_reorderings.get() + 1);
        let next = (2 * self.space_live(space)).max(threshold);
        state.next_reorder.set(next);
        debug!("Next automatic reordering of {:?} space at {} live nodes", space, next);
        Ok(())
    }

    /// Validates and applies an explicit order of `space`.
    pub(crate) fn set_order(&self, space: Space, vars: &[Var]) -> DdResult<()> {
        let state = self.space(space);
        {
            let current = state.order.borrow();
            if !current.is_permutation(vars) {
                return Err(DdError::invalid(format!(
                    "order must list each of the {} variables exactly once",
                    current.len()
                )));
            }
            let target = VariableOrder::from_vars(vars);
            if !state.groups.borrow().allows(&current, &target) {
                return Err(DdError::invalid("order splits a group or permutes a fixed group"));
            }
        }
        self.with_reordering(|core| core.shuffle(space, vars))
    }

    /// Reorders the ZDD space so that the ZDD variables of each BDD
    /// variable follow the BDD order.
    pub(crate) fn zdd_realign(&self) -> DdResult<()> {
        let Some(m) = self.zdd_multiplicity.get() else {
            return Err(DdError::invalid("ZDD variables were not derived from BDD variables"));
        };
        let bdd_order = self.space(Space::Bdd).order.borrow().vars().to_vec();
        let nz = self.num_vars(Space::Zdd);
        let mapped = bdd_order.len() * m;
        let mut target: Vec<Var> = Vec::with_capacity(nz);
        for v in bdd_order {
            for j in 0..m {
                let z = v.as_usize() * m + j;
                if z < nz {
                    target.push(Var::new(z as u32));
                }
            }
        }
        let rest: Vec<Var> = self
            .space(Space::Zdd)
            .order
            .borrow()
            .vars()
            .iter()
            .copied()
            .filter(|v| v.as_usize() >= mapped)
            .collect();
        target.extend(rest);
        debug!("Realigning ZDD order to {} BDD variables", target.len() / m.max(1));
        self.set_order(Space::Zdd, &target)
    }

    fn make_group(&self, space: Space, first: Var, size: usize, kind: GroupKind) -> DdResult<()> {
        self.check_var(space, first)?;
        let state = self.space(space);
        let order = state.order.borrow();
        let top = order.level(first);
        state
            .groups
            .borrow_mut()
            .insert(&order, top, size, kind)
            .map_err(DdError::InvalidArgument)
    }

    fn order_string(&self, space: Space) -> String {
        let state = self.space(space);
        let names = state.names.borrow();
        let order = state.order.borrow();
        order
            .vars()
            .iter()
            .map(|v| match names.get(v.as_usize()).cloned().flatten() {
                Some(name) => name,
                None => v.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Order crossover: a slice of `a` kept in place, the rest in the order of `b`.
fn order_crossover<T: Copy + PartialEq>(a: &[T], b: &[T], rng: &mut ChaCha8Rng) -> Vec<T> {
    let n = a.len();
    let i = rng.random_range(0..n);
    let j = rng.random_range(i..n);
    let kept = &a[i..=j];
    let mut rest = b.iter().copied().filter(|x| !kept.contains(x));
    (0..n)
        .map(|k| if (i..=j).contains(&k) { a[k] } else { rest.next().unwrap_or(a[k]) })
        .collect()
}

impl Manager {
    /// Reorders the BDD/ADD space now.
    pub fn reorder(&self, method: ReorderMethod) -> DdResult<ReorderStats> {
        let _guard = self.core.enter()?;
        self.core.reorder_space(Space::Bdd, method)
    }

    /// Reorders the ZDD space now.
    pub fn zdd_reorder(&self, method: ReorderMethod) -> DdResult<ReorderStats> {
        let _guard = self.core.enter()?;
        self.core.reorder_space(Space::Zdd, method)
    }

    /// Reorder the BDD/ADD space automatically once it grows past the threshold.
    pub fn enable_auto_reorder(&self, method: ReorderMethod) {
        self.core.config.borrow_mut().auto_reorder = Some(method);
    }

    pub fn disable_auto_reorder(&self) {
        self.core.config.borrow_mut().auto_reorder = None;
    }

    pub fn auto_reorder(&self) -> Option<ReorderMethod> {
        self.core.config.borrow().auto_reorder
    }

    pub fn enable_zdd_auto_reorder(&self, method: ReorderMethod) {
        self.core.config.borrow_mut().zdd_auto_reorder = Some(method);
    }

    pub fn disable_zdd_auto_reorder(&self) {
        self.core.config.borrow_mut().zdd_auto_reorder = None;
    }

    /// Live-node count of the BDD/ADD space that triggers the next automatic reordering.
    pub fn next_reorder_threshold(&self) -> usize {
        self.core.space(Space::Bdd).next_reorder.get()
    }

    pub fn set_next_reorder_threshold(&self, nodes: usize) {
        self.core.space(Space::Bdd).next_reorder.set(nodes);
    }

    pub fn set_max_auto_reorderings(&self, max: Option<usize>) {
        self.core.config.borrow_mut().max_auto_reorderings = max;
    }

    /// Number of automatic reorderings of the BDD/ADD space so far.
    pub fn auto_reorderings(&self) -> usize {
        self.core.space(Space::Bdd).auto_reorderings.get()
    }

    /// Groups the `size` variables at the levels starting at `first`'s.
    pub fn make_group(&self, first: Var, size: usize, kind: GroupKind) -> DdResult<()> {
        let _guard = self.core.enter()?;
        self.core.make_group(Space::Bdd, first, size, kind)
    }

    pub fn zdd_make_group(&self, first: Var, size: usize, kind: GroupKind) -> DdResult<()> {
        let _guard = self.core.enter()?;
        self.core.make_group(Space::Zdd, first, size, kind)
    }

    pub fn groups(&self) -> Vec<VarGroup> {
        let state = self.core.space(Space::Bdd);
        let order = state.order.borrow();
        state.groups.borrow().snapshot(&order)
    }

    pub fn zdd_groups(&self) -> Vec<VarGroup> {
        let state = self.core.space(Space::Zdd);
        let order = state.order.borrow();
        state.groups.borrow().snapshot(&order)
    }

    /// BDD/ADD variables from the top level down.
    pub fn order(&self) -> Vec<Var> {
        self.core.space(Space::Bdd).order.borrow().vars().to_vec()
    }

    pub fn zdd_order(&self) -> Vec<Var> {
        self.core.space(Space::Zdd).order.borrow().vars().to_vec()
    }

    /// Moves the BDD/ADD variables into the given top-down order.
    pub fn set_order(&self, vars: &[Var]) -> DdResult<()> {
        let _guard = self.core.enter()?;
        self.core.set_order(Space::Bdd, vars)
    }

    pub fn zdd_set_order(&self, vars: &[Var]) -> DdResult<()> {
        let _guard = self.core.enter()?;
        self.core.set_order(Space::Zdd, vars)
    }

    /// The BDD/ADD order as a space-separated list of names.
    pub fn order_string(&self) -> String {
        self.core.order_string(Space::Bdd)
    }

    pub fn zdd_order_string(&self) -> String {
        self.core.order_string(Space::Zdd)
    }

    /// Aligns the ZDD order with the BDD order, for ZDD variables created
    /// by [`Manager::zdd_vars_from_bdd_vars`].
    pub fn zdd_realign(&self) -> DdResult<()> {
        let _guard = self.core.enter()?;
        self.core.zdd_realign()
    }

    /// Realign the ZDD order after every BDD reordering.
    pub fn set_zdd_realign(&self, enabled: bool) {
        self.core.config.borrow_mut().realign_zdd = enabled;
    }
}
