//! Manager configuration.

use std::time::Duration;

use crate::cache::DEFAULT_CACHE_BITS;
use crate::reorder::ReorderMethod;
use crate::subtable::DEFAULT_BUCKET_BITS;

/// Live-node count that arms the first automatic reordering.
pub const DEFAULT_REORDER_THRESHOLD: usize = 4004;

/// Settings of a [`Manager`](crate::manager::Manager).
///
/// ```
/// use dd_rs::config::ManagerConfig;
/// use dd_rs::reorder::ReorderMethod;
///
/// let config = ManagerConfig::default()
///     .with_vars(8)
///     .with_cache_bits(12)
///     .with_auto_reorder(ReorderMethod::Sift);
/// assert_eq!(config.num_vars, 8);
/// ```
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// BDD/ADD variables created up front.
    pub num_vars: usize,
    /// ZDD variables created up front.
    pub num_zdd_vars: usize,
    /// Initial bucket bits of every subtable.
    pub bucket_bits: usize,
    /// Size of each operation cache, in bits.
    pub cache_bits: usize,
    /// Upper bound on the node arenas, in bytes.
    pub memory_limit: Option<usize>,
    /// Ceiling on live nodes across all kinds.
    pub max_live_nodes: Option<usize>,
    /// Time budget, measured from manager creation.
    pub time_limit: Option<Duration>,
    /// Whether automatic garbage collection runs between calls.
    pub gc_enabled: bool,
    /// Collect once `dead > gc_dead_ratio * live`.
    pub gc_dead_ratio: f64,
    /// ...and at least this many nodes are dead.
    pub gc_min_dead: usize,
    /// Automatic reordering of the BDD/ADD space.
    pub auto_reorder: Option<ReorderMethod>,
    /// Automatic reordering of the ZDD space.
    pub zdd_auto_reorder: Option<ReorderMethod>,
    /// Live-node count that triggers the first automatic reordering.
    pub reorder_threshold: usize,
    /// Stop reordering automatically after this many passes.
    pub max_auto_reorderings: Option<usize>,
    /// Sifting abandons a direction once the size exceeds `max_growth` times the best.
    pub max_growth: f64,
    /// Seed for the random and genetic heuristics.
    pub seed: u64,
    /// Log a summary of every reordering at info level.
    pub report_reordering: bool,
    /// Log a summary of every collection at info level.
    pub report_gc: bool,
    /// Keep the ZDD order aligned with the BDD order after BDD reordering.
    pub realign_zdd: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            num_vars: 0,
            num_zdd_vars: 0,
            bucket_bits: DEFAULT_BUCKET_BITS,
            cache_bits: DEFAULT_CACHE_BITS,
            memory_limit: None,
            max_live_nodes: None,
            time_limit: None,
            gc_enabled: true,
            gc_dead_ratio: 0.5,
            gc_min_dead: 1024,
            auto_reorder: None,
            zdd_auto_reorder: None,
            reorder_threshold: DEFAULT_REORDER_THRESHOLD,
            max_auto_reorderings: None,
            max_growth: 1.2,
            seed: 0x5eed,
            report_reordering: false,
            report_gc: false,
            realign_zdd: false,
        }
    }
}

impl ManagerConfig {
    pub fn with_vars(mut self, num_vars: usize) -> Self {
        self.num_vars = num_vars;
        self
    }

    pub fn with_zdd_vars(mut self, num_zdd_vars: usize) -> Self {
        self.num_zdd_vars = num_zdd_vars;
        self
    }

    pub fn with_bucket_bits(mut self, bits: usize) -> Self {
        self.bucket_bits = bits;
        self
    }

    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }

    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    pub fn with_node_limit(mut self, nodes: usize) -> Self {
        self.max_live_nodes = Some(nodes);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_gc(mut self, enabled: bool) -> Self {
        self.gc_enabled = enabled;
        self
    }

    pub fn with_auto_reorder(mut self, method: ReorderMethod) -> Self {
        self.auto_reorder = Some(method);
        self
    }

    pub fn with_zdd_auto_reorder(mut self, method: ReorderMethod) -> Self {
        self.zdd_auto_reorder = Some(method);
        self
    }

    pub fn with_reorder_threshold(mut self, nodes: usize) -> Self {
        self.reorder_threshold = nodes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Maximum number of arena slots per node table implied by the memory limit.
    pub(crate) fn max_slots(&self) -> Option<usize> {
        // The three tables share the budget evenly.
        self.memory_limit
            .map(|bytes| (bytes / std::mem::size_of::<crate::node::Node>() / 3).max(8))
    }
}
