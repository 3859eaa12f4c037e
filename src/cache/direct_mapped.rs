//! Direct-mapped cache with generation-based O(1) invalidation.
//!
//! Each key hashes to exactly one slot and a newer entry simply overwrites
//! an older one. Entries are stamped with the generation current at insert
//! time; bumping the generation makes every entry stale at once, which is
//! what garbage collection and reordering need.

use std::cell::Cell;

use crate::utils::MyHash;

/// Default cache size in bits. 2^16 = 64K entries.
pub const DEFAULT_CACHE_BITS: usize = 16;

#[derive(Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
    generation: u64,
}

/// A direct-mapped cache for `Copy` keys and values.
///
/// # Example
///
/// ```ignore
/// let mut cache = DirectMappedCache::<(u64, u64), u32>::new(10);
/// cache.insert((1, 2), 42);
/// assert_eq!(cache.get(&(1, 2)), Some(42));
/// cache.invalidate();
/// assert_eq!(cache.get(&(1, 2)), None);
/// ```
pub struct DirectMappedCache<K, V> {
    entries: Vec<Entry<K, V>>,
    bitmask: u64,
    generation: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
    faults: Cell<usize>,
    inserts: usize,
}

impl<K: Copy + Default, V: Copy + Default> DirectMappedCache<K, V> {
    /// Creates a cache with `2^bits` slots.
    ///
    /// # Panics
    ///
    /// Panics if `bits > 30`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 30, "Cache bits must be in range 0..=30, got {}", bits);
        let size = 1usize << bits;
        let empty = Entry {
            key: K::default(),
            value: V::default(),
            // Generation 0 is never current, so fresh slots are empty.
            generation: 0,
        };
        Self {
            entries: vec![empty; size],
            bitmask: (size - 1) as u64,
            generation: 1,
            hits: Cell::new(0),
            misses: Cell::new(0),
            faults: Cell::new(0),
            inserts: 0,
        }
    }
}

impl<K, V> DirectMappedCache<K, V> {
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    /// Misses on a slot occupied by a different live key.
    pub fn faults(&self) -> usize {
        self.faults.get()
    }

    pub fn inserts(&self) -> usize {
        self.inserts
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Makes every entry stale in O(1).
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }
}

impl<K: MyHash + Eq + Copy, V: Copy> DirectMappedCache<K, V> {
    #[inline]
    fn index(&self, key: &K) -> usize {
        (key.hash() & self.bitmask) as usize
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = &self.entries[self.index(key)];
        if entry.generation != self.generation {
            self.misses.set(self.misses.get() + 1);
            return None;
        }
        if entry.key == *key {
            self.hits.set(self.hits.get() + 1);
            Some(entry.value)
        } else {
            self.misses.set(self.misses.get() + 1);
            self.faults.set(self.faults.get() + 1);
            None
        }
    }

    #[inline]
    pub fn insert(&mut self, key: K, value: V) {
        let idx = self.index(&key);
        self.entries[idx] = Entry {
            key,
            value,
            generation: self.generation,
        };
        self.inserts += 1;
    }
}
