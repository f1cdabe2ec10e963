use alloc::collections::VecDeque;
use core::cmp;

use crate::VisibleWindow;
use crate::key::{CacheKey, CacheMap, LayoutKey};

pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// A capacity-limited map that forgets its oldest entries first.
///
/// Once an insert pushes the size past `capacity`, the oldest ~20% of entries (at least one)
/// are dropped in insertion order. Overwriting an existing key keeps its original position.
#[derive(Clone, Debug)]
pub struct BoundedCache<K, V> {
    map: CacheMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: CacheKey, V> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            map: CacheMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        if let Some(slot) = self.map.get_mut(&key) {
            *slot = value;
            return;
        }
        self.order.push_back(key.clone());
        self.map.insert(key, value);
        if self.map.len() > self.capacity {
            self.evict_oldest();
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    fn evict_oldest(&mut self) {
        let n = cmp::max(1, self.capacity / 5).min(self.order.len());
        for key in self.order.drain(..n) {
            self.map.remove(&key);
        }
        ldebug!(evicted = n, remaining = self.map.len(), "BoundedCache: evicted oldest entries");
    }
}

/// Approximate `scroll offset -> start index` memo.
///
/// Offsets are bucketed to whole units. Lookups are fuzzy on purpose: any entry within
/// `tolerance` units is accepted, nearest bucket first (the lower bucket wins a tie), so a hit
/// may be off by an item or two under dense variable heights.
#[derive(Clone, Debug)]
pub struct IndexCache {
    entries: BoundedCache<i64, usize>,
    tolerance: u32,
}

impl IndexCache {
    pub fn new(capacity: usize, tolerance: u32) -> Self {
        Self {
            entries: BoundedCache::new(capacity),
            tolerance,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, scroll_top: f64, index: usize) {
        self.entries.insert(bucket(scroll_top), index);
    }

    pub fn lookup(&self, scroll_top: f64) -> Option<usize> {
        let center = bucket(scroll_top);
        for d in 0..=i64::from(self.tolerance) {
            if let Some(&index) = self.entries.get(&center.saturating_sub(d)) {
                return Some(index);
            }
            if d > 0 {
                if let Some(&index) = self.entries.get(&center.saturating_add(d)) {
                    return Some(index);
                }
            }
        }
        None
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn bucket(scroll_top: f64) -> i64 {
    // Floor without `f64::floor`, which is unavailable in `core`. `as` saturates out-of-range
    // floats and maps NaN to 0.
    let t = scroll_top as i64;
    if (t as f64) > scroll_top { t - 1 } else { t }
}

/// Full-result memo keyed by `(scroll_top, viewport_height, item_count)`.
#[derive(Clone, Debug)]
pub struct LayoutCache<T> {
    entries: BoundedCache<LayoutKey, VisibleWindow<T>>,
}

impl<T: Clone> LayoutCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BoundedCache::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(
        &self,
        scroll_top: f64,
        viewport_height: f64,
        item_count: usize,
    ) -> Option<&VisibleWindow<T>> {
        self.entries
            .get(&LayoutKey::new(scroll_top, viewport_height, item_count))
    }

    pub fn insert(
        &mut self,
        scroll_top: f64,
        viewport_height: f64,
        item_count: usize,
        window: VisibleWindow<T>,
    ) {
        self.entries.insert(
            LayoutKey::new(scroll_top, viewport_height, item_count),
            window,
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
