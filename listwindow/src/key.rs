#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(feature = "std")]
pub(crate) type CacheMap<K, V> = HashMap<K, V>;
#[cfg(not(feature = "std"))]
pub(crate) type CacheMap<K, V> = BTreeMap<K, V>;

#[cfg(feature = "std")]
#[doc(hidden)]
pub trait CacheKey: core::hash::Hash + Eq + Clone {}
#[cfg(feature = "std")]
impl<K: core::hash::Hash + Eq + Clone> CacheKey for K {}

#[cfg(not(feature = "std"))]
#[doc(hidden)]
pub trait CacheKey: Ord + Clone {}
#[cfg(not(feature = "std"))]
impl<K: Ord + Clone> CacheKey for K {}

/// Composite layout cache key. Offsets are keyed by their bit pattern so the key stays
/// `Eq`/`Hash`/`Ord` without rounding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct LayoutKey {
    scroll_top: u64,
    viewport_height: u64,
    item_count: usize,
}

impl LayoutKey {
    pub(crate) fn new(scroll_top: f64, viewport_height: f64, item_count: usize) -> Self {
        Self {
            scroll_top: scroll_top.to_bits(),
            viewport_height: viewport_height.to_bits(),
            item_count,
        }
    }
}
