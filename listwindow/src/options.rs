use crate::cache::DEFAULT_CACHE_CAPACITY;

/// Configuration for [`crate::VisibleRangeCalculator`].
///
/// Plain data; closures (item accessor, height accessor, hooks) are passed to the calculator
/// directly so this type stays cheap to clone and serializable.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListOptions {
    /// Items rendered beyond each viewport edge.
    pub buffer: usize,
    /// Reserved for viewport-driven item-count estimation by adapters.
    pub overscan: usize,
    /// Lower bound (and initial value) of the visible item count.
    pub max_visible_items: usize,
    /// Fixed item height, and the estimate used by dynamic mode when no accessor is given.
    pub item_height: f64,
    /// Switches the built-in position index to memoized per-item heights.
    pub dynamic_item_height: bool,

    pub index_cache_size: usize,
    pub layout_cache_size: usize,
    /// Offset distance (in units) accepted by the fuzzy index cache lookup.
    pub index_cache_tolerance: u32,
    /// Indexes processed per batch precompute slice.
    pub precompute_chunk_size: usize,
}

impl ListOptions {
    pub fn new(item_height: f64) -> Self {
        Self {
            buffer: 5,
            overscan: 5,
            max_visible_items: 20,
            item_height,
            dynamic_item_height: false,
            index_cache_size: DEFAULT_CACHE_CAPACITY,
            layout_cache_size: DEFAULT_CACHE_CAPACITY,
            index_cache_tolerance: 10,
            precompute_chunk_size: 50,
        }
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_max_visible_items(mut self, max_visible_items: usize) -> Self {
        self.max_visible_items = max_visible_items;
        self
    }

    pub fn with_dynamic_item_height(mut self, dynamic: bool) -> Self {
        self.dynamic_item_height = dynamic;
        self
    }

    pub fn with_cache_sizes(mut self, index_cache_size: usize, layout_cache_size: usize) -> Self {
        self.index_cache_size = index_cache_size;
        self.layout_cache_size = layout_cache_size;
        self
    }

    pub fn with_index_cache_tolerance(mut self, tolerance: u32) -> Self {
        self.index_cache_tolerance = tolerance;
        self
    }

    pub fn with_precompute_chunk_size(mut self, chunk: usize) -> Self {
        self.precompute_chunk_size = chunk;
        self
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::new(50.0)
    }
}
