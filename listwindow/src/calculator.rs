use alloc::sync::Arc;
use core::cmp;

use crate::cache::{IndexCache, LayoutCache};
use crate::{
    LayoutError, LayoutMetrics, ListOptions, PositionIndex, Positions, PrecomputeJob, Range,
    VisibleWindow, call_guarded,
};

/// Accessor returning the current ordered item collection.
pub type ItemsFn<T> = Arc<dyn Fn() -> Arc<[T]> + Send + Sync>;

/// Optional instrumentation invoked around every visible-range calculation.
pub trait PerformanceMonitor: Send + Sync {
    fn start_measure(&self, name: &str);
    fn end_measure(&self, name: &str);
}

const MEASURE_NAME: &str = "calculate_visible_range";

/// Maps a scroll offset and viewport to the window of indexes that must be materialized.
///
/// Lookups go through two caches before falling back to a binary search over the
/// [`PositionIndex`]:
/// - a full-result cache keyed by `(scroll_top, viewport_height, item_count)`
/// - an approximate `offset -> start index` cache (see [`IndexCache`])
///
/// A failed computation never reaches the caller: the previously committed window is
/// re-sliced from the current item source instead.
pub struct VisibleRangeCalculator<T, P = Positions> {
    options: ListOptions,
    positions: P,
    get_items: ItemsFn<T>,
    container_ready: bool,
    monitor: Option<Arc<dyn PerformanceMonitor>>,

    visible_item_count: usize,
    index_cache: IndexCache,
    layout_cache: LayoutCache<T>,
    current_range: Range,
}

impl<T: Clone> VisibleRangeCalculator<T, Positions> {
    /// Creates a calculator using the built-in position index selected by
    /// `options.dynamic_item_height`.
    pub fn from_options(
        options: ListOptions,
        height: Option<crate::HeightFn>,
        get_items: impl Fn() -> Arc<[T]> + Send + Sync + 'static,
    ) -> Self {
        let positions =
            Positions::from_mode(options.dynamic_item_height, options.item_height, height);
        Self::new(options, positions, get_items)
    }
}

impl<T: Clone, P: PositionIndex> VisibleRangeCalculator<T, P> {
    pub fn new(
        options: ListOptions,
        positions: P,
        get_items: impl Fn() -> Arc<[T]> + Send + Sync + 'static,
    ) -> Self {
        ldebug!(
            buffer = options.buffer,
            max_visible_items = options.max_visible_items,
            dynamic = positions.is_dynamic(),
            "VisibleRangeCalculator::new"
        );
        Self {
            visible_item_count: options.max_visible_items,
            index_cache: IndexCache::new(options.index_cache_size, options.index_cache_tolerance),
            layout_cache: LayoutCache::new(options.layout_cache_size),
            current_range: Range::default(),
            container_ready: true,
            monitor: None,
            get_items: Arc::new(get_items),
            positions,
            options,
        }
    }

    pub fn with_performance_monitor(mut self, monitor: Arc<dyn PerformanceMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    pub fn positions(&self) -> &P {
        &self.positions
    }

    pub fn items(&self) -> Arc<[T]> {
        (self.get_items)()
    }

    pub fn set_performance_monitor(&mut self, monitor: Option<Arc<dyn PerformanceMonitor>>) {
        self.monitor = monitor;
    }

    pub fn is_container_ready(&self) -> bool {
        self.container_ready
    }

    /// Marks the mounting surface as present or gone. While not ready, every calculation
    /// yields the empty window.
    pub fn set_container_ready(&mut self, ready: bool) {
        self.container_ready = ready;
    }

    pub fn visible_item_count(&self) -> usize {
        self.visible_item_count
    }

    pub fn set_visible_item_count(&mut self, count: usize) {
        if self.visible_item_count == count {
            return;
        }
        self.visible_item_count = count;
        // Cached windows were sized with the previous count.
        self.layout_cache.clear();
    }

    /// The last committed range (the error fallback).
    pub fn current_range(&self) -> Range {
        self.current_range
    }

    pub fn calculate_visible_range(
        &mut self,
        scroll_top: f64,
        viewport_height: f64,
    ) -> VisibleWindow<T> {
        self.measure(true);
        let items = self.items();
        let window = match call_guarded("calculate_visible_range", || {
            self.compute(&items, scroll_top, viewport_height)
        }) {
            Some(Ok(window)) => window,
            Some(Err(err)) => {
                lwarn!(%err, scroll_top, "visible range calculation failed; reusing last range");
                let _ = err;
                self.fallback_window(&items)
            }
            None => self.fallback_window(&items),
        };
        self.measure(false);
        window
    }

    /// Resolves the (unbuffered) first visible index for `scroll_top`.
    ///
    /// Consults the fuzzy index cache first, so under variable heights the answer may be off by
    /// an item or two; a binary-search result is cached for later lookups.
    pub fn find_start_index(&mut self, scroll_top: f64) -> Result<usize, LayoutError> {
        let count = self.items().len();
        self.find_start_index_in(scroll_top, count)
    }

    pub fn batch_precompute_positions(
        &self,
        start_index: usize,
        end_index: usize,
    ) -> Result<PrecomputeJob, LayoutError> {
        let count = self.items().len();
        if end_index > count {
            return Err(LayoutError::IndexOutOfBounds {
                index: end_index,
                count,
            });
        }
        if start_index >= end_index {
            return Ok(PrecomputeJob::finished(end_index));
        }
        if !self.positions.is_dynamic() {
            self.positions.item_position(end_index - 1)?;
            return Ok(PrecomputeJob::finished(end_index));
        }
        ldebug!(start_index, end_index, "batch precompute scheduled");
        Ok(PrecomputeJob::new(
            start_index,
            end_index,
            self.options.precompute_chunk_size,
        ))
    }

    /// Advances `job` by one slice against this calculator's position index.
    pub fn run_precompute_slice(&self, job: &mut PrecomputeJob) -> Result<bool, LayoutError> {
        job.run_slice(&self.positions)
    }

    /// Drops both caches and every memoized offset. Call this when the item source is replaced.
    pub fn clear_cache(&mut self) {
        self.index_cache.clear();
        self.layout_cache.clear();
        self.positions.invalidate();
    }

    /// Drops memoized offsets from `index` on, plus both caches (their entries may point past
    /// the change).
    pub fn invalidate_from(&mut self, index: usize) {
        self.positions.invalidate_from(index);
        self.index_cache.clear();
        self.layout_cache.clear();
    }

    pub fn layout_metrics(&self) -> LayoutMetrics {
        LayoutMetrics {
            layout_cache_size: self.layout_cache.len(),
            index_cache_size: self.index_cache.len(),
            current_range: self.current_range,
        }
    }

    fn compute(
        &mut self,
        items: &[T],
        scroll_top: f64,
        viewport_height: f64,
    ) -> Result<VisibleWindow<T>, LayoutError> {
        let count = items.len();
        if count == 0 || !self.container_ready {
            return Ok(VisibleWindow::empty());
        }

        if let Some(hit) = self.layout_cache.get(scroll_top, viewport_height, count) {
            let window = hit.clone();
            self.current_range = window.range();
            ltrace!(scroll_top, viewport_height, "layout cache hit");
            return Ok(window);
        }

        let buffer = self.options.buffer;
        let start = self
            .find_start_index_in(scroll_top, count)?
            .saturating_sub(buffer);
        let end = cmp::min(
            count,
            start + cmp::min(count - start, self.visible_item_count) + buffer,
        );
        let offset_y = self.positions.item_position(start)?;

        let window = VisibleWindow {
            start_index: start,
            end_index: end,
            offset_y,
            items: items[start..end].to_vec(),
        };
        self.layout_cache
            .insert(scroll_top, viewport_height, count, window.clone());
        self.current_range = window.range();
        ltrace!(start, end, offset_y, "visible range computed");
        Ok(window)
    }

    fn find_start_index_in(&mut self, scroll_top: f64, count: usize) -> Result<usize, LayoutError> {
        if count == 0 || scroll_top <= 0.0 {
            return Ok(0);
        }
        if let Some(index) = self.index_cache.lookup(scroll_top) {
            return Ok(index.min(count - 1));
        }
        let index = search_start_index(&self.positions, scroll_top, count)?;
        self.index_cache.insert(scroll_top, index);
        Ok(index)
    }

    fn fallback_window(&self, items: &[T]) -> VisibleWindow<T> {
        let start = self.current_range.start_index.min(items.len());
        let end = self.current_range.end_index.clamp(start, items.len());
        VisibleWindow {
            start_index: start,
            end_index: end,
            offset_y: self.current_range.offset_y,
            items: items[start..end].to_vec(),
        }
    }

    fn measure(&self, start: bool) {
        let Some(monitor) = &self.monitor else {
            return;
        };
        if start {
            call_guarded("start_measure", || monitor.start_measure(MEASURE_NAME));
        } else {
            call_guarded("end_measure", || monitor.end_measure(MEASURE_NAME));
        }
    }
}

/// Binary search for the greatest index whose offset is `<= scroll_top`; an exact match returns
/// immediately.
pub fn search_start_index<P: PositionIndex + ?Sized>(
    positions: &P,
    scroll_top: f64,
    count: usize,
) -> Result<usize, LayoutError> {
    let mut low = 0usize;
    let mut high = count; // exclusive
    while low < high {
        let mid = low + (high - low) / 2;
        let pos = positions.item_position(mid)?;
        if pos == scroll_top {
            return Ok(mid);
        }
        if pos < scroll_top {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    // `low` is the first index past `scroll_top`.
    Ok(low.saturating_sub(1))
}

impl<T, P: core::fmt::Debug> core::fmt::Debug for VisibleRangeCalculator<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VisibleRangeCalculator")
            .field("options", &self.options)
            .field("positions", &self.positions)
            .field("container_ready", &self.container_ready)
            .field("visible_item_count", &self.visible_item_count)
            .field("index_cache_len", &self.index_cache.len())
            .field("current_range", &self.current_range)
            .finish_non_exhaustive()
    }
}
