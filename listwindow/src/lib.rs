//! Visible-window calculation and render-node recycling for very long lists.
//!
//! This crate keeps per-frame work proportional to the number of *visible* items:
//! - a [`PositionIndex`] maps item indexes to leading offsets (fixed heights in O(1), or lazily
//!   memoized per-item heights)
//! - a [`VisibleRangeCalculator`] maps a scroll offset to the window of items to materialize,
//!   via a binary search backed by an approximate index cache and a full-result cache
//! - a [`NodePool`] / [`ElementPool`] recycles render units instead of reallocating them
//!
//! It is UI-agnostic. Scroll/load state, timers and recovery live in `listwindow-adapter`.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod cache;
mod calculator;
mod element_pool;
mod error;
mod guard;
mod key;
mod options;
mod pool;
mod position;
mod precompute;
mod types;

#[cfg(test)]
mod tests;

pub use cache::{BoundedCache, DEFAULT_CACHE_CAPACITY, IndexCache, LayoutCache};
pub use calculator::{ItemsFn, PerformanceMonitor, VisibleRangeCalculator, search_start_index};
pub use element_pool::ElementPool;
pub use error::LayoutError;
pub use guard::call_guarded;
pub use options::ListOptions;
pub use pool::{MIN_GROWTH, NodeId, NodeKind, NodePool, RenderNode, growth_step};
pub use position::{DynamicPositions, HeightFn, PositionIndex, Positions};
pub use precompute::PrecomputeJob;
pub use types::{LayoutMetrics, PoolStats, Range, ScrollDirection, VisibleWindow};

#[doc(hidden)]
pub use key::CacheKey;
