use alloc::vec::Vec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    Forward,
    Backward,
}

/// A committed window of indexes plus the leading offset of its first item.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub start_index: usize,
    pub end_index: usize, // exclusive
    pub offset_y: f64,
}

impl Range {
    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }
}

/// The slice of the item source that must be materialized.
///
/// Invariant: `start_index <= end_index <= count` and `items.len() == end_index - start_index`
/// for the item source the window was computed against.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibleWindow<T> {
    pub start_index: usize,
    pub end_index: usize, // exclusive
    /// Leading offset of `start_index` in the scroll axis.
    pub offset_y: f64,
    pub items: Vec<T>,
}

impl<T> VisibleWindow<T> {
    pub fn empty() -> Self {
        Self {
            start_index: 0,
            end_index: 0,
            offset_y: 0.0,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn range(&self) -> Range {
        Range {
            start_index: self.start_index,
            end_index: self.end_index,
            offset_y: self.offset_y,
        }
    }

    /// Iterates `(index, item)` pairs of the window.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        (self.start_index..).zip(self.items.iter())
    }
}

impl<T> Default for VisibleWindow<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutMetrics {
    pub layout_cache_size: usize,
    pub index_cache_size: usize,
    pub current_range: Range,
}

/// Pool occupancy. `available + in_use == total` holds for both pool flavours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolStats {
    pub total: usize,
    pub available: usize,
    pub in_use: usize,
}
