use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::LayoutError;

/// Per-item height accessor used by the dynamic position mode.
pub type HeightFn = Arc<dyn Fn(usize) -> f64 + Send + Sync>;

/// Authoritative `index -> leading offset` mapping.
///
/// Offsets must be non-decreasing in `index`. `item_position(count)` is the total extent of a
/// list with `count` items. No rounding is applied; that is a rendering concern.
pub trait PositionIndex {
    fn item_position(&self, index: usize) -> Result<f64, LayoutError>;

    fn total_size(&self, count: usize) -> Result<f64, LayoutError> {
        self.item_position(count)
    }

    /// Drops every memoized offset.
    fn invalidate(&self) {}

    /// Drops memoized offsets for `index` and everything after it.
    fn invalidate_from(&self, index: usize) {
        let _ = index;
    }

    /// Whether offsets are memoized lazily (and batch precompute is worth running).
    fn is_dynamic(&self) -> bool {
        false
    }

    /// Number of leading offsets already memoized, or `None` when every offset is O(1).
    fn memoized_len(&self) -> Option<usize> {
        None
    }
}

/// The built-in position index: `index * item_height`, or memoized prefix sums over a height
/// accessor.
#[derive(Clone, Debug)]
pub enum Positions {
    Fixed { item_height: f64 },
    Dynamic(DynamicPositions),
}

impl Positions {
    pub fn fixed(item_height: f64) -> Self {
        Self::Fixed { item_height }
    }

    pub fn dynamic(height: impl Fn(usize) -> f64 + Send + Sync + 'static) -> Self {
        Self::Dynamic(DynamicPositions::new(Arc::new(height)))
    }

    /// Picks the mode the way `ListOptions::dynamic_item_height` describes: without a height
    /// accessor the dynamic mode falls back to `item_height` for every item.
    pub fn from_mode(dynamic: bool, item_height: f64, height: Option<HeightFn>) -> Self {
        if !dynamic {
            return Self::fixed(item_height);
        }
        let height = height.unwrap_or_else(|| Arc::new(move |_| item_height));
        Self::Dynamic(DynamicPositions::new(height))
    }
}

impl PositionIndex for Positions {
    fn item_position(&self, index: usize) -> Result<f64, LayoutError> {
        match self {
            Self::Fixed { item_height } => Ok(index as f64 * *item_height),
            Self::Dynamic(d) => d.item_position(index),
        }
    }

    fn invalidate(&self) {
        if let Self::Dynamic(d) = self {
            d.invalidate();
        }
    }

    fn invalidate_from(&self, index: usize) {
        if let Self::Dynamic(d) = self {
            d.invalidate_from(index);
        }
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    fn memoized_len(&self) -> Option<usize> {
        match self {
            Self::Fixed { .. } => None,
            Self::Dynamic(d) => d.memoized_len(),
        }
    }
}

/// Lazily memoized prefix sums. An index's offset is computed once, on first request, and kept
/// until invalidated.
#[derive(Clone)]
pub struct DynamicPositions {
    height: HeightFn,
    offsets: RefCell<Vec<f64>>, // offsets[i] = leading offset of item i
}

impl DynamicPositions {
    pub fn new(height: HeightFn) -> Self {
        Self {
            height,
            offsets: RefCell::new(Vec::new()),
        }
    }

    /// Number of memoized offsets.
    pub fn computed_len(&self) -> usize {
        self.offsets.borrow().len()
    }

    fn height_of(&self, index: usize) -> Result<f64, LayoutError> {
        let height = (self.height)(index);
        if !height.is_finite() || height < 0.0 {
            return Err(LayoutError::InvalidHeight { index, height });
        }
        Ok(height)
    }
}

impl PositionIndex for DynamicPositions {
    fn item_position(&self, index: usize) -> Result<f64, LayoutError> {
        if let Some(&off) = self.offsets.borrow().get(index) {
            return Ok(off);
        }

        let mut offsets = self.offsets.borrow_mut();
        if offsets.is_empty() {
            offsets.push(0.0);
        }
        let have = offsets.len();
        offsets.reserve(index + 1 - have);
        while offsets.len() <= index {
            let prev = offsets.len() - 1;
            let next = offsets[prev] + self.height_of(prev)?;
            offsets.push(next);
        }
        ltrace!(index, computed = offsets.len(), "DynamicPositions: extended prefix");
        Ok(offsets[index])
    }

    fn invalidate(&self) {
        self.offsets.borrow_mut().clear();
    }

    fn invalidate_from(&self, index: usize) {
        self.offsets.borrow_mut().truncate(index);
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn memoized_len(&self) -> Option<usize> {
        Some(self.computed_len())
    }
}

impl core::fmt::Debug for DynamicPositions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicPositions")
            .field("computed_len", &self.computed_len())
            .finish_non_exhaustive()
    }
}
