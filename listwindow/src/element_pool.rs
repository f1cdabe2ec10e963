use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp;

use crate::PoolStats;
use crate::pool::growth_step;

/// A pool of owned elements built by a factory, with a hard retention cap.
///
/// `reset` restores the baseline shape of an element before it is handed out. When more than
/// `max_size` elements would be retained, released elements are dropped instead.
pub struct ElementPool<E> {
    factory: Arc<dyn Fn() -> E + Send + Sync>,
    reset: Arc<dyn Fn(&mut E) + Send + Sync>,
    available: Vec<E>,
    in_use: usize,
    max_size: usize,
}

impl<E> ElementPool<E> {
    pub fn new(
        max_size: usize,
        factory: impl Fn() -> E + Send + Sync + 'static,
        reset: impl Fn(&mut E) + Send + Sync + 'static,
    ) -> Self {
        Self {
            factory: Arc::new(factory),
            reset: Arc::new(reset),
            available: Vec::new(),
            in_use: 0,
            max_size,
        }
    }

    /// Pre-fills the pool with up to `size` elements (bounded by `max_size`).
    pub fn initialize(&mut self, size: usize) {
        let target = cmp::min(size, self.max_size);
        let have = self.pool_size();
        if target > have {
            self.fill(target - have);
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn pool_size(&self) -> usize {
        self.available.len() + self.in_use
    }

    pub fn acquire(&mut self) -> E {
        if self.available.is_empty() {
            let room = self.max_size.saturating_sub(self.pool_size());
            let step = cmp::min(growth_step(self.pool_size()), room);
            if step > 0 {
                ldebug!(step, "ElementPool exhausted; growing");
                self.fill(step);
            }
        }
        let mut element = self.available.pop().unwrap_or_else(|| (self.factory)());
        (self.reset)(&mut element);
        self.in_use += 1;
        element
    }

    /// Hands an element back. Returns `true` if it was retained for reuse.
    ///
    /// A release with nothing checked out is ignored; releases beyond `max_size` drop the
    /// element.
    pub fn release(&mut self, element: E) -> bool {
        if self.in_use == 0 {
            return false;
        }
        self.in_use -= 1;
        if self.pool_size() >= self.max_size {
            ltrace!(max_size = self.max_size, "ElementPool full; dropping element");
            return false;
        }
        self.available.push(element);
        true
    }

    pub fn resize(&mut self, new_size: usize) {
        let new_size = cmp::min(new_size, self.max_size);
        let cur = self.pool_size();
        if new_size > cur {
            self.fill(new_size - cur);
        } else {
            let keep = self.available.len().saturating_sub(cur - new_size);
            self.available.truncate(keep);
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total: self.pool_size(),
            available: self.available.len(),
            in_use: self.in_use,
        }
    }

    /// Drops every retained element and forgets outstanding ones.
    pub fn clear(&mut self) {
        self.available.clear();
        self.in_use = 0;
    }

    fn fill(&mut self, n: usize) {
        self.available.reserve(n);
        for _ in 0..n {
            self.available.push((self.factory)());
        }
    }
}

impl<E> core::fmt::Debug for ElementPool<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ElementPool")
            .field("available", &self.available.len())
            .field("in_use", &self.in_use)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}
