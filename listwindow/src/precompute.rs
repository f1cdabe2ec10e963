use core::cmp;

use crate::{LayoutError, PositionIndex};

/// A resumable batch precompute over `[start, end)`.
///
/// Each [`run_slice`](Self::run_slice) call walks at most `chunk` indexes and returns, so the
/// host can hand control back to its event loop between slices (typically from an idle
/// callback).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrecomputeJob {
    next: usize,
    end: usize,
    chunk: usize,
}

impl PrecomputeJob {
    pub fn new(start: usize, end: usize, chunk: usize) -> Self {
        Self {
            next: start.min(end),
            end,
            chunk: chunk.max(1),
        }
    }

    /// A job with nothing left to do.
    pub fn finished(end: usize) -> Self {
        Self {
            next: end,
            end,
            chunk: 1,
        }
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.end
    }

    pub fn remaining(&self) -> usize {
        self.end - self.next
    }

    /// Processes one slice. Returns `true` while more slices remain.
    ///
    /// A slice never extends the memoized prefix by more than `chunk` offsets: a job starting
    /// past the memoized end first walks the missing prefix, one slice at a time. On error the
    /// cursor stays at the failing slice, so a retry resumes where it stopped.
    pub fn run_slice<P: PositionIndex + ?Sized>(
        &mut self,
        positions: &P,
    ) -> Result<bool, LayoutError> {
        if self.is_done() {
            return Ok(false);
        }
        let from = match positions.memoized_len() {
            Some(memoized) => cmp::min(self.next, memoized),
            None => self.next,
        };
        let slice_end = cmp::min(self.end, from.saturating_add(self.chunk));
        for index in from..slice_end {
            positions.item_position(index)?;
        }
        ltrace!(from, to = slice_end, "PrecomputeJob: slice done");
        self.next = cmp::max(self.next, slice_end);
        Ok(!self.is_done())
    }

    /// Runs every remaining slice back to back.
    pub fn run_to_completion<P: PositionIndex + ?Sized>(
        &mut self,
        positions: &P,
    ) -> Result<(), LayoutError> {
        while self.run_slice(positions)? {}
        Ok(())
    }
}
