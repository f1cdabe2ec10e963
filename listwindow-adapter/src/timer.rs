use alloc::vec::Vec;

/// Cancellation handle returned by [`Timers::after`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

#[derive(Clone, Debug)]
struct Pending<E> {
    token: TimerToken,
    due_ms: u64,
    event: E,
}

/// A deadline queue: `after(delay, event) -> token`, drained by the host's tick.
///
/// Timers never run on their own. [`take_due`](Self::take_due) hands back every event whose
/// deadline has passed, in deadline order (ties in arming order). Cancelling an unknown or
/// already-fired token is a no-op.
#[derive(Clone, Debug)]
pub struct Timers<E> {
    next_token: u64,
    pending: Vec<Pending<E>>,
}

impl<E> Timers<E> {
    pub fn new() -> Self {
        Self {
            next_token: 0,
            pending: Vec::new(),
        }
    }

    pub fn after(&mut self, now_ms: u64, delay_ms: u64, event: E) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.pending.push(Pending {
            token,
            due_ms: now_ms.saturating_add(delay_ms),
            event,
        });
        token
    }

    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.token != token);
        self.pending.len() != before
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|p| p.token == token)
    }

    pub fn due_ms(&self, token: TimerToken) -> Option<u64> {
        self.pending
            .iter()
            .find(|p| p.token == token)
            .map(|p| p.due_ms)
    }

    /// Earliest pending deadline, useful for hosts that sleep until the next tick is needed.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.iter().map(|p| p.due_ms).min()
    }

    pub fn take_due(&mut self, now_ms: u64) -> Vec<(TimerToken, E)> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due_ms <= now_ms {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|p| (p.due_ms, p.token));
        due.into_iter().map(|p| (p.token, p.event)).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<E> Default for Timers<E> {
    fn default() -> Self {
        Self::new()
    }
}
