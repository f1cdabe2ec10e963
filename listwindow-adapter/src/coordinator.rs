use alloc::vec::Vec;
use core::cmp;

use listwindow::ScrollDirection;

use crate::{Clock, CoordinatorOptions, TimerToken, Timers};

/// Fired from [`ScrollCoordinator::tick`] when one of the named timers elapses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoordinatorEvent {
    /// `scrollTimeout`: no scroll activity for the debounce delay.
    ScrollEnded,
    /// `loadMoreTimeout`: the "load more" cooldown is over.
    CooldownEnded,
    /// `heightStabilizationTimeout`: content height has settled.
    HeightStabilized,
}

/// A snapshot of the coordinator's flags and geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinatorState {
    pub is_scrolling: bool,
    pub is_loading_more: bool,
    pub load_more_cooldown: bool,
    pub height_stabilizing: bool,
    pub visible_item_count: usize,
    pub scroll_top: f64,
    pub last_scroll_top: f64,
    pub viewport_height: f64,
    pub scroll_direction: Option<ScrollDirection>,
}

/// Owns the transient scroll/load flags and their timers.
///
/// The coordinator never runs anything on its own: the host calls [`tick`](Self::tick) (e.g.
/// once per frame) and timers whose deadline passed flip their flag back. Re-arming a timer
/// replaces the previous deadline, so the newest signal always wins.
#[derive(Clone, Debug)]
pub struct ScrollCoordinator<C> {
    options: CoordinatorOptions,
    clock: C,
    timers: Timers<CoordinatorEvent>,
    scroll_timeout: Option<TimerToken>,
    load_more_timeout: Option<TimerToken>,
    height_stabilization_timeout: Option<TimerToken>,

    is_scrolling: bool,
    is_loading_more: bool,
    load_more_cooldown: bool,
    height_stabilizing: bool,
    visible_item_count: usize,

    scroll_top: f64,
    last_scroll_top: f64,
    viewport_height: f64,
    scroll_direction: Option<ScrollDirection>,
}

impl<C: Clock> ScrollCoordinator<C> {
    pub fn new(options: CoordinatorOptions, clock: C) -> Self {
        Self {
            visible_item_count: options.max_visible_items,
            options,
            clock,
            timers: Timers::new(),
            scroll_timeout: None,
            load_more_timeout: None,
            height_stabilization_timeout: None,
            is_scrolling: false,
            is_loading_more: false,
            load_more_cooldown: false,
            height_stabilizing: false,
            scroll_top: 0.0,
            last_scroll_top: 0.0,
            viewport_height: 0.0,
            scroll_direction: None,
        }
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_scrolling(&self) -> bool {
        self.is_scrolling
    }

    pub fn is_loading_more(&self) -> bool {
        self.is_loading_more
    }

    pub fn load_more_cooldown(&self) -> bool {
        self.load_more_cooldown
    }

    pub fn height_stabilizing(&self) -> bool {
        self.height_stabilizing
    }

    pub fn visible_item_count(&self) -> usize {
        self.visible_item_count
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn last_scroll_top(&self) -> f64 {
        self.last_scroll_top
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn scroll_direction(&self) -> Option<ScrollDirection> {
        self.scroll_direction
    }

    pub fn set_scroll_top(&mut self, scroll_top: f64) {
        self.last_scroll_top = self.scroll_top;
        self.scroll_top = scroll_top;
        if scroll_top > self.last_scroll_top {
            self.scroll_direction = Some(ScrollDirection::Forward);
        } else if scroll_top < self.last_scroll_top {
            self.scroll_direction = Some(ScrollDirection::Backward);
        }
    }

    /// `true` marks scrolling now and (re)arms a trailing debounce of `delay_ms`; `false` ends it
    /// immediately.
    pub fn set_scrolling(&mut self, is_scrolling: bool, delay_ms: u64) {
        Self::cancel(&mut self.timers, &mut self.scroll_timeout);
        self.is_scrolling = is_scrolling;
        if !is_scrolling {
            self.scroll_direction = None;
            return;
        }
        let now = self.clock.now_ms();
        self.scroll_timeout = Some(
            self.timers
                .after(now, delay_ms, CoordinatorEvent::ScrollEnded),
        );
    }

    /// Suppresses "load more" for `duration_ms`.
    pub fn set_cooldown(&mut self, duration_ms: u64) {
        Self::cancel(&mut self.timers, &mut self.load_more_timeout);
        self.load_more_cooldown = true;
        let now = self.clock.now_ms();
        self.load_more_timeout = Some(self.timers.after(
            now,
            duration_ms,
            CoordinatorEvent::CooldownEnded,
        ));
        adebug!(duration_ms, "load-more cooldown armed");
    }

    /// Defers scroll-position corrections for `duration_ms` while content height settles.
    pub fn set_height_stabilizing(&mut self, duration_ms: u64) {
        Self::cancel(&mut self.timers, &mut self.height_stabilization_timeout);
        self.height_stabilizing = true;
        let now = self.clock.now_ms();
        self.height_stabilization_timeout = Some(self.timers.after(
            now,
            duration_ms,
            CoordinatorEvent::HeightStabilized,
        ));
    }

    pub fn set_loading_more(&mut self, is_loading_more: bool) {
        self.is_loading_more = is_loading_more;
    }

    /// Recomputes the visible item count for a viewport of `height`.
    ///
    /// Over-provisions on purpose: twice the items that fit, plus the buffer on both sides, and
    /// never less than `max_visible_items`.
    pub fn update_viewport_size(&mut self, height: f64) -> usize {
        self.viewport_height = height;
        let fit = ceil_div(height, self.options.item_height);
        let estimate = fit
            .saturating_mul(2)
            .saturating_add(self.options.buffer.saturating_mul(2));
        self.visible_item_count = cmp::max(self.options.max_visible_items, estimate);
        atrace!(
            height,
            visible_item_count = self.visible_item_count,
            "update_viewport_size"
        );
        self.visible_item_count
    }

    pub fn can_load_more(&self) -> bool {
        !self.is_loading_more && !self.load_more_cooldown
    }

    /// Whether the viewport is within `load_more_threshold` of the end of `total_size` and a
    /// load is allowed right now.
    pub fn should_load_more(&self, total_size: f64) -> bool {
        if !self.can_load_more() {
            return false;
        }
        self.scroll_top + self.viewport_height >= total_size - self.options.load_more_threshold
    }

    /// Fires every elapsed timer and returns the matching events in deadline order.
    pub fn tick(&mut self) -> Vec<CoordinatorEvent> {
        let now = self.clock.now_ms();
        let mut fired = Vec::new();
        for (token, event) in self.timers.take_due(now) {
            let (slot, flag) = match event {
                CoordinatorEvent::ScrollEnded => (&mut self.scroll_timeout, &mut self.is_scrolling),
                CoordinatorEvent::CooldownEnded => {
                    (&mut self.load_more_timeout, &mut self.load_more_cooldown)
                }
                CoordinatorEvent::HeightStabilized => (
                    &mut self.height_stabilization_timeout,
                    &mut self.height_stabilizing,
                ),
            };
            // A re-armed timer owns the slot now; a stale token must not clear it.
            if *slot != Some(token) {
                continue;
            }
            *slot = None;
            *flag = false;
            if event == CoordinatorEvent::ScrollEnded {
                self.scroll_direction = None;
            }
            fired.push(event);
        }
        fired
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.timers.next_due_ms()
    }

    /// Cancels all three timers. Flags keep their current values.
    pub fn clear_timers(&mut self) {
        self.timers.clear();
        self.scroll_timeout = None;
        self.load_more_timeout = None;
        self.height_stabilization_timeout = None;
    }

    /// Cancels all timers and restores default flag values.
    pub fn reset_state(&mut self) {
        self.clear_timers();
        self.is_scrolling = false;
        self.is_loading_more = false;
        self.load_more_cooldown = false;
        self.height_stabilizing = false;
        self.scroll_direction = None;
        adebug!("ScrollCoordinator::reset_state");
    }

    pub fn state(&self) -> CoordinatorState {
        CoordinatorState {
            is_scrolling: self.is_scrolling,
            is_loading_more: self.is_loading_more,
            load_more_cooldown: self.load_more_cooldown,
            height_stabilizing: self.height_stabilizing,
            visible_item_count: self.visible_item_count,
            scroll_top: self.scroll_top,
            last_scroll_top: self.last_scroll_top,
            viewport_height: self.viewport_height,
            scroll_direction: self.scroll_direction,
        }
    }

    fn cancel(timers: &mut Timers<CoordinatorEvent>, slot: &mut Option<TimerToken>) {
        if let Some(token) = slot.take() {
            timers.cancel(token);
        }
    }
}

/// `ceil(height / item_height)` without `f64::ceil`, which is unavailable in `core`.
fn ceil_div(height: f64, item_height: f64) -> usize {
    if height.is_nan() || item_height.is_nan() || height <= 0.0 || item_height <= 0.0 {
        return 0;
    }
    let q = height / item_height;
    let t = q as usize;
    if (t as f64) < q { t.saturating_add(1) } else { t }
}
