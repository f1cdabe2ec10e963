use alloc::collections::BTreeMap;
use alloc::string::ToString;
use alloc::vec::Vec;

use listwindow::{
    LayoutError, NodeId, NodePool, PositionIndex, Positions, PrecomputeJob, RenderNode,
    VisibleRangeCalculator, VisibleWindow,
};

use crate::{
    Clock, CoordinatorEvent, CoordinatorOptions, RecoveryContext, RecoveryError,
    RecoveryOptions, RecoveryOutcome, RecoveryScheduler, ScrollCoordinator,
};

/// The materialization side of a list: the calculator plus the nodes currently mounted for it.
///
/// This is also the target recovery actions operate on.
pub struct ListSurface<T, P = Positions> {
    calculator: VisibleRangeCalculator<T, P>,
    pool: NodePool,
    mounted: BTreeMap<usize, NodeId>,
    needs_remount: bool,
}

impl<T: Clone, P: PositionIndex> ListSurface<T, P> {
    pub fn new(calculator: VisibleRangeCalculator<T, P>, pool: NodePool) -> Self {
        Self {
            calculator,
            pool,
            mounted: BTreeMap::new(),
            needs_remount: false,
        }
    }

    pub fn calculator(&self) -> &VisibleRangeCalculator<T, P> {
        &self.calculator
    }

    pub fn calculator_mut(&mut self) -> &mut VisibleRangeCalculator<T, P> {
        &mut self.calculator
    }

    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    pub fn mounted_len(&self) -> usize {
        self.mounted.len()
    }

    /// Whether every node must be mounted again on the next [`materialize`](Self::materialize).
    pub fn needs_remount(&self) -> bool {
        self.needs_remount
    }

    pub fn node_for(&self, index: usize) -> Option<&RenderNode> {
        self.pool.node(*self.mounted.get(&index)?)
    }

    /// Mounts exactly `window`: nodes outside it go back to the pool, missing indexes get a
    /// node from the pool and are handed to `mount`.
    ///
    /// On a mount failure the failing node is recycled, the surface is flagged for a full
    /// remount, and the error is returned.
    pub fn materialize(
        &mut self,
        window: &VisibleWindow<T>,
        mut mount: impl FnMut(&mut RenderNode, usize, &T) -> Result<(), RecoveryError>,
    ) -> Result<(), RecoveryError> {
        if self.needs_remount {
            self.release_all();
            self.needs_remount = false;
        }

        let range = window.range();
        let stale: Vec<usize> = self
            .mounted
            .keys()
            .copied()
            .filter(|i| !range.contains(*i))
            .collect();
        for index in stale {
            if let Some(id) = self.mounted.remove(&index) {
                self.pool.recycle_element(id);
            }
        }

        for (index, item) in window.iter() {
            if self.mounted.contains_key(&index) {
                continue;
            }
            let offset_y = self.calculator.positions().item_position(index)?;
            let id = self.pool.get_element();
            let Some(node) = self.pool.node_mut(id) else {
                continue;
            };
            node.item_index = Some(index);
            node.offset_y = offset_y;
            if let Err(err) = mount(node, index, item) {
                self.pool.recycle_element(id);
                self.needs_remount = true;
                return Err(RecoveryError::Mount {
                    index,
                    reason: err.to_string(),
                });
            }
            self.mounted.insert(index, id);
        }
        Ok(())
    }

    /// Returns every mounted node to the pool.
    pub fn release_all(&mut self) {
        for (_, id) in core::mem::take(&mut self.mounted) {
            self.pool.recycle_element(id);
        }
    }

    /// The built-in recovery action: drop caches and mounted nodes, then check that the last
    /// committed range still resolves.
    pub fn recover(&mut self) -> Result<(), RecoveryError> {
        self.calculator.clear_cache();
        self.release_all();
        self.needs_remount = true;
        let range = self.calculator.current_range();
        self.calculator
            .positions()
            .item_position(range.start_index)?;
        Ok(())
    }
}

impl<T, P: core::fmt::Debug> core::fmt::Debug for ListSurface<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListSurface")
            .field("calculator", &self.calculator)
            .field("pool", &self.pool)
            .field("mounted", &self.mounted)
            .field("needs_remount", &self.needs_remount)
            .finish()
    }
}

/// What happened during one [`ListController::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub events: Vec<CoordinatorEvent>,
    pub recovery: Option<RecoveryOutcome>,
}

/// A framework-neutral controller wiring the pieces along the render path:
/// scroll/resize signal -> [`ScrollCoordinator`] -> [`VisibleRangeCalculator`] ->
/// [`NodePool`] (via [`ListSurface`]) -> [`RecoveryScheduler`] on failure.
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `on_resize` / `on_scroll` when UI events occur
/// - `materialize` to mount the current window
/// - `tick()` each frame/timer tick (debounces, cooldowns, recovery attempts)
/// - `on_idle()` when the event loop has spare time (batched position precompute)
pub struct ListController<T, C, P = Positions> {
    surface: ListSurface<T, P>,
    coordinator: ScrollCoordinator<C>,
    recovery: RecoveryScheduler<C, ListSurface<T, P>>,
    precompute: Option<PrecomputeJob>,
    window: VisibleWindow<T>,
}

impl<T, C, P> ListController<T, C, P>
where
    T: Clone + 'static,
    C: Clock + Clone,
    P: PositionIndex + 'static,
{
    pub fn new(
        calculator: VisibleRangeCalculator<T, P>,
        pool: NodePool,
        coordinator: CoordinatorOptions,
        recovery: RecoveryOptions,
        clock: C,
    ) -> Self {
        Self {
            surface: ListSurface::new(calculator, pool),
            coordinator: ScrollCoordinator::new(coordinator, clock.clone()),
            recovery: RecoveryScheduler::new(recovery, clock),
            precompute: None,
            window: VisibleWindow::empty(),
        }
    }

    pub fn window(&self) -> &VisibleWindow<T> {
        &self.window
    }

    pub fn surface(&self) -> &ListSurface<T, P> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut ListSurface<T, P> {
        &mut self.surface
    }

    pub fn coordinator(&self) -> &ScrollCoordinator<C> {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut ScrollCoordinator<C> {
        &mut self.coordinator
    }

    pub fn recovery(&self) -> &RecoveryScheduler<C, ListSurface<T, P>> {
        &self.recovery
    }

    pub fn recovery_mut(&mut self) -> &mut RecoveryScheduler<C, ListSurface<T, P>> {
        &mut self.recovery
    }

    /// Call this when the UI reports a new viewport height.
    pub fn on_resize(&mut self, viewport_height: f64) -> &VisibleWindow<T> {
        let count = self.coordinator.update_viewport_size(viewport_height);
        self.surface.calculator.set_visible_item_count(count);
        self.recompute()
    }

    /// Call this when the UI reports a scroll offset change.
    pub fn on_scroll(&mut self, scroll_top: f64) -> &VisibleWindow<T> {
        let delay = self.coordinator.options().scroll_debounce_ms;
        self.coordinator.set_scroll_top(scroll_top);
        self.coordinator.set_scrolling(true, delay);
        self.recompute()
    }

    /// Mounts the current window. A failure schedules the built-in recovery action.
    pub fn materialize(
        &mut self,
        mount: impl FnMut(&mut RenderNode, usize, &T) -> Result<(), RecoveryError>,
    ) -> Result<(), RecoveryError> {
        let result = self.surface.materialize(&self.window, mount);
        if let Err(err) = &result {
            awarn!(%err, "materialize failed; scheduling recovery");
            self.schedule_surface_recovery(
                RecoveryContext::new("materialize").with_error(err.clone()),
            );
        }
        result
    }

    /// Schedules the built-in recovery action, e.g. after the host detected a stalled frame.
    pub fn schedule_surface_recovery(&mut self, context: RecoveryContext) -> bool {
        self.recovery
            .schedule_recovery(|surface: &mut ListSurface<T, P>| surface.recover(), context)
    }

    /// Fires elapsed coordinator timers and runs a due recovery attempt. A successful recovery
    /// recomputes the window.
    pub fn tick(&mut self) -> TickReport {
        let events = self.coordinator.tick();
        let recovery = self.recovery.tick(&mut self.surface);
        if matches!(recovery, Some(RecoveryOutcome::Succeeded { .. })) {
            self.recompute();
        }
        TickReport { events, recovery }
    }

    /// Whether the host should fetch more items now.
    pub fn should_load_more(&self) -> bool {
        let count = self.surface.calculator.items().len();
        match self.surface.calculator.positions().total_size(count) {
            Ok(total) => self.coordinator.should_load_more(total),
            Err(_) => false,
        }
    }

    /// Marks a load as in flight. Returns `false` if loading is currently suppressed.
    pub fn begin_load_more(&mut self) -> bool {
        if !self.coordinator.can_load_more() {
            return false;
        }
        self.coordinator.set_loading_more(true);
        true
    }

    /// Ends an in-flight load and starts the cooldown.
    pub fn finish_load_more(&mut self) {
        let cooldown = self.coordinator.options().load_more_cooldown_ms;
        self.coordinator.set_loading_more(false);
        self.coordinator.set_cooldown(cooldown);
    }

    /// Call this after items were inserted or re-measured starting at `from_index`.
    pub fn on_content_changed(&mut self, from_index: usize) -> &VisibleWindow<T> {
        let settle = self.coordinator.options().height_stabilization_ms;
        self.surface.calculator.invalidate_from(from_index);
        self.coordinator.set_height_stabilizing(settle);
        self.recompute()
    }

    /// Call this when the item source was swapped out.
    pub fn replace_items(&mut self) -> &VisibleWindow<T> {
        self.surface.calculator.clear_cache();
        self.surface.release_all();
        self.coordinator.reset_state();
        self.precompute = None;
        self.recompute()
    }

    /// Queues a batched position precompute, run one slice per [`on_idle`](Self::on_idle).
    pub fn batch_precompute_positions(
        &mut self,
        start_index: usize,
        end_index: usize,
    ) -> Result<(), LayoutError> {
        let job = self
            .surface
            .calculator
            .batch_precompute_positions(start_index, end_index)?;
        self.precompute = (!job.is_done()).then_some(job);
        Ok(())
    }

    /// Runs one precompute slice. Returns `true` while more work remains.
    pub fn on_idle(&mut self) -> bool {
        let Some(job) = self.precompute.as_mut() else {
            return false;
        };
        match self.surface.calculator.run_precompute_slice(job) {
            Ok(true) => true,
            Ok(false) => {
                self.precompute = None;
                false
            }
            Err(err) => {
                awarn!(%err, "batch precompute aborted");
                let _ = err;
                self.precompute = None;
                false
            }
        }
    }

    /// Cancels timers and pending work, empties the pool and detaches the container.
    pub fn teardown(&mut self) {
        self.coordinator.reset_state();
        self.recovery.reset_recovery();
        self.precompute = None;
        self.surface.release_all();
        self.surface.pool.clear();
        self.surface.calculator.clear_cache();
        self.surface.calculator.set_container_ready(false);
        self.window = VisibleWindow::empty();
        adebug!("ListController::teardown");
    }

    fn recompute(&mut self) -> &VisibleWindow<T> {
        let scroll_top = self.coordinator.scroll_top();
        let viewport = self.coordinator.viewport_height();
        self.window = self
            .surface
            .calculator
            .calculate_visible_range(scroll_top, viewport);
        &self.window
    }
}

impl<T, C: core::fmt::Debug, P: core::fmt::Debug> core::fmt::Debug for ListController<T, C, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListController")
            .field("surface", &self.surface)
            .field("coordinator", &self.coordinator)
            .field("recovery", &self.recovery)
            .field("precompute", &self.precompute)
            .finish_non_exhaustive()
    }
}
