use crate::*;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        debug_assert!(start < end_exclusive);
        let span = end_exclusive - start;
        start + (self.next_u64() % span)
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        self.gen_range_u64(start as u64, end_exclusive as u64) as usize
    }
}

fn items(count: u32) -> Arc<[u32]> {
    (0..count).collect()
}

fn fixed_calculator(count: u32, item_height: f64, buffer: usize) -> VisibleRangeCalculator<u32> {
    let items = items(count);
    let opts = ListOptions::new(item_height)
        .with_buffer(buffer)
        .with_max_visible_items(20);
    VisibleRangeCalculator::from_options(opts, None, move || Arc::clone(&items))
}

fn dynamic_calculator(heights: Vec<f64>) -> VisibleRangeCalculator<u32> {
    let items = items(heights.len() as u32);
    let heights = Arc::new(heights);
    let opts = ListOptions::new(20.0)
        .with_buffer(0)
        .with_dynamic_item_height(true)
        .with_precompute_chunk_size(50);
    VisibleRangeCalculator::from_options(
        opts,
        Some(Arc::new(move |i: usize| heights[i])),
        move || Arc::clone(&items),
    )
}

fn linear_start_index(heights: &[f64], scroll_top: f64) -> usize {
    let mut off = 0.0;
    let mut found = 0;
    for (i, h) in heights.iter().enumerate() {
        if off <= scroll_top {
            found = i;
        }
        off += h;
    }
    found
}

#[test]
fn fixed_height_window_matches_worked_example() {
    let mut calc = fixed_calculator(1000, 20.0, 5);
    let w = calc.calculate_visible_range(500.0, 300.0);
    assert_eq!(w.start_index, 20);
    assert_eq!(w.end_index, 45);
    assert_eq!(w.offset_y, 400.0);
    assert_eq!(w.items.len(), 25);
    assert_eq!(w.items[0], 20);
    assert_eq!(calc.current_range().start_index, 20);
}

#[test]
fn empty_source_yields_empty_window() {
    let mut calc = fixed_calculator(0, 20.0, 5);
    for (top, view) in [(0.0, 0.0), (500.0, 300.0), (-10.0, 1e9)] {
        let w = calc.calculate_visible_range(top, view);
        assert_eq!(w, VisibleWindow::empty());
    }
}

#[test]
fn detached_container_yields_empty_window() {
    let mut calc = fixed_calculator(100, 20.0, 5);
    calc.set_container_ready(false);
    assert!(calc.calculate_visible_range(200.0, 300.0).is_empty());
    calc.set_container_ready(true);
    assert!(!calc.calculate_visible_range(200.0, 300.0).is_empty());
}

#[test]
fn negative_or_zero_scroll_starts_at_zero() {
    let mut calc = fixed_calculator(100, 20.0, 5);
    let w = calc.calculate_visible_range(-40.0, 300.0);
    assert_eq!(w.start_index, 0);
    assert_eq!(w.offset_y, 0.0);
    // 20 visible + buffer(5) below.
    assert_eq!(w.end_index, 25);
}

#[test]
fn window_is_clamped_at_the_end_of_the_list() {
    let mut calc = fixed_calculator(30, 20.0, 5);
    let w = calc.calculate_visible_range(580.0, 300.0);
    assert_eq!(w.start_index, 24);
    assert_eq!(w.end_index, 30);
    assert_eq!(w.items.len(), 6);
}

#[test]
fn range_validity_across_random_scrolls() {
    let mut rng = Lcg::new(7);
    for count in [1u32, 2, 17, 500] {
        let mut calc = fixed_calculator(count, 13.0, 3);
        let max_scroll = (count as u64) * 13;
        for _ in 0..200 {
            let top = rng.gen_range_u64(0, max_scroll + 1) as f64;
            let view = rng.gen_range_u64(1, 800) as f64;
            let w = calc.calculate_visible_range(top, view);
            assert!(w.start_index <= w.end_index);
            assert!(w.end_index <= count as usize);
            assert_eq!(w.items.len(), w.end_index - w.start_index);
        }
    }
}

#[test]
fn layout_cache_serves_repeated_queries() {
    let mut calc = fixed_calculator(1000, 20.0, 5);
    let a = calc.calculate_visible_range(500.0, 300.0);
    let b = calc.calculate_visible_range(500.0, 300.0);
    assert_eq!(a, b);
    let m = calc.layout_metrics();
    assert_eq!(m.layout_cache_size, 1);
    assert_eq!(m.index_cache_size, 1);
    assert_eq!(m.current_range, a.range());

    calc.clear_cache();
    let m = calc.layout_metrics();
    assert_eq!(m.layout_cache_size, 0);
    assert_eq!(m.index_cache_size, 0);
}

#[test]
fn changing_visible_item_count_drops_cached_windows() {
    let mut calc = fixed_calculator(1000, 20.0, 0);
    let a = calc.calculate_visible_range(500.0, 300.0);
    assert_eq!(a.end_index, 45);
    calc.set_visible_item_count(40);
    assert_eq!(calc.layout_metrics().layout_cache_size, 0);
    let b = calc.calculate_visible_range(500.0, 300.0);
    assert_eq!(b.end_index, 65);
}

#[test]
fn fuzzy_index_cache_reuses_nearby_offsets() {
    let mut calc = fixed_calculator(1000, 20.0, 0);
    assert_eq!(calc.find_start_index(500.0), Ok(25));
    // Within 10 units: the cached bucket at 500 answers.
    assert_eq!(calc.find_start_index(509.0), Ok(25));
    // A near-but-wrong answer is the documented cost of the approximation.
    assert_eq!(calc.find_start_index(490.0), Ok(25));
    assert_eq!(calc.layout_metrics().index_cache_size, 1);
    // Out of tolerance: binary search again.
    assert_eq!(calc.find_start_index(540.0), Ok(27));
    assert_eq!(calc.layout_metrics().index_cache_size, 2);
}

#[test]
fn index_cache_never_exceeds_capacity() {
    let mut cache = IndexCache::new(DEFAULT_CACHE_CAPACITY, 10);
    for i in 0..250 {
        cache.insert(i as f64 * 100.0, i);
        assert!(cache.len() <= DEFAULT_CACHE_CAPACITY);
    }
    // The newest entry survives eviction, the oldest do not.
    assert_eq!(cache.lookup(249.0 * 100.0), Some(249));
    assert_eq!(cache.lookup(0.0), None);
}

#[test]
fn bounded_cache_evicts_oldest_fifth() {
    let mut cache = BoundedCache::<u32, u32>::new(10);
    for i in 0..10 {
        cache.insert(i, i);
    }
    assert_eq!(cache.len(), 10);
    cache.insert(10, 10);
    // 11 entries > 10: the two oldest are dropped.
    assert_eq!(cache.len(), 9);
    assert_eq!(cache.get(&0), None);
    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.get(&2), Some(&2));

    // Overwrites do not refresh age.
    cache.insert(2, 20);
    assert_eq!(cache.get(&2), Some(&20));
}

#[test]
fn dynamic_positions_are_memoized() {
    let calls = Arc::new(AtomicUsize::new(0));
    let positions = Positions::dynamic({
        let calls = Arc::clone(&calls);
        move |i| {
            calls.fetch_add(1, Ordering::Relaxed);
            (i % 3 + 1) as f64 * 10.0
        }
    });
    assert!(positions.is_dynamic());
    // heights: 10, 20, 30, 10, 20, ...
    assert_eq!(positions.item_position(0), Ok(0.0));
    assert_eq!(positions.item_position(4), Ok(70.0));
    assert_eq!(calls.load(Ordering::Relaxed), 4);
    assert_eq!(positions.item_position(2), Ok(30.0));
    assert_eq!(positions.item_position(4), Ok(70.0));
    assert_eq!(calls.load(Ordering::Relaxed), 4);

    // Offsets 0 and 1 survive; heights 1..=3 are asked for again.
    positions.invalidate_from(2);
    assert_eq!(positions.item_position(4), Ok(70.0));
    assert_eq!(calls.load(Ordering::Relaxed), 7);
}

#[test]
fn invalid_height_falls_back_to_previous_window() {
    let heights = Arc::new(std::sync::RwLock::new(alloc::vec![10.0f64; 500]));
    let items = items(500);
    let opts = ListOptions::new(10.0)
        .with_buffer(2)
        .with_dynamic_item_height(true);
    let mut calc = VisibleRangeCalculator::from_options(
        opts,
        Some(Arc::new({
            let heights = Arc::clone(&heights);
            move |i: usize| heights.read().unwrap()[i]
        })),
        move || Arc::clone(&items),
    );

    let good = calc.calculate_visible_range(100.0, 200.0);
    assert_eq!(good.start_index, 8);

    heights.write().unwrap()[300] = f64::NAN;
    let fallback = calc.calculate_visible_range(4000.0, 200.0);
    assert_eq!(fallback, good);
    assert_eq!(calc.current_range(), good.range());
}

#[test]
fn panicking_height_accessor_is_contained() {
    let items = items(100);
    let opts = ListOptions::new(10.0).with_dynamic_item_height(true);
    let mut calc = VisibleRangeCalculator::from_options(
        opts,
        Some(Arc::new(|i: usize| if i < 50 { 10.0 } else { panic!("boom") })),
        move || Arc::clone(&items),
    );
    let first = calc.calculate_visible_range(0.0, 100.0);
    assert_eq!(first.start_index, 0);
    let again = calc.calculate_visible_range(900.0, 100.0);
    assert_eq!(again, first);
}

#[test]
fn performance_monitor_brackets_every_calculation() {
    #[derive(Default)]
    struct Counter {
        starts: AtomicUsize,
        ends: AtomicUsize,
    }
    impl PerformanceMonitor for Counter {
        fn start_measure(&self, name: &str) {
            assert_eq!(name, "calculate_visible_range");
            self.starts.fetch_add(1, Ordering::Relaxed);
        }
        fn end_measure(&self, _name: &str) {
            self.ends.fetch_add(1, Ordering::Relaxed);
        }
    }

    let counter = Arc::new(Counter::default());
    let mut calc = fixed_calculator(100, 20.0, 5).with_performance_monitor(counter.clone());
    calc.calculate_visible_range(0.0, 100.0);
    calc.calculate_visible_range(40.0, 100.0);
    assert_eq!(counter.starts.load(Ordering::Relaxed), 2);
    assert_eq!(counter.ends.load(Ordering::Relaxed), 2);
}

#[test]
fn batch_precompute_runs_in_slices() {
    let calc = dynamic_calculator(alloc::vec![7.0; 200]);
    let mut job = calc.batch_precompute_positions(0, 200).unwrap();
    let mut slices = 0;
    while calc.run_precompute_slice(&mut job).unwrap() {
        slices += 1;
    }
    // 200 / 50 = 4 slices; the last returns `false`.
    assert_eq!(slices + 1, 4);
    assert!(job.is_done());
    assert_eq!(calc.positions().item_position(199), Ok(199.0 * 7.0));

    assert_eq!(
        calc.batch_precompute_positions(0, 201),
        Err(LayoutError::IndexOutOfBounds {
            index: 201,
            count: 200
        })
    );
}

#[test]
fn batch_precompute_from_the_middle_stays_sliced() {
    let calls = Arc::new(AtomicUsize::new(0));
    let src = items(20_000);
    let opts = ListOptions::new(20.0)
        .with_dynamic_item_height(true)
        .with_precompute_chunk_size(50);
    let calc = VisibleRangeCalculator::from_options(
        opts,
        Some(Arc::new({
            let calls = Arc::clone(&calls);
            move |_: usize| {
                calls.fetch_add(1, Ordering::Relaxed);
                5.0
            }
        })),
        move || Arc::clone(&src),
    );

    let mut job = calc.batch_precompute_positions(10_000, 20_000).unwrap();
    assert!(calc.run_precompute_slice(&mut job).unwrap());
    assert!(calls.load(Ordering::Relaxed) <= 50);

    let mut slices = 1;
    loop {
        let before = calls.load(Ordering::Relaxed);
        let more = calc.run_precompute_slice(&mut job).unwrap();
        assert!(calls.load(Ordering::Relaxed) - before <= 50);
        slices += 1;
        if !more {
            break;
        }
    }
    // 10_000 prefix offsets plus 10_000 requested ones, 50 per slice.
    assert_eq!(slices, 400);
    assert!(job.is_done());
    assert_eq!(calls.load(Ordering::Relaxed), 19_999);
    assert_eq!(calc.positions().item_position(19_999), Ok(19_999.0 * 5.0));
}

#[test]
fn batch_precompute_is_immediate_for_fixed_heights() {
    let calc = fixed_calculator(1000, 20.0, 5);
    let job = calc.batch_precompute_positions(10, 900).unwrap();
    assert!(job.is_done());
    assert_eq!(job.remaining(), 0);
}

#[test]
fn dynamic_start_index_matches_linear_scan_seeded() {
    let mut rng = Lcg::new(2025);
    let heights: Vec<f64> = (0..300)
        .map(|_| rng.gen_range_usize(1, 60) as f64)
        .collect();
    let total: f64 = heights.iter().sum();
    let mut calc = dynamic_calculator(heights.clone());
    for _ in 0..200 {
        let top = rng.gen_range_u64(1, total as u64) as f64;
        calc.clear_cache();
        assert_eq!(
            calc.find_start_index(top),
            Ok(linear_start_index(&heights, top))
        );
    }
}

#[test]
fn node_pool_conserves_nodes() {
    let mut pool = NodePool::with_size(16, NodeKind::Row, "row");
    let ids: Vec<NodeId> = (0..16).map(|_| pool.get_element()).collect();
    assert_eq!(
        pool.stats(),
        PoolStats {
            total: 16,
            available: 0,
            in_use: 16
        }
    );
    for id in ids {
        assert!(pool.recycle_element(id));
    }
    assert_eq!(pool.available(), 16);
    assert_eq!(pool.pool_size(), 16);
}

#[test]
fn node_pool_grows_when_exhausted() {
    let mut pool = NodePool::with_size(10, NodeKind::Row, "row");
    for _ in 0..10 {
        pool.get_element();
    }
    assert_eq!(pool.available(), 0);
    let id = pool.get_element();
    assert!(pool.node(id).is_some());
    assert!(pool.pool_size() >= 10 + growth_step(10));
    let s = pool.stats();
    assert_eq!(s.available + s.in_use, s.total);
}

#[test]
fn node_pool_ignores_foreign_stale_and_double_recycles() {
    let mut a = NodePool::with_size(4, NodeKind::Row, "row");
    let mut b = NodePool::with_size(4, NodeKind::Row, "row");
    let id = a.get_element();
    assert!(!b.recycle_element(id));
    assert!(a.recycle_element(id));
    assert!(!a.recycle_element(id));
    assert_eq!(a.stats().available, 4);

    let id = a.get_element();
    a.initialize(4, NodeKind::Header, "header");
    assert!(!a.recycle_element(id));
    assert!(a.node(id).is_none());
    assert_eq!(a.stats().total, 4);
}

#[test]
fn node_pool_rejects_handle_after_slot_reuse() {
    let mut pool = NodePool::with_size(4, NodeKind::Row, "row");
    let old = pool.get_element();
    assert!(pool.recycle_element(old));

    // LIFO free list: the same slot comes straight back under a new handle.
    let new = pool.get_element();
    assert_ne!(old, new);
    assert!(pool.node(old).is_none());
    assert!(pool.node_mut(old).is_none());
    assert!(!pool.recycle_element(old));

    assert!(pool.node(new).is_some());
    assert_eq!(pool.stats(), PoolStats { total: 4, available: 3, in_use: 1 });
    let other = pool.get_element();
    assert_ne!(other, new);
    assert!(pool.node(new).is_some());
}

#[test]
fn node_pool_resets_nodes_on_reuse() {
    let mut pool = NodePool::with_size(1, NodeKind::Header, "sticky");
    let id = pool.get_element();
    {
        let node = pool.node_mut(id).unwrap();
        assert!(node.visible);
        node.content.push_str("hello");
        node.item_index = Some(3);
        node.set_attribute("data-index", "3");
    }
    assert!(pool.recycle_element(id));

    let id = pool.get_element();
    let node = pool.node(id).unwrap();
    assert!(node.visible);
    assert!(node.content.is_empty());
    assert_eq!(node.item_index, None);
    assert_eq!(node.attribute("data-index"), None);
    assert_eq!(node.kind(), NodeKind::Header);
    assert_eq!(node.class(), "sticky");
}

#[test]
fn node_pool_resize_keeps_in_use_nodes() {
    let mut pool = NodePool::with_size(20, NodeKind::Row, "row");
    let held: Vec<NodeId> = (0..5).map(|_| pool.get_element()).collect();
    pool.resize(8);
    assert_eq!(pool.stats(), PoolStats { total: 8, available: 3, in_use: 5 });
    pool.resize(2);
    assert_eq!(pool.stats(), PoolStats { total: 5, available: 0, in_use: 5 });
    for id in &held {
        assert!(pool.node(*id).is_some());
    }
    pool.resize(30);
    assert_eq!(pool.stats(), PoolStats { total: 30, available: 25, in_use: 5 });
}

#[test]
fn element_pool_respects_max_size() {
    let created = Arc::new(AtomicUsize::new(0));
    let mut pool = ElementPool::new(
        5,
        {
            let created = Arc::clone(&created);
            move || {
                created.fetch_add(1, Ordering::Relaxed);
                Vec::<u8>::with_capacity(8)
            }
        },
        |v: &mut Vec<u8>| v.clear(),
    );
    pool.initialize(10);
    assert_eq!(pool.stats().total, 5);

    let mut out: Vec<Vec<u8>> = (0..7).map(|_| pool.acquire()).collect();
    for v in &mut out {
        v.push(1);
    }
    assert_eq!(pool.stats().in_use, 7);

    let mut retained = 0;
    for v in out {
        if pool.release(v) {
            retained += 1;
        }
    }
    assert_eq!(retained, 5);
    assert_eq!(pool.stats(), PoolStats { total: 5, available: 5, in_use: 0 });
    assert!(pool.acquire().is_empty());
    assert!(pool.release(Vec::new()));
    // Nothing checked out any more.
    assert!(!pool.release(Vec::new()));
}

proptest! {
    #[test]
    fn search_start_index_matches_linear_scan(
        heights in proptest::collection::vec(1u32..80, 1..400),
        probes in proptest::collection::vec(0u32..40_000, 1..30),
    ) {
        let heights: Vec<f64> = heights.into_iter().map(f64::from).collect();
        let positions = Positions::dynamic({
            let heights = heights.clone();
            move |i| heights[i]
        });
        for top in probes {
            let top = f64::from(top);
            prop_assert_eq!(
                search_start_index(&positions, top, heights.len()),
                Ok(linear_start_index(&heights, top))
            );
        }
    }

    #[test]
    fn node_pool_get_then_recycle_restores_available(n in 1usize..64, m_frac in 0.0f64..=1.0) {
        let m = ((n as f64) * m_frac) as usize;
        let mut pool = NodePool::with_size(n, NodeKind::Row, "row");
        let ids: Vec<NodeId> = (0..m).map(|_| pool.get_element()).collect();
        let s = pool.stats();
        prop_assert_eq!(s.available + s.in_use, s.total);
        for id in ids {
            prop_assert!(pool.recycle_element(id));
        }
        prop_assert_eq!(pool.available(), n);
    }
}
