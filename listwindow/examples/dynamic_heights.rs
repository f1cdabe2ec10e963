// Example: variable heights with an idle-time precompute.
use std::sync::Arc;

use listwindow::{ListOptions, VisibleRangeCalculator};

fn main() {
    let items: Arc<[u32]> = (0..50_000).collect();
    let opts = ListOptions::new(24.0)
        .with_dynamic_item_height(true)
        .with_precompute_chunk_size(5_000);
    let mut calc = VisibleRangeCalculator::from_options(
        opts,
        Some(Arc::new(|i: usize| if i % 10 == 0 { 48.0 } else { 24.0 })),
        move || Arc::clone(&items),
    );

    let mut job = calc
        .batch_precompute_positions(0, 50_000)
        .expect("range is in bounds");
    let mut slices = 1;
    while calc.run_precompute_slice(&mut job).expect("heights are valid") {
        slices += 1;
    }
    println!("precomputed in {slices} slices");

    let window = calc.calculate_visible_range(250_000.0, 800.0);
    println!(
        "range={:?} offset_y={}",
        window.range(),
        window.offset_y
    );
}
