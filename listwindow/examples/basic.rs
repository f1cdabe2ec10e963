// Example: fixed-height window calculation and node recycling.
use std::sync::Arc;

use listwindow::{ListOptions, NodeKind, NodePool, VisibleRangeCalculator};

fn main() {
    let items: Arc<[String]> = (0..1_000_000).map(|i| format!("row {i}")).collect();
    let opts = ListOptions::new(20.0).with_buffer(5).with_max_visible_items(40);
    let mut calc = VisibleRangeCalculator::from_options(opts, None, move || Arc::clone(&items));

    let window = calc.calculate_visible_range(123_456.0, 600.0);
    println!("range={:?}", window.range());
    println!("first={:?}", window.iter().next());

    let mut pool = NodePool::with_size(20, NodeKind::Row, "row");
    let ids: Vec<_> = window
        .iter()
        .map(|(index, label)| {
            let id = pool.get_element();
            if let Some(node) = pool.node_mut(id) {
                node.item_index = Some(index);
                node.content = label.clone();
            }
            id
        })
        .collect();
    println!("pool after mount: {:?}", pool.stats());

    for id in ids {
        pool.recycle_element(id);
    }
    println!("pool after release: {:?}", pool.stats());
    println!("metrics={:?}", calc.layout_metrics());
}
