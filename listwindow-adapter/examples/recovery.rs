use std::sync::Arc;

use listwindow::{ListOptions, NodeKind, NodePool, VisibleRangeCalculator};
use listwindow_adapter::{
    Clock, CoordinatorOptions, ListController, ManualClock, RecoveryError, RecoveryOptions,
};

fn main() {
    // Example: a controller driven by a virtual clock, recovering from a failed mount.
    //
    // An adapter would:
    // - forward resize/scroll events to on_resize/on_scroll
    // - call materialize after each window change
    // - call tick() from its frame loop or a timer
    let clock = ManualClock::new(0);
    let items: Arc<[u32]> = (0..10_000).collect();
    let opts = ListOptions::new(32.0).with_buffer(3);
    let calc = VisibleRangeCalculator::from_options(opts.clone(), None, move || {
        Arc::clone(&items)
    });
    let recovery = RecoveryOptions::new()
        .with_recovery_delay_ms(250)
        .with_on_recovery_start(Some(|ctx: &listwindow_adapter::RecoveryContext| {
            println!("recovery attempt {} ({})", ctx.attempt, ctx.label);
        }))
        .with_on_recovery_success(Some(|_: &listwindow_adapter::RecoveryContext| {
            println!("recovered");
        }));
    let mut c = ListController::new(
        calc,
        NodePool::with_size(32, NodeKind::Row, "row"),
        CoordinatorOptions::from_list_options(&opts),
        recovery,
        clock.clone(),
    );

    c.on_resize(640.0);
    let w = c.on_scroll(3_200.0);
    println!("window={:?}", w.range());

    let mut fail_once = true;
    let res = c.materialize(|node, index, item| {
        if fail_once && index == 105 {
            fail_once = false;
            return Err(RecoveryError::failed("template not ready"));
        }
        node.content = format!("#{item}");
        Ok(())
    });
    println!("first materialize: {res:?}");

    while c.recovery().has_pending() {
        clock.advance(16);
        let report = c.tick();
        if !report.events.is_empty() || report.recovery.is_some() {
            println!("t={} {report:?}", clock.now_ms());
        }
    }

    let res = c.materialize(|node, _, item| {
        node.content = format!("#{item}");
        Ok(())
    });
    println!(
        "second materialize: {res:?}, mounted={}, pool={:?}",
        c.surface().mounted_len(),
        c.surface().pool().stats()
    );
}
