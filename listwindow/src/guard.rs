/// Invokes a consumer-supplied hook, containing panics.
///
/// With `feature = "std"` a panic inside `f` is caught, logged under `name`, and reported as
/// `None`. Without `std` there is no unwinding support to hook into, so `f` is called directly.
#[cfg(feature = "std")]
pub fn call_guarded<R>(name: &'static str, f: impl FnOnce() -> R) -> Option<R> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(v) => Some(v),
        Err(_) => {
            lwarn!(hook = name, "consumer hook panicked; ignoring");
            let _ = name;
            None
        }
    }
}

#[cfg(not(feature = "std"))]
pub fn call_guarded<R>(name: &'static str, f: impl FnOnce() -> R) -> Option<R> {
    let _ = name;
    Some(f())
}
