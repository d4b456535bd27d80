//! Wires SIGINT into a cooperative cancellation flag, checked at the main
//! suspension points (decoder reads, Store I/O, ANN build/query calls).
//! Uses a shared `AtomicBool` rather than an `mpsc` channel since the flag
//! is polled from inside tight loops rather than awaited once at shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub fn install() -> Arc<AtomicBool> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancelled);
    ctrlc::set_handler(move || {
        log::warn!("cancellation requested, finishing the current unit of work...");
        handler_flag.store(true, Ordering::SeqCst);
    })
    .expect("error setting Ctrl-C handler");
    cancelled
}
