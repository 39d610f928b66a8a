//! Inactivity-detection middleware.

use std::sync::Arc;
use std::time::Duration;

use crate::handler::Handler;
use crate::message::Message;
use crate::warmup::WarmupGate;

/// Returns a `wait` closure and a middleware that ticks a warm-up gate
/// on every message before delegating.
///
/// `wait()` blocks until no wrapped handler has received a message for
/// `timeout`, which is a good moment for the service to announce itself as
/// ready. This performs warm-up detection for routes that opt in via
/// middleware; the bus-level gate
/// ([`Options::with_warm_up_timeout`](crate::Options::with_warm_up_timeout))
/// does the same across the whole receiver tree.
pub fn detect_inactivity(
    timeout: Duration,
) -> (
    impl Fn() + Send + Sync + 'static,
    impl Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync + 'static,
) {
    let gate = Arc::new(WarmupGate::new(timeout));

    let wait_gate = Arc::clone(&gate);
    let wait = move || wait_gate.wait();

    let middleware = move |next: Arc<dyn Handler>| {
        let gate = Arc::clone(&gate);
        Arc::new(move |msg: &Message| {
            gate.tick();
            next.handle(msg)
        }) as Arc<dyn Handler>
    };

    (wait, middleware)
}
