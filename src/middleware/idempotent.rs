//! Duplicate-dropping middleware.

use std::sync::Arc;

use crate::dedup::IdempotencyCache;
use crate::handler::Handler;
use crate::message::Message;

/// Answers "has this message been seen already?" for the
/// [`idempotent`] middleware.
pub trait IdempotentQuery: Send + Sync {
    fn exists(&self, msg: &Message) -> bool;
}

impl IdempotentQuery for IdempotencyCache {
    fn exists(&self, msg: &Message) -> bool {
        !self.is_unique(&msg.id)
    }
}

/// Middleware that drops messages whose id the query has seen.
///
/// A dropped message completes with `Ok`, so the pipeline acknowledges
/// it; duplicate suppression is a short-circuit, not an error.
///
/// This duplicates what a bus-level cache
/// ([`Options::with_dedup_capacity`](crate::Options::with_dedup_capacity))
/// already does; reach for the middleware form when only part of the
/// route tree should suppress duplicates, or when suppression needs a
/// custom query.
pub fn idempotent(
    query: Arc<dyn IdempotentQuery>,
) -> impl Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync + 'static {
    move |next: Arc<dyn Handler>| {
        let query = Arc::clone(&query);
        Arc::new(move |msg: &Message| {
            if query.exists(msg) {
                return Ok(());
            }
            next.handle(msg)
        }) as Arc<dyn Handler>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::wrap;
    use std::sync::Mutex;

    #[test]
    fn duplicates_are_dropped_silently() {
        let cache = Arc::new(IdempotencyCache::new(8));
        let dedupe: crate::Middleware = Arc::new(idempotent(cache));
        let stack = vec![dedupe];

        let handled: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&handled);
        let handler = wrap(
            &stack,
            Arc::new(move |msg: &Message| {
                sink.lock().unwrap().push(msg.id.clone());
                Ok(())
            }),
        );

        let first = Message::new("m-1", "agg", "root.test", Vec::new());
        let second = Message::new("m-2", "agg", "root.test", Vec::new());

        handler.handle(&first).unwrap();
        handler.handle(&first).unwrap();
        handler.handle(&second).unwrap();

        assert_eq!(*handled.lock().unwrap(), vec!["m-1", "m-2"]);
    }
}
