//! Structured-logging middleware.

use std::sync::Arc;

use crate::handler::Handler;
use crate::message::Message;

/// Middleware that emits one `tracing` event per handled message, and
/// a warning when the wrapped handler fails.
pub fn logging() -> impl Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync + 'static {
    |next: Arc<dyn Handler>| {
        Arc::new(move |msg: &Message| {
            tracing::debug!(
                subject = %msg.subject,
                id = %msg.id,
                aggregate_id = %msg.aggregate_id,
                sequence = msg.sequence,
                "handling message"
            );

            match next.handle(msg) {
                Ok(()) => Ok(()),
                Err(err) => {
                    tracing::warn!(
                        subject = %msg.subject,
                        id = %msg.id,
                        error = %err,
                        "handler failed"
                    );
                    Err(err)
                }
            }
        }) as Arc<dyn Handler>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{wrap, HandlerError};

    #[test]
    fn passes_results_through_unchanged() {
        let middleware: crate::Middleware = Arc::new(logging());

        let ok = wrap(
            &[Arc::clone(&middleware)],
            Arc::new(|_msg: &Message| Ok(())),
        );
        let failing = wrap(
            &[middleware],
            Arc::new(|_msg: &Message| Err(HandlerError::Rejected("boom".to_string()))),
        );

        let msg = Message::new("1", "agg", "root.test", Vec::new());
        assert!(ok.handle(&msg).is_ok());
        assert!(failing.handle(&msg).is_err());
    }
}
