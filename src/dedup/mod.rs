//! Duplicate suppression - bounded window of recently-seen message ids.
//!
//! At-least-once transports redeliver until acknowledged, so the same
//! message id can arrive more than once. The cache answers "have I
//! processed this id before?" so the delivery pipeline can acknowledge
//! duplicates without re-running handlers.

mod cache;

pub use cache::IdempotencyCache;
