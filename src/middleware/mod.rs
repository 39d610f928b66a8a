//! Provided middleware.
//!
//! A middleware wraps a handler with cross-cutting behavior; see
//! [`Middleware`](crate::Middleware) for the composition rules. The
//! two stateful ones shipped here (duplicate suppression and
//! inactivity detection) synchronize internally and are safe under
//! concurrent delivery.

mod heartbeat;
mod idempotent;
mod logging;

pub use heartbeat::detect_inactivity;
pub use idempotent::{idempotent, IdempotentQuery};
pub use logging::logging;
