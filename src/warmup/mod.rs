//! Warm-up detection - "has this service caught up on backlog?"
//!
//! The gate reports, exactly once, that no handler has ticked within a
//! timeout. The delivery pipeline uses it to defer side-effecting
//! queue-group handlers until settlement, so a load-balanced worker
//! does not emit duplicate downstream effects while several instances
//! replay history at the same time.

mod gate;

pub use gate::WarmupGate;
