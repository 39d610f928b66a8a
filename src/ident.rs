//! Message id generation.
//!
//! Id generation is an injected dependency, not a process-wide
//! function variable: whoever constructs messages receives a generator
//! at construction time, which keeps message creation deterministic in
//! tests.

use uuid::Uuid;

/// Produces globally unique message and aggregate ids.
///
/// Blanket-implemented for closures, so `|| "fixed".to_string()` works
/// as a deterministic generator in tests.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// The default generator: random v4 UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
