//! Bus - the provider tying transport, gate, cache, and router together.

use std::sync::Arc;

use crate::router::Receiver;
use crate::transport::{Transport, TransportError};

use super::inner::BusInner;
use super::options::Options;
use super::sender::Sender;

/// The entry point of the crate: one bus per service process.
///
/// A bus owns the warm-up gate and the idempotency cache, and hands out
/// the two halves of the messaging surface: a [`Sender`] for publishing
/// and a root [`Receiver`] for declaring routes. Build the route tree
/// during startup, before traffic flows; receivers are not meant to be
/// reconfigured mid-stream.
///
/// ## Example
///
/// ```
/// use routed_rust::{Bus, InMemoryTransport, Options};
/// use std::sync::Arc;
///
/// let bus = Bus::new(Arc::new(InMemoryTransport::new()), Options::new());
///
/// let root = bus.receiver();
/// root.route("root.orders", |r| {
///     r.handle("created", |msg: &routed_rust::Message| {
///         println!("order created: {}", msg.id);
///         Ok(())
///     })
///     .unwrap();
/// });
/// ```
pub struct Bus {
    inner: Arc<BusInner>,
}

impl Bus {
    pub fn new(transport: Arc<dyn Transport>, options: Options) -> Self {
        Bus {
            inner: Arc::new(BusInner::new(transport, options)),
        }
    }

    /// The publish half.
    pub fn sender(&self) -> Sender {
        Sender::new(Arc::clone(&self.inner))
    }

    /// The root receiver, scoped to the empty path.
    pub fn receiver(&self) -> Receiver {
        Receiver::root(Arc::clone(&self.inner))
    }

    /// Block until the warm-up gate settles.
    ///
    /// Call after declaring routes: when this returns, the backlog has
    /// drained and queue-group handlers are live. Returns immediately
    /// when gating is disabled.
    pub fn wait_until_settled(&self) {
        self.inner.gate.wait();
    }

    /// Whether the warm-up gate has settled.
    pub fn is_settled(&self) -> bool {
        self.inner.gate.is_settled()
    }

    /// Tear down the underlying transport connection.
    pub fn close(&self) -> Result<(), TransportError> {
        self.inner.transport.close()
    }
}
