//! Subject-routed pub/sub delivery layer.
//!
//! Sits between application handlers and a durable publish/subscribe
//! transport: declare hierarchical subject routes, attach composable
//! middleware, and receive messages fan-out or load-balanced with
//! at-least-once delivery, duplicate suppression, and a warm-up gate
//! that keeps side-effecting handlers quiet until the backlog has
//! drained.

mod bus;
mod codec;
mod dedup;
mod handler;
mod ident;
mod message;
pub mod middleware;
mod router;
pub mod transport;
mod warmup;
pub mod wire;

pub use bus::{Bus, DeliveryError, MessageOptions, Options, OutboundMessage, PublishError, Sender};
pub use codec::Codec;
pub use dedup::IdempotencyCache;
pub use handler::{wrap, Handler, HandlerError, Middleware};
pub use ident::{IdGenerator, UuidGenerator};
pub use message::{Message, MessageError};
pub use router::{check_path, merge_path, PathError, Receiver, SEPARATOR};
pub use transport::{
    Delivery, InMemoryTransport, SubscribeOptions, Subscription, Transport, TransportError,
};
pub use warmup::WarmupGate;
pub use wire::{Decoder, Encoder, Envelope, WireError};
