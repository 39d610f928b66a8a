//! Transport seam - the durable pub/sub collaborator.
//!
//! The router consumes this surface and nothing more: publish bytes to
//! a subject, subscribe (fan-out or queue-group) with manual
//! acknowledge, receive one callback per delivered message, acknowledge
//! or not. Connection management, storage, replication, and redelivery
//! policy all live behind the trait.
//!
//! [`InMemoryTransport`] is the bundled implementation for tests and
//! single-process use; it delivers synchronously and exposes manual
//! redelivery so at-least-once behavior stays deterministic under test.

mod in_memory;

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

pub use in_memory::InMemoryTransport;

/// Error type for transport operations.
#[derive(Debug)]
pub enum TransportError {
    /// The connection to the broker failed or is gone.
    ConnectionFailed(String),
    /// The broker rejected the operation.
    Rejected(String),
    /// Acknowledging a delivery failed.
    AckFailed(String),
    /// The subscription or transport is closed.
    Closed,
    /// Other error.
    Other(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectionFailed(msg) => write!(f, "connection failed: {}", msg),
            TransportError::Rejected(msg) => write!(f, "rejected: {}", msg),
            TransportError::AckFailed(msg) => write!(f, "ack failed: {}", msg),
            TransportError::Closed => write!(f, "transport closed"),
            TransportError::Other(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransportError::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Options applied when binding a subscription.
#[derive(Clone, Debug, Default)]
pub struct SubscribeOptions {
    /// Broker-side identifier letting a disconnected consumer resume
    /// its position.
    pub durable_name: Option<String>,
    /// Resume delivery at the first sequence strictly greater than
    /// this high-water mark. `None` delivers all available messages.
    pub start_sequence: Option<u64>,
    /// How long the broker waits for an acknowledge before treating
    /// the delivery as failed and redelivering.
    pub ack_wait: Option<Duration>,
}

/// One delivery attempt of one message.
///
/// The transport redelivers until [`Delivery::ack`] is called; not
/// acking is the caller's way of requesting a retry.
pub struct Delivery {
    pub payload: Vec<u8>,
    /// Transport-assigned sequence, monotonic per subject.
    pub sequence: u64,
    /// Delivery time.
    pub timestamp: DateTime<Utc>,
    ack: Box<dyn Fn() -> Result<(), TransportError> + Send + Sync>,
}

impl Delivery {
    pub fn new(
        payload: Vec<u8>,
        sequence: u64,
        timestamp: DateTime<Utc>,
        ack: impl Fn() -> Result<(), TransportError> + Send + Sync + 'static,
    ) -> Self {
        Delivery {
            payload,
            sequence,
            timestamp,
            ack: Box::new(ack),
        }
    }

    /// Acknowledge this delivery; the message will not be redelivered.
    pub fn ack(&self) -> Result<(), TransportError> {
        (self.ack)()
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("payload_len", &self.payload.len())
            .field("sequence", &self.sequence)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Callback invoked by the transport once per delivered message,
/// potentially concurrently across subjects and subscriptions.
pub type DeliveryCallback = Arc<dyn Fn(Delivery) + Send + Sync>;

/// A bound subscription.
pub trait Subscription: Send {
    /// Stop delivery and drop any broker-side durable state.
    fn unsubscribe(&mut self) -> Result<(), TransportError>;

    /// Stop delivery, keeping durable state for a later resume.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// The durable publish/subscribe collaborator.
pub trait Transport: Send + Sync {
    /// Publish raw bytes to a subject.
    fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), TransportError>;

    /// Fan-out subscription: every subscriber receives every message.
    fn subscribe(
        &self,
        subject: &str,
        options: SubscribeOptions,
        callback: DeliveryCallback,
    ) -> Result<Box<dyn Subscription>, TransportError>;

    /// Load-balanced subscription: each message goes to exactly one
    /// member of `group`.
    fn queue_subscribe(
        &self,
        subject: &str,
        group: &str,
        options: SubscribeOptions,
        callback: DeliveryCallback,
    ) -> Result<Box<dyn Subscription>, TransportError>;

    /// Tear down the transport connection.
    fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
