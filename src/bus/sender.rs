//! Publish side: message construction and envelope encoding.

use std::sync::Arc;

use serde::Serialize;

use crate::wire::Envelope;

use super::error::PublishError;
use super::inner::BusInner;

/// A message ready to publish: identity assigned, body encoded.
#[derive(Clone, Debug)]
pub struct OutboundMessage {
    pub id: String,
    pub aggregate_id: String,
    pub subject: String,
    pub body: Vec<u8>,
}

/// What to publish. The subject is required; a missing aggregate id is
/// generated alongside the message id, and a missing body publishes an
/// empty payload.
#[derive(Clone, Debug, Default)]
pub struct MessageOptions {
    subject: String,
    aggregate_id: Option<String>,
    body: Option<Vec<u8>>,
}

impl MessageOptions {
    pub fn new(subject: impl Into<String>) -> Self {
        MessageOptions {
            subject: subject.into(),
            aggregate_id: None,
            body: None,
        }
    }

    /// Group this message with causally related ones. Generated when
    /// not supplied.
    pub fn aggregate_id(mut self, id: impl Into<String>) -> Self {
        self.aggregate_id = Some(id.into());
        self
    }

    /// Pre-encoded body bytes. For typed payloads use
    /// [`Sender::encode_body`].
    pub fn body(mut self, bytes: Vec<u8>) -> Self {
        self.body = Some(bytes);
        self
    }
}

/// Publishes messages through the bus's transport.
///
/// ## Example
///
/// ```ignore
/// let sender = bus.sender();
/// sender.publish("root.orders.created", &OrderCreated { id: 7 })?;
/// ```
#[derive(Clone)]
pub struct Sender {
    inner: Arc<BusInner>,
}

impl Sender {
    pub(crate) fn new(inner: Arc<BusInner>) -> Self {
        Sender { inner }
    }

    /// Build an [`OutboundMessage`]: generate the message id (and the
    /// aggregate id when none was supplied) and attach the body.
    pub fn create(&self, options: MessageOptions) -> Result<OutboundMessage, PublishError> {
        if options.subject.is_empty() {
            return Err(PublishError::SubjectRequired);
        }

        let id_generator = &self.inner.options.id_generator;
        let id = id_generator.generate();
        let aggregate_id = options
            .aggregate_id
            .unwrap_or_else(|| id_generator.generate());

        Ok(OutboundMessage {
            id,
            aggregate_id,
            subject: options.subject,
            body: options.body.unwrap_or_default(),
        })
    }

    /// Serialize a typed payload and run it through the codec chain,
    /// in registration order.
    pub fn encode_body<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, PublishError> {
        let mut bytes = bitcode::serialize(value).map_err(PublishError::Payload)?;
        for codec in self.inner.codecs.iter() {
            codec.encode(&mut bytes).map_err(PublishError::Codec)?;
        }
        Ok(bytes)
    }

    /// Envelope-encode and publish a prepared message.
    pub fn send(&self, message: &OutboundMessage) -> Result<(), PublishError> {
        if message.subject.is_empty() {
            return Err(PublishError::SubjectRequired);
        }

        let envelope = Envelope::new(
            message.id.clone(),
            message.aggregate_id.clone(),
            message.body.clone(),
        );
        let data = envelope.encode()?;

        self.inner.transport.publish(&message.subject, &data)?;
        Ok(())
    }

    /// Create and publish a message with a typed payload.
    pub fn publish<T: Serialize>(&self, subject: &str, payload: &T) -> Result<(), PublishError> {
        let body = self.encode_body(payload)?;
        let message = self.create(MessageOptions::new(subject).body(body))?;
        self.send(&message)
    }

    /// Create and publish a message with raw body bytes.
    pub fn publish_bytes(&self, subject: &str, body: Vec<u8>) -> Result<(), PublishError> {
        let message = self.create(MessageOptions::new(subject).body(body))?;
        self.send(&message)
    }
}
