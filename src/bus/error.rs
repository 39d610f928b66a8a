//! Error types for the publish and delivery paths.

use std::error::Error;
use std::fmt;

use crate::handler::HandlerError;
use crate::transport::TransportError;
use crate::wire::WireError;

/// Error type for publish operations.
#[derive(Debug)]
pub enum PublishError {
    /// A subject is required to create or send a message.
    SubjectRequired,
    /// Envelope serialization failed.
    Wire(WireError),
    /// Typed payload serialization failed.
    Payload(bitcode::Error),
    /// A payload codec failed to transform the payload.
    Codec(Box<dyn Error + Send + Sync>),
    /// The transport refused the publish.
    Transport(TransportError),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::SubjectRequired => write!(f, "subject is required"),
            PublishError::Wire(e) => write!(f, "envelope encoding failed: {}", e),
            PublishError::Payload(e) => write!(f, "payload encoding failed: {}", e),
            PublishError::Codec(e) => write!(f, "payload codec failed: {}", e),
            PublishError::Transport(e) => write!(f, "publish failed: {}", e),
        }
    }
}

impl Error for PublishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PublishError::Wire(e) => Some(e),
            PublishError::Payload(e) => Some(e),
            PublishError::Codec(e) => Some(e.as_ref()),
            PublishError::Transport(e) => Some(e),
            PublishError::SubjectRequired => None,
        }
    }
}

impl From<WireError> for PublishError {
    fn from(err: WireError) -> Self {
        PublishError::Wire(err)
    }
}

impl From<TransportError> for PublishError {
    fn from(err: TransportError) -> Self {
        PublishError::Transport(err)
    }
}

/// Error surfaced to the configured error sink by the delivery
/// pipeline.
///
/// Duplicate detection is not represented here: a duplicate is a
/// silent short-circuit to acknowledge, not an error.
#[derive(Debug)]
pub enum DeliveryError {
    /// The envelope could not be decoded. Terminal for the delivery:
    /// the message is acknowledged and dropped, since redelivery
    /// cannot change the bytes.
    Decode { subject: String, source: WireError },
    /// The handler returned an error. The message is left
    /// unacknowledged and the transport redelivers it.
    Handler {
        subject: String,
        id: String,
        source: HandlerError,
    },
    /// Acknowledging the delivery failed.
    Ack {
        subject: String,
        source: TransportError,
    },
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Decode { subject, source } => {
                write!(f, "failed to decode envelope on {}: {}", subject, source)
            }
            DeliveryError::Handler {
                subject,
                id,
                source,
            } => write!(f, "handler for {} failed on message {}: {}", subject, id, source),
            DeliveryError::Ack { subject, source } => {
                write!(f, "failed to acknowledge delivery on {}: {}", subject, source)
            }
        }
    }
}

impl Error for DeliveryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DeliveryError::Decode { source, .. } => Some(source),
            DeliveryError::Handler { source, .. } => Some(source),
            DeliveryError::Ack { source, .. } => Some(source),
        }
    }
}
