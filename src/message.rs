//! The decoded, routable unit handed to handlers.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::codec::Codec;

/// Error type for typed payload extraction.
#[derive(Debug)]
pub enum MessageError {
    /// The message carries no body to decode.
    EmptyBody,
    /// A payload codec failed to reverse its transform.
    Codec(Box<dyn Error + Send + Sync>),
    /// The payload bytes do not deserialize into the requested type.
    Payload(bitcode::Error),
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::EmptyBody => write!(f, "message body is empty"),
            MessageError::Codec(e) => write!(f, "payload codec failed: {}", e),
            MessageError::Payload(e) => write!(f, "payload decode failed: {}", e),
        }
    }
}

impl Error for MessageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MessageError::Codec(e) => Some(e.as_ref()),
            MessageError::Payload(e) => Some(e),
            MessageError::EmptyBody => None,
        }
    }
}

/// A delivered message.
///
/// Envelope fields plus the transport-assigned `sequence` (monotonic
/// per subject) and `timestamp` (delivery time). The delivery pipeline
/// owns the message for the duration of one handler invocation;
/// handlers that need it longer must clone it, since the
/// transport-assigned fields are only valid for that delivery.
#[derive(Clone)]
pub struct Message {
    pub id: String,
    pub aggregate_id: String,
    pub subject: String,
    pub body: Vec<u8>,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    codecs: Arc<Vec<Arc<dyn Codec>>>,
}

impl Message {
    /// Construct a message by hand. Mainly useful in tests; the
    /// delivery pipeline builds real messages from decoded envelopes.
    pub fn new(
        id: impl Into<String>,
        aggregate_id: impl Into<String>,
        subject: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        Message {
            id: id.into(),
            aggregate_id: aggregate_id.into(),
            subject: subject.into(),
            body,
            sequence: 0,
            timestamp: Utc::now(),
            codecs: Arc::new(Vec::new()),
        }
    }

    pub(crate) fn from_parts(
        id: String,
        aggregate_id: String,
        subject: String,
        body: Vec<u8>,
        sequence: u64,
        timestamp: DateTime<Utc>,
        codecs: Arc<Vec<Arc<dyn Codec>>>,
    ) -> Self {
        Message {
            id,
            aggregate_id,
            subject,
            body,
            sequence,
            timestamp,
            codecs,
        }
    }

    /// Decode the body into a typed payload.
    ///
    /// Runs the configured codec chain in reverse, then deserializes
    /// the bitcode bytes.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, MessageError> {
        if self.body.is_empty() {
            return Err(MessageError::EmptyBody);
        }

        let mut bytes = self.body.clone();
        for codec in self.codecs.iter().rev() {
            codec.decode(&mut bytes).map_err(MessageError::Codec)?;
        }

        bitcode::deserialize(&bytes).map_err(MessageError::Payload)
    }

    /// The body as a string, when it is valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("aggregate_id", &self.aggregate_id)
            .field("subject", &self.subject)
            .field("body_len", &self.body.len())
            .field("sequence", &self.sequence)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        count: u32,
    }

    #[test]
    fn typed_decode_round_trips() {
        let body = bitcode::serialize(&Ping { count: 3 }).unwrap();
        let msg = Message::new("1", "agg", "root.ping", body);

        assert_eq!(msg.decode::<Ping>().unwrap(), Ping { count: 3 });
    }

    #[test]
    fn empty_body_is_an_error() {
        let msg = Message::new("1", "agg", "root.ping", Vec::new());
        assert!(matches!(msg.decode::<Ping>(), Err(MessageError::EmptyBody)));
    }

    #[test]
    fn body_str_requires_utf8() {
        let msg = Message::new("1", "agg", "root.raw", b"hello".to_vec());
        assert_eq!(msg.body_str(), Some("hello"));

        let msg = Message::new("1", "agg", "root.raw", vec![0xff, 0xfe]);
        assert_eq!(msg.body_str(), None);
    }
}
