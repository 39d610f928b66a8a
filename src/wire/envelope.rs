//! The wire envelope carried by every published message.

use super::binary::{Decoder, Encoder, WireError};

/// Number of bytes a length slot occupies on the wire.
const SLOT: usize = 8;

/// Wire-level record serialized once at publish time and deserialized
/// once per delivery attempt.
///
/// `id` is producer-assigned and globally unique; `aggregate_id` groups
/// causally related messages; `body` is opaque and may be empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub id: String,
    pub aggregate_id: String,
    pub body: Vec<u8>,
}

impl Envelope {
    pub fn new(id: impl Into<String>, aggregate_id: impl Into<String>, body: Vec<u8>) -> Self {
        Envelope {
            id: id.into(),
            aggregate_id: aggregate_id.into(),
            body,
        }
    }

    /// Serialize the envelope: `id`, `aggregate_id`, `body`, each as a
    /// length-slot-prefixed field.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let size = self.id.len() + SLOT + self.aggregate_id.len() + SLOT + self.body.len() + SLOT;

        let mut enc = Encoder::with_capacity(size);
        enc.encode_str(&self.id)?;
        enc.encode_str(&self.aggregate_id)?;
        enc.encode_bytes(&self.body)?;

        Ok(enc.into_bytes())
    }

    /// Deserialize an envelope from received bytes.
    ///
    /// Fails with a [`WireError`] on truncated or corrupt input; that
    /// is terminal for the delivery attempt, since redelivery cannot
    /// change the bytes.
    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        let mut dec = Decoder::new(data);

        let id = dec.decode_str()?.to_string();
        let aggregate_id = dec.decode_str()?.to_string();
        let body = dec.decode_bytes()?.to_vec();

        Ok(Envelope {
            id,
            aggregate_id,
            body,
        })
    }
}
