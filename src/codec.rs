//! Payload codec seam.
//!
//! A codec is an optional byte-level transform applied to typed message
//! payloads; encryption of sensitive fields is the motivating case.
//! The crate ships no implementation; the seam exists so a collaborator
//! can be slotted in via [`Options::with_codec`](crate::Options::with_codec).
//!
//! Chains compose: codecs run in registration order when encoding and
//! in reverse order when decoding. The chain covers the typed payload
//! path only (`Sender` encode helpers and
//! [`Message::decode`](crate::Message::decode)); handlers reading the
//! raw `body` bytes see the transformed bytes as-is.

use std::error::Error;

/// A reversible transform over payload bytes.
pub trait Codec: Send + Sync {
    /// Transform payload bytes in place at publish time.
    fn encode(&self, payload: &mut Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Undo the transform at delivery time.
    fn decode(&self, payload: &mut Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Toy codec: XOR with a fixed key byte.
    struct Xor(u8);

    impl Codec for Xor {
        fn encode(&self, payload: &mut Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>> {
            for byte in payload.iter_mut() {
                *byte ^= self.0;
            }
            Ok(())
        }

        fn decode(&self, payload: &mut Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.encode(payload)
        }
    }

    #[test]
    fn encode_then_decode_restores_payload() {
        let codec = Xor(0x5a);
        let mut payload = b"secret".to_vec();

        codec.encode(&mut payload).unwrap();
        assert_ne!(payload, b"secret");

        codec.decode(&mut payload).unwrap();
        assert_eq!(payload, b"secret");
    }
}
