//! Wire format - compact binary envelope codec.
//!
//! Serializes message identity and payload for the transport:
//! every variable-length field is an 8-byte varint length slot followed
//! by the raw bytes, in the fixed order `id`, `aggregate_id`, `body`.
//! The codec performs no compression or checksum; integrity is the
//! transport's responsibility.

mod binary;
mod envelope;

pub use binary::{Decoder, Encoder, WireError};
pub use envelope::Envelope;
