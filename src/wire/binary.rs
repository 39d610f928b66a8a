//! Length-prefixed binary encoding primitives.
//!
//! Every variable-length value is written as an 8-byte slot holding the
//! byte count as a varint, followed by the raw bytes. Fixed-width slots
//! keep the layout trivially seekable while the varint keeps small
//! lengths compact inside the slot.

use std::error::Error;
use std::fmt;
use std::str;

use chrono::{DateTime, SecondsFormat, Utc};

/// Width of a length/number slot in bytes.
const SLOT: usize = 8;

/// Error type for wire-level encoding and decoding.
#[derive(Debug)]
pub enum WireError {
    /// The destination buffer cannot hold the value plus its length slot.
    BufferTooSmall { needed: usize, remaining: usize },
    /// The value does not fit in an 8-byte varint slot.
    ValueTooLarge(u64),
    /// A length slot does not contain a parsable varint.
    InvalidVarint,
    /// The buffer ended before the announced length.
    UnexpectedEof,
    /// A decoded string field is not valid UTF-8.
    InvalidUtf8(str::Utf8Error),
    /// A decoded timestamp field is not a valid RFC3339 string.
    InvalidTimestamp(chrono::ParseError),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::BufferTooSmall { needed, remaining } => write!(
                f,
                "buffer too small: need {} bytes, {} remaining",
                needed, remaining
            ),
            WireError::ValueTooLarge(val) => {
                write!(f, "value {} does not fit in an 8-byte varint slot", val)
            }
            WireError::InvalidVarint => write!(f, "length slot holds no valid varint"),
            WireError::UnexpectedEof => write!(f, "buffer ended before announced length"),
            WireError::InvalidUtf8(e) => write!(f, "string field is not valid utf-8: {}", e),
            WireError::InvalidTimestamp(e) => write!(f, "timestamp field is not rfc3339: {}", e),
        }
    }
}

impl Error for WireError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WireError::InvalidUtf8(e) => Some(e),
            WireError::InvalidTimestamp(e) => Some(e),
            _ => None,
        }
    }
}

/// Write `val` as a varint into `buf`. Returns the number of bytes used.
///
/// `buf` must be large enough; callers reserve a full slot.
fn put_uvarint(buf: &mut [u8], mut val: u64) -> usize {
    let mut i = 0;
    while val >= 0x80 {
        buf[i] = (val as u8) | 0x80;
        val >>= 7;
        i += 1;
    }
    buf[i] = val as u8;
    i + 1
}

/// Read a varint from `buf`. Returns `None` when no terminated varint
/// is found within the slice.
fn uvarint(buf: &[u8]) -> Option<u64> {
    let mut val: u64 = 0;
    let mut shift = 0;
    for &byte in buf {
        if byte < 0x80 {
            return Some(val | (u64::from(byte) << shift));
        }
        val |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }
    None
}

/// Fixed-capacity encoder. The capacity is chosen at construction and
/// never grows; running out of room is an error, not a reallocation.
pub struct Encoder {
    buffer: Vec<u8>,
    idx: usize,
}

impl Encoder {
    /// Create an encoder with a fixed capacity in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Encoder {
            buffer: vec![0; capacity],
            idx: 0,
        }
    }

    /// Rewind the cursor so the buffer can be reused.
    pub fn reset(&mut self) {
        self.idx = 0;
    }

    /// Encode a number into one 8-byte varint slot.
    pub fn encode_u64(&mut self, val: u64) -> Result<(), WireError> {
        if self.idx + SLOT > self.buffer.len() {
            return Err(WireError::BufferTooSmall {
                needed: SLOT,
                remaining: self.buffer.len() - self.idx,
            });
        }

        // A slot holds at most 8 varint bytes, i.e. 56 bits of payload.
        if val >= 1 << 56 {
            return Err(WireError::ValueTooLarge(val));
        }

        put_uvarint(&mut self.buffer[self.idx..self.idx + SLOT], val);
        self.idx += SLOT;
        Ok(())
    }

    /// Encode raw bytes: a length slot followed by the bytes themselves.
    ///
    /// Fails without touching the buffer when the slot plus the payload
    /// would overflow the remaining capacity.
    pub fn encode_bytes(&mut self, val: &[u8]) -> Result<(), WireError> {
        let needed = SLOT + val.len();
        if self.idx + needed > self.buffer.len() {
            return Err(WireError::BufferTooSmall {
                needed,
                remaining: self.buffer.len() - self.idx,
            });
        }

        self.encode_u64(val.len() as u64)?;
        self.buffer[self.idx..self.idx + val.len()].copy_from_slice(val);
        self.idx += val.len();
        Ok(())
    }

    /// Encode a string with the same layout as [`Encoder::encode_bytes`].
    pub fn encode_str(&mut self, val: &str) -> Result<(), WireError> {
        self.encode_bytes(val.as_bytes())
    }

    /// Encode a timestamp as an RFC3339 string with nanosecond precision.
    pub fn encode_time(&mut self, val: DateTime<Utc>) -> Result<(), WireError> {
        let encoded = val.to_rfc3339_opts(SecondsFormat::Nanos, true);
        self.encode_str(&encoded)
    }

    /// The encoded bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer[..self.idx]
    }

    /// Consume the encoder, returning the encoded bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buffer.truncate(self.idx);
        self.buffer
    }
}

/// Zero-copy decoder over a received byte slice.
pub struct Decoder<'a> {
    buffer: &'a [u8],
    idx: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Decoder {
            buffer: data,
            idx: 0,
        }
    }

    /// Decode a number from one 8-byte varint slot.
    pub fn decode_u64(&mut self) -> Result<u64, WireError> {
        if self.idx + SLOT > self.buffer.len() {
            return Err(WireError::UnexpectedEof);
        }

        let val =
            uvarint(&self.buffer[self.idx..self.idx + SLOT]).ok_or(WireError::InvalidVarint)?;
        self.idx += SLOT;
        Ok(val)
    }

    /// Decode a length-prefixed byte field.
    pub fn decode_bytes(&mut self) -> Result<&'a [u8], WireError> {
        let len = self.decode_u64()? as usize;
        if len > self.buffer.len() - self.idx {
            return Err(WireError::UnexpectedEof);
        }

        let val = &self.buffer[self.idx..self.idx + len];
        self.idx += len;
        Ok(val)
    }

    /// Decode a length-prefixed string field.
    pub fn decode_str(&mut self) -> Result<&'a str, WireError> {
        let bytes = self.decode_bytes()?;
        str::from_utf8(bytes).map_err(WireError::InvalidUtf8)
    }

    /// Decode an RFC3339 timestamp field.
    pub fn decode_time(&mut self) -> Result<DateTime<Utc>, WireError> {
        let encoded = self.decode_str()?;
        DateTime::parse_from_rfc3339(encoded)
            .map(|t| t.with_timezone(&Utc))
            .map_err(WireError::InvalidTimestamp)
    }
}
