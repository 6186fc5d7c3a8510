//! CBOR helpers shared by every SMP wire schema.
//!
//! This module is *infrastructure*, not domain-specific:
//! - `to_cbor` serializes any `T: Serialize` using **ciborium** (deterministic by default).
//! - `CborSeqWriter` / `CborSeqReader` produce and consume an RFC 8742 CBOR
//!   *sequence*: a flat run of self-delimiting items with no outer array. Every
//!   field carries its own CBOR length prefix, so a reader can stop after the
//!   first item (the SMP header) without touching the rest of the buffer.
//!
//! Notes:
//! - Readers are strict: a typed read fails on the wrong major type, and
//!   `finish()` rejects trailing items.
//! - Only three item kinds are used on the wire: unsigned integers, text
//!   strings and byte strings.

use ciborium::value::{Integer, Value};
use serde::Serialize;
use std::io::Cursor;

/// Errors produced by the CBOR codec.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// Error produced during serialization.
    #[error("CBOR serialize error: {0}")]
    Ser(#[from] ciborium::ser::Error<std::io::Error>),

    /// Error produced during deserialization of a single item.
    #[error("CBOR deserialize error: {0}")]
    De(#[from] ciborium::de::Error<std::io::Error>),

    /// A sequence expected to be complete still had unread items.
    #[error("trailing bytes after CBOR sequence")]
    Trailing,

    /// The sequence ended before a required field.
    #[error("missing CBOR item for `{field}`")]
    MissingItem { field: &'static str },

    /// An item had the wrong CBOR major type.
    #[error("CBOR item for `{field}` must be {expected}")]
    UnexpectedItem {
        field: &'static str,
        expected: &'static str,
    },

    /// A negative or oversized integer was found where a `u64` was expected.
    #[error("CBOR integer for `{field}` out of range")]
    IntegerRange { field: &'static str },
}

/// Serialize any `T: Serialize` to CBOR bytes (deterministic under ciborium).
///
/// # Errors
///
/// Returns a [`CodecError::Ser`] if serialization fails.
pub fn to_cbor<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(64);
    ciborium::ser::into_writer(v, &mut buf)?;
    Ok(buf)
}

/// Append-only writer for a CBOR sequence.
#[derive(Debug, Default)]
pub struct CborSeqWriter {
    buf: Vec<u8>,
}

impl CborSeqWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, item: &Value) -> Result<&mut Self, CodecError> {
        let encoded = to_cbor(item)?;
        self.buf.extend_from_slice(&encoded);
        Ok(self)
    }

    /// Append an unsigned integer item.
    ///
    /// # Errors
    /// Returns [`CodecError::Ser`] if the item cannot be encoded.
    pub fn uint(&mut self, v: u64) -> Result<&mut Self, CodecError> {
        self.push(&Value::Integer(Integer::from(v)))
    }

    /// Append a text string item.
    ///
    /// # Errors
    /// Returns [`CodecError::Ser`] if the item cannot be encoded.
    pub fn text(&mut self, v: &str) -> Result<&mut Self, CodecError> {
        self.push(&Value::Text(v.to_owned()))
    }

    /// Append a byte string item.
    ///
    /// # Errors
    /// Returns [`CodecError::Ser`] if the item cannot be encoded.
    pub fn bytes(&mut self, v: &[u8]) -> Result<&mut Self, CodecError> {
        self.push(&Value::Bytes(v.to_vec()))
    }

    /// Consume the writer and return the encoded sequence.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Strict, forward-only reader over a CBOR sequence.
pub struct CborSeqReader<'a> {
    cur: Cursor<&'a [u8]>,
}

impl<'a> CborSeqReader<'a> {
    #[must_use]
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            cur: Cursor::new(input),
        }
    }

    /// True once every byte of the input has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let len = self.cur.get_ref().len() as u64;
        self.cur.position() >= len
    }

    fn next_value(&mut self, field: &'static str) -> Result<Value, CodecError> {
        if self.is_empty() {
            return Err(CodecError::MissingItem { field });
        }
        Ok(ciborium::de::from_reader(&mut self.cur)?)
    }

    /// Read an unsigned integer item.
    ///
    /// # Errors
    /// * [`CodecError::MissingItem`] if the sequence is exhausted.
    /// * [`CodecError::UnexpectedItem`] if the item is not an integer.
    /// * [`CodecError::IntegerRange`] if the integer does not fit a `u64`.
    pub fn uint(&mut self, field: &'static str) -> Result<u64, CodecError> {
        match self.next_value(field)? {
            Value::Integer(i) => u64::try_from(i).map_err(|_| CodecError::IntegerRange { field }),
            _ => Err(CodecError::UnexpectedItem {
                field,
                expected: "an unsigned integer",
            }),
        }
    }

    /// Read a text string item.
    ///
    /// # Errors
    /// * [`CodecError::MissingItem`] if the sequence is exhausted.
    /// * [`CodecError::UnexpectedItem`] if the item is not a text string.
    pub fn text(&mut self, field: &'static str) -> Result<String, CodecError> {
        match self.next_value(field)? {
            Value::Text(s) => Ok(s),
            _ => Err(CodecError::UnexpectedItem {
                field,
                expected: "a text string",
            }),
        }
    }

    /// Read a byte string item.
    ///
    /// # Errors
    /// * [`CodecError::MissingItem`] if the sequence is exhausted.
    /// * [`CodecError::UnexpectedItem`] if the item is not a byte string.
    pub fn bytes(&mut self, field: &'static str) -> Result<Vec<u8>, CodecError> {
        match self.next_value(field)? {
            Value::Bytes(b) => Ok(b),
            _ => Err(CodecError::UnexpectedItem {
                field,
                expected: "a byte string",
            }),
        }
    }

    /// Require that the whole sequence has been consumed.
    ///
    /// # Errors
    /// Returns [`CodecError::Trailing`] if unread bytes remain.
    pub fn finish(self) -> Result<(), CodecError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CodecError::Trailing)
        }
    }
}
