use thiserror::Error;

use crate::core::cbor::CodecError;

/// Structural failures found while encoding or decoding SMP wire messages.
///
/// Codec failures mean the bytes are not a well-formed CBOR sequence; every
/// other variant means the sequence parsed but a field broke a wire invariant.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Message type code outside `1..=14`.
    #[error("unknown message type {0}")]
    UnknownMessageType(u64),

    /// Client id empty or longer than the fixed maximum.
    #[error("client id must be 1..={max} bytes, got {actual}")]
    ClientIdLength { max: usize, actual: usize },

    /// CONNECT carried a cipher-scheme id other than the supported one.
    #[error("unsupported cipher scheme {0}")]
    UnsupportedCipherScheme(u64),

    /// Establishment message declared zero certificates.
    #[error("establishment certificate chain must contain at least one element")]
    EmptyCertChain,

    /// Declared certificate count is above the chain bound or disagrees
    /// with the number of chain entries actually present.
    #[error("certificate count {declared} invalid, found {found} entries")]
    CertCountMismatch { declared: u64, found: usize },

    /// A certificate exceeded the per-certificate size bound.
    #[error("certificate too large ({0} bytes)")]
    CertTooLarge(usize),

    /// A required byte field was empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Generic field length mismatch.
    #[error("{field} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Fixed-length check shared by the params decoders.
pub(crate) fn check_len(
    field: &'static str,
    bytes: &[u8],
    expected: usize,
) -> Result<(), WireError> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(WireError::LengthMismatch {
            field,
            expected,
            actual: bytes.len(),
        })
    }
}
