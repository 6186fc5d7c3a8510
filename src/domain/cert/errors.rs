use thiserror::Error;

use crate::core::cbor::CodecError;
use crate::ports::crypto::CryptoError;

/// Structural and crypto failures of certificate handling.
///
/// These are *errors*; a chain that parses but does not link up is reported
/// as a `ChainVerdict`, not through this type.
#[derive(Debug, Error)]
pub enum CertError {
    /// `version` differs between the container and its signed body, or is
    /// not the supported version.
    #[error("certificate version mismatch: container {container}, tbs {tbs}")]
    VersionMismatch { container: u64, tbs: u64 },

    /// Unrecognized algorithm identifier.
    #[error("unsupported {field} algorithm id {id}")]
    UnsupportedAlgorithm { field: &'static str, id: u64 },

    #[error("certificate codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("certificate crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Validation was asked to walk an empty chain.
    #[error("certificate chain is empty")]
    EmptyChain,
}
