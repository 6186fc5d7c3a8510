use std::path::PathBuf;

use thiserror::Error;

use crate::core::cbor::CodecError;
use crate::domain::cert::CertError;
use crate::domain::smp::WireError;
use crate::ports::crypto::CryptoError;
use crate::ports::key_store::StoreError;

/// Error returned by every public SMP operation.
///
/// Each variant belongs to one [`ErrorKind`]; callers that only care about
/// the class of failure match on [`SmpError::kind`].
#[derive(Debug, Error)]
pub enum SmpError {
    /// Invalid, missing or out-of-range caller argument.
    #[error("bad parameters: {0}")]
    BadParams(String),

    /// Session unusable for the requested operation (e.g. not yet key-established).
    #[error("bad session: {0}")]
    BadSession(String),

    #[error("key store failure: {0}")]
    Storage(#[from] StoreError),

    /// A bootstrap credential file could not be read.
    #[error("cannot read credential file {}: {source}", path.display())]
    CredentialFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Signing, verification, agreement or AEAD failure, including tag mismatch.
    #[error("crypto operation failed: {0}")]
    CryptoOperation(CryptoError),

    #[error("serialization failure: {0}")]
    Serialization(#[from] CodecError),

    /// Peer input that breaks protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Failure class of an [`SmpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadParams,
    BadSession,
    Storage,
    CryptoOperation,
    Serialization,
    InvalidMessage,
}

impl SmpError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SmpError::BadParams(_) => ErrorKind::BadParams,
            SmpError::BadSession(_) => ErrorKind::BadSession,
            SmpError::Storage(_) | SmpError::CredentialFile { .. } => ErrorKind::Storage,
            SmpError::CryptoOperation(_) => ErrorKind::CryptoOperation,
            SmpError::Serialization(_) => ErrorKind::Serialization,
            SmpError::InvalidMessage(_) => ErrorKind::InvalidMessage,
        }
    }
}

impl From<CryptoError> for SmpError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::KeyStore(s) => SmpError::Storage(s),
            other => SmpError::CryptoOperation(other),
        }
    }
}

impl From<WireError> for SmpError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::Codec(c) => SmpError::Serialization(c),
            other => SmpError::InvalidMessage(other.to_string()),
        }
    }
}

impl From<CertError> for SmpError {
    fn from(e: CertError) -> Self {
        match e {
            CertError::Codec(c) => SmpError::Serialization(c),
            CertError::Crypto(c) => c.into(),
            other => SmpError::InvalidMessage(other.to_string()),
        }
    }
}
