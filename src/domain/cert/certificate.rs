use super::errors::CertError;
use super::{CERT_VERSION, PUBKEY_ALG_EC_P256, SIG_ALG_ECDSA_P256_SHA256};
use crate::core::cbor::{CborSeqReader, CborSeqWriter};
use crate::ports::crypto::EccOptions;

/// Signed body of a certificate.
///
/// Wire form: `[version][signatureAlgorithm][issuerId][subjectId][subjectPubKeyAlgorithm][subjectPubKey]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateTbs {
    pub version: u64,
    /// Algorithm the *issuer* used to sign this body.
    pub signature_algorithm: u64,
    pub issuer_id: String,
    pub subject_id: String,
    pub subject_public_key_algorithm: u64,
    /// Uncompressed P-256 point for the supported algorithm.
    pub subject_public_key: Vec<u8>,
}

impl CertificateTbs {
    /// # Errors
    /// Codec errors only.
    pub fn encode(&self) -> Result<Vec<u8>, CertError> {
        let mut w = CborSeqWriter::new();
        w.uint(self.version)?
            .uint(self.signature_algorithm)?
            .text(&self.issuer_id)?
            .text(&self.subject_id)?
            .uint(self.subject_public_key_algorithm)?
            .bytes(&self.subject_public_key)?;
        Ok(w.finish())
    }

    /// # Errors
    /// Codec errors, including trailing data.
    pub fn decode(bytes: &[u8]) -> Result<Self, CertError> {
        let mut r = CborSeqReader::new(bytes);
        let tbs = Self {
            version: r.uint("tbs.version")?,
            signature_algorithm: r.uint("tbs.signatureAlgorithm")?,
            issuer_id: r.text("tbs.issuerId")?,
            subject_id: r.text("tbs.subjectId")?,
            subject_public_key_algorithm: r.uint("tbs.subjectPubKeyAlgorithm")?,
            subject_public_key: r.bytes("tbs.subjectPubKey")?,
        };
        r.finish()?;
        Ok(tbs)
    }
}

/// Outer certificate: the encoded signed body plus the issuer's signature over it.
///
/// Wire form: `[version][encodedTbs][signature]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateContainer {
    pub version: u64,
    pub encoded_tbs: Vec<u8>,
    pub signature: Vec<u8>,
}

impl CertificateContainer {
    /// # Errors
    /// Codec errors only.
    pub fn encode(&self) -> Result<Vec<u8>, CertError> {
        let mut w = CborSeqWriter::new();
        w.uint(self.version)?
            .bytes(&self.encoded_tbs)?
            .bytes(&self.signature)?;
        Ok(w.finish())
    }

    /// # Errors
    /// Codec errors, including trailing data.
    pub fn decode(bytes: &[u8]) -> Result<Self, CertError> {
        let mut r = CborSeqReader::new(bytes);
        let c = Self {
            version: r.uint("container.version")?,
            encoded_tbs: r.bytes("container.encodedTbs")?,
            signature: r.bytes("container.signature")?,
        };
        r.finish()?;
        Ok(c)
    }
}

/// A parsed certificate: container and decoded body, with versions checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub container: CertificateContainer,
    pub tbs: CertificateTbs,
}

impl Certificate {
    /// Parse a container blob and its embedded body.
    ///
    /// # Errors
    /// Codec errors, or [`CertError::VersionMismatch`] if the two versions
    /// disagree or are not the supported version.
    pub fn parse(bytes: &[u8]) -> Result<Self, CertError> {
        let container = CertificateContainer::decode(bytes)?;
        let tbs = CertificateTbs::decode(&container.encoded_tbs)?;
        if container.version != tbs.version || tbs.version != CERT_VERSION {
            return Err(CertError::VersionMismatch {
                container: container.version,
                tbs: tbs.version,
            });
        }
        Ok(Self { container, tbs })
    }

    /// Curve and hash for verifying signatures made by this certificate's
    /// subject key.
    ///
    /// # Errors
    /// [`CertError::UnsupportedAlgorithm`] for unrecognized identifiers.
    pub fn subject_key_options(&self) -> Result<EccOptions, CertError> {
        subject_key_options(self.tbs.subject_public_key_algorithm)
    }

    /// Curve and hash the issuer used to sign this certificate.
    ///
    /// # Errors
    /// [`CertError::UnsupportedAlgorithm`] for unrecognized identifiers.
    pub fn signature_options(&self) -> Result<EccOptions, CertError> {
        signature_options(self.tbs.signature_algorithm)
    }

    #[must_use]
    pub fn subject_public_key(&self) -> &[u8] {
        &self.tbs.subject_public_key
    }
}

pub(crate) fn signature_options(id: u64) -> Result<EccOptions, CertError> {
    match id {
        SIG_ALG_ECDSA_P256_SHA256 => Ok(EccOptions::P256_SHA256),
        other => Err(CertError::UnsupportedAlgorithm {
            field: "signature",
            id: other,
        }),
    }
}

pub(crate) fn subject_key_options(id: u64) -> Result<EccOptions, CertError> {
    match id {
        PUBKEY_ALG_EC_P256 => Ok(EccOptions::P256_SHA256),
        other => Err(CertError::UnsupportedAlgorithm {
            field: "subject public key",
            id: other,
        }),
    }
}
