//! Certificate schema used to authenticate SMP establishment messages.
//!
//! A certificate is a CBOR-sequence container wrapping an encoded to-be-signed
//! body; the container signature is made by the issuer over the encoded body
//! bytes exactly as carried.

pub mod certificate;
pub mod errors;

pub use certificate::{Certificate, CertificateContainer, CertificateTbs};
pub use errors::CertError;

/// The only certificate format version.
pub const CERT_VERSION: u64 = 1;
/// ECDSA over NIST P-256 with SHA-256.
pub const SIG_ALG_ECDSA_P256_SHA256: u64 = 1;
/// NIST P-256 public key, uncompressed point.
pub const PUBKEY_ALG_EC_P256: u64 = 1;
