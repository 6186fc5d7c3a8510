// src/ports/crypto.rs
use crate::ports::key_store::{KeyId, KeyStore, StoreError};
use zeroize::Zeroizing;

/// Uncompressed SEC1 (ANSI X9.63) P-256 public point: `0x04 || X || Y`.
pub const P256_PUBLIC_KEY_LEN: usize = 65;
/// Raw P-256 private scalar.
pub const P256_PRIVATE_KEY_LEN: usize = 32;
/// Fixed-size ECDSA P-256 signature (`r || s`).
pub const ECDSA_P256_SIGNATURE_LEN: usize = 64;
/// Raw ECDH shared secret (x-coordinate).
pub const ECDH_SHARED_SECRET_LEN: usize = 32;
/// AES-256-GCM key size.
pub const AEAD_KEY_LEN: usize = 32;
/// AES-GCM 96-bit IV.
pub const AEAD_IV_LEN: usize = 12;
/// Length of the authentication tag in bytes.
pub const AEAD_TAG_LEN: usize = 16;
/// SHA-256 digest size.
pub const SHA256_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EccCurve {
    NistP256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
}

/// Curve + hash pair used for signing, verification and key agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EccOptions {
    pub curve: EccCurve,
    pub hash: HashAlgorithm,
}

impl EccOptions {
    pub const P256_SHA256: EccOptions = EccOptions {
        curve: EccCurve::NistP256,
        hash: HashAlgorithm::Sha256,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AeadAlgorithm {
    Aes256Gcm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AeadOptions {
    pub algorithm: AeadAlgorithm,
}

impl AeadOptions {
    pub const AES_256_GCM: AeadOptions = AeadOptions {
        algorithm: AeadAlgorithm::Aes256Gcm,
    };
}

/// The single cipher suite negotiated by SMP: P-256/SHA-256 ECDH+ECDSA with AES-256-GCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuite {
    pub ecc: EccOptions,
    pub aead: AeadOptions,
}

impl CipherSuite {
    pub const P256_AES256GCM: CipherSuite = CipherSuite {
        ecc: EccOptions::P256_SHA256,
        aead: AeadOptions::AES_256_GCM,
    };
}

impl Default for CipherSuite {
    fn default() -> Self {
        Self::P256_AES256GCM
    }
}

/// Outcome of a signature verification that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    Match,
    NoMatch,
}

/// Detached AEAD output: fresh IV, ciphertext (same length as plaintext) and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AeadSealed {
    pub iv: [u8; AEAD_IV_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; AEAD_TAG_LEN],
}

/// Capability surface of the cryptographic backend.
///
/// Secret keys never cross this boundary as bytes: generation and agreement
/// write their results into the [`KeyStore`] under caller-chosen identifiers,
/// and signing / AEAD look keys up by identifier. Only public keys are passed
/// by value.
///
/// Error handling:
/// - `CryptoError::AuthenticationFailed` is the only outcome of a tag mismatch;
///   no partial plaintext is ever returned.
/// - Key Store failures surface as `CryptoError::KeyStore`.
///
/// Thread safety:
/// Implementations may or may not be `Sync` / `Send`; this trait does not impose
/// thread-safety guarantees itself.
pub trait CryptoProvider {
    /// Generate an ECC key pair, storing the private scalar under `private_id`
    /// and the uncompressed public point under `public_id`.
    ///
    /// Either both entries are written or neither is.
    ///
    /// # Errors
    /// `KeyGeneration` or `KeyStore` on failure.
    fn ecc_generate_key(
        &self,
        options: &EccOptions,
        store: &mut dyn KeyStore,
        private_id: &KeyId,
        public_id: &KeyId,
    ) -> Result<(), CryptoError>;

    /// Sign `data` (hashed with `options.hash`) with the private key under `private_id`.
    ///
    /// # Errors
    /// `KeyStore`, `InvalidKey` or `Signing` on failure.
    fn ecc_sign(
        &self,
        options: &EccOptions,
        store: &dyn KeyStore,
        private_id: &KeyId,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Verify `signature` over `data` with an encoded public key.
    ///
    /// # Errors
    /// `InvalidKey` if the public key does not decode, `InvalidSignatureEncoding`
    /// if the signature is not a well-formed fixed-size signature.
    fn ecc_verify(
        &self,
        options: &EccOptions,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
    ) -> Result<SignatureCheck, CryptoError>;

    /// ECDH between the stored private key and a peer public key; the raw
    /// shared secret is written under `shared_id`.
    ///
    /// # Errors
    /// `KeyStore`, `InvalidKey` or `Agreement` on failure.
    fn ecdh_derive(
        &self,
        options: &EccOptions,
        store: &mut dyn KeyStore,
        local_private_id: &KeyId,
        peer_public_key: &[u8],
        shared_id: &KeyId,
    ) -> Result<(), CryptoError>;

    /// Encrypt `plaintext` under the key stored at `key_id` with a fresh random IV.
    ///
    /// # Errors
    /// `KeyStore`, `InvalidKey`, `Random` or `Encrypt` on failure.
    fn aead_encrypt(
        &self,
        options: &AeadOptions,
        store: &dyn KeyStore,
        key_id: &KeyId,
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<AeadSealed, CryptoError>;

    /// Decrypt and authenticate. The plaintext is only returned if the tag verifies.
    ///
    /// # Errors
    /// `AuthenticationFailed` on tag mismatch; `InvalidInput` for malformed IV
    /// or tag lengths; `KeyStore` / `InvalidKey` for key lookup failures.
    fn aead_decrypt(
        &self,
        options: &AeadOptions,
        store: &dyn KeyStore,
        key_id: &KeyId,
        ciphertext: &[u8],
        aad: &[u8],
        iv: &[u8],
        tag: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError>;

    /// Fill `buf` from the secure random source.
    ///
    /// # Errors
    /// `Random` if the entropy source fails.
    fn random_bytes(&self, buf: &mut [u8]) -> Result<(), CryptoError>;

    /// SHA-256 digest of `data`.
    fn hash(&self, data: &[u8]) -> [u8; SHA256_LEN];
}

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key generation failed")]
    KeyGeneration,
    #[error("invalid key material: {0}")]
    InvalidKey(String),
    #[error("signing failed")]
    Signing,
    #[error("malformed signature encoding")]
    InvalidSignatureEncoding,
    #[error("key agreement failed")]
    Agreement,
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed (tag mismatch)")]
    AuthenticationFailed,
    #[error("invalid crypto input: {0}")]
    InvalidInput(String),
    #[error("secure random source failed")]
    Random,
    #[error("key store error: {0}")]
    KeyStore(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_suite_is_p256_aes_gcm() {
        let s = CipherSuite::default();
        assert_eq!(s.ecc.curve, EccCurve::NistP256);
        assert_eq!(s.ecc.hash, HashAlgorithm::Sha256);
        assert_eq!(s.aead.algorithm, AeadAlgorithm::Aes256Gcm);
    }

    #[test]
    fn store_errors_convert() {
        let id = KeyId::new("missing").unwrap();
        let err: CryptoError = StoreError::NotFound(id).into();
        assert!(matches!(err, CryptoError::KeyStore(StoreError::NotFound(_))));
    }
}
