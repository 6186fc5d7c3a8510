//! Certificate issuance: builds a signed body and wraps it in a container,
//! signing with an issuer key held in the Key Store.

use crate::domain::cert::{
    CERT_VERSION, CertError, CertificateContainer, CertificateTbs, PUBKEY_ALG_EC_P256,
    SIG_ALG_ECDSA_P256_SHA256,
};
use crate::ports::crypto::{CryptoError, CryptoProvider, EccOptions, P256_PUBLIC_KEY_LEN};
use crate::ports::key_store::{KeyId, KeyStore};

/// Issue a certificate for `subject_public_key`, signed by the private key
/// stored under `issuer_key`.
///
/// # Errors
/// [`CertError::Crypto`] if the public key has the wrong length or signing
/// fails; codec errors otherwise.
pub fn issue_certificate<P: CryptoProvider + ?Sized>(
    provider: &P,
    store: &dyn KeyStore,
    issuer_key: &KeyId,
    issuer_id: &str,
    subject_id: &str,
    subject_public_key: &[u8],
) -> Result<Vec<u8>, CertError> {
    if subject_public_key.len() != P256_PUBLIC_KEY_LEN {
        return Err(CryptoError::InvalidKey(format!(
            "subject public key must be {P256_PUBLIC_KEY_LEN} bytes, got {}",
            subject_public_key.len()
        ))
        .into());
    }
    let tbs = CertificateTbs {
        version: CERT_VERSION,
        signature_algorithm: SIG_ALG_ECDSA_P256_SHA256,
        issuer_id: issuer_id.to_owned(),
        subject_id: subject_id.to_owned(),
        subject_public_key_algorithm: PUBKEY_ALG_EC_P256,
        subject_public_key: subject_public_key.to_vec(),
    };
    let encoded_tbs = tbs.encode()?;
    let signature = provider.ecc_sign(&EccOptions::P256_SHA256, store, issuer_key, &encoded_tbs)?;
    CertificateContainer {
        version: CERT_VERSION,
        encoded_tbs,
        signature,
    }
    .encode()
}

/// Self-signed root: issuer and subject are both `subject_id`.
///
/// # Errors
/// As [`issue_certificate`].
pub fn self_signed_root<P: CryptoProvider + ?Sized>(
    provider: &P,
    store: &dyn KeyStore,
    root_key: &KeyId,
    subject_id: &str,
    root_public_key: &[u8],
) -> Result<Vec<u8>, CertError> {
    issue_certificate(
        provider,
        store,
        root_key,
        subject_id,
        subject_id,
        root_public_key,
    )
}
