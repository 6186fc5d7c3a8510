// src/adapters/crypto/p256_aes_gcm.rs
use crate::ports::crypto::{
    AEAD_IV_LEN, AEAD_KEY_LEN, AEAD_TAG_LEN, AeadAlgorithm, AeadOptions, AeadSealed, CryptoError,
    CryptoProvider, ECDH_SHARED_SECRET_LEN, EccCurve, EccOptions, HashAlgorithm,
    P256_PRIVATE_KEY_LEN, P256_PUBLIC_KEY_LEN, SHA256_LEN, SignatureCheck,
};
use crate::ports::key_store::{KeyId, KeyStore, delete_if_present};
use aes_gcm::{
    Aes256Gcm, Nonce, Tag,
    aead::{AeadInPlace, KeyInit},
};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroizing;

/// `CryptoProvider` backed by the RustCrypto crates.
///
/// - ECDSA / ECDH over NIST P-256 (`p256`), signatures hashed with SHA-256 and
///   encoded as fixed 64-byte `r || s`.
/// - AES-256-GCM (`aes-gcm`) with a fresh random 96-bit IV per seal.
/// - Randomness from the operating system (`rand_core::OsRng`), which is safe
///   to use from several sessions concurrently.
///
/// Private keys are stored as raw 32-byte big-endian scalars, public keys as
/// 65-byte uncompressed SEC1 points. Compressed points are rejected so that
/// every public key on the wire has one encoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoProvider;

// The raw ECDH secret is used directly as the AES-256-GCM session key.
const _: () = assert!(ECDH_SHARED_SECRET_LEN == AEAD_KEY_LEN);

fn expect_p256_sha256(options: &EccOptions) -> Result<(), CryptoError> {
    match (options.curve, options.hash) {
        (EccCurve::NistP256, HashAlgorithm::Sha256) => Ok(()),
    }
}

fn expect_aes_gcm(options: &AeadOptions) -> Result<(), CryptoError> {
    match options.algorithm {
        AeadAlgorithm::Aes256Gcm => Ok(()),
    }
}

fn load_secret(store: &dyn KeyStore, id: &KeyId) -> Result<SecretKey, CryptoError> {
    let bytes = store.read(id)?;
    if bytes.len() != P256_PRIVATE_KEY_LEN {
        return Err(CryptoError::InvalidKey(format!(
            "private key `{id}` has length {}",
            bytes.len()
        )));
    }
    SecretKey::from_slice(&bytes)
        .map_err(|_| CryptoError::InvalidKey(format!("private key `{id}` is not a P-256 scalar")))
}

fn parse_public(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    if bytes.len() != P256_PUBLIC_KEY_LEN {
        return Err(CryptoError::InvalidKey(format!(
            "public key must be {P256_PUBLIC_KEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    PublicKey::from_sec1_bytes(bytes)
        .map_err(|_| CryptoError::InvalidKey("public key is not a P-256 point".into()))
}

fn load_aead(store: &dyn KeyStore, id: &KeyId) -> Result<Aes256Gcm, CryptoError> {
    let key = store.read(id)?;
    if key.len() != AEAD_KEY_LEN {
        return Err(CryptoError::InvalidKey(format!(
            "AEAD key `{id}` has length {}",
            key.len()
        )));
    }
    Aes256Gcm::new_from_slice(&key)
        .map_err(|_| CryptoError::InvalidKey(format!("AEAD key `{id}` rejected")))
}

impl CryptoProvider for RustCryptoProvider {
    fn ecc_generate_key(
        &self,
        options: &EccOptions,
        store: &mut dyn KeyStore,
        private_id: &KeyId,
        public_id: &KeyId,
    ) -> Result<(), CryptoError> {
        expect_p256_sha256(options)?;
        let secret = SecretKey::random(&mut OsRng);
        let private = Zeroizing::new(secret.to_bytes().to_vec());
        let public = secret.public_key().to_encoded_point(false);
        store.write(private_id, &private)?;
        if let Err(e) = store.write(public_id, public.as_bytes()) {
            // best-effort rollback of the half-written pair
            if let Err(cleanup) = delete_if_present(store, private_id) {
                warn!(
                    key = %private_id,
                    error = %cleanup,
                    "could not remove half-written key pair"
                );
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn ecc_sign(
        &self,
        options: &EccOptions,
        store: &dyn KeyStore,
        private_id: &KeyId,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        expect_p256_sha256(options)?;
        let secret = load_secret(store, private_id)?;
        let signing = SigningKey::from(&secret);
        let signature: Signature = signing.try_sign(data).map_err(|_| CryptoError::Signing)?;
        Ok(signature.to_bytes().to_vec())
    }

    fn ecc_verify(
        &self,
        options: &EccOptions,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
    ) -> Result<SignatureCheck, CryptoError> {
        expect_p256_sha256(options)?;
        let verifying = VerifyingKey::from(parse_public(public_key)?);
        let signature =
            Signature::from_slice(signature).map_err(|_| CryptoError::InvalidSignatureEncoding)?;
        Ok(match verifying.verify(data, &signature) {
            Ok(()) => SignatureCheck::Match,
            Err(_) => SignatureCheck::NoMatch,
        })
    }

    fn ecdh_derive(
        &self,
        options: &EccOptions,
        store: &mut dyn KeyStore,
        local_private_id: &KeyId,
        peer_public_key: &[u8],
        shared_id: &KeyId,
    ) -> Result<(), CryptoError> {
        expect_p256_sha256(options)?;
        let secret = load_secret(store, local_private_id)?;
        let peer = parse_public(peer_public_key)?;
        let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
        let raw = Zeroizing::new(shared.raw_secret_bytes().to_vec());
        store.write(shared_id, &raw)?;
        Ok(())
    }

    fn aead_encrypt(
        &self,
        options: &AeadOptions,
        store: &dyn KeyStore,
        key_id: &KeyId,
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<AeadSealed, CryptoError> {
        expect_aes_gcm(options)?;
        let cipher = load_aead(store, key_id)?;
        let mut iv = [0u8; AEAD_IV_LEN];
        self.random_bytes(&mut iv)?;
        let mut buf = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&iv), aad, &mut buf)
            .map_err(|_| CryptoError::Encrypt)?;
        Ok(AeadSealed {
            iv,
            ciphertext: buf,
            tag: tag.into(),
        })
    }

    fn aead_decrypt(
        &self,
        options: &AeadOptions,
        store: &dyn KeyStore,
        key_id: &KeyId,
        ciphertext: &[u8],
        aad: &[u8],
        iv: &[u8],
        tag: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        expect_aes_gcm(options)?;
        if iv.len() != AEAD_IV_LEN {
            return Err(CryptoError::InvalidInput(format!(
                "IV must be {AEAD_IV_LEN} bytes, got {}",
                iv.len()
            )));
        }
        if tag.len() != AEAD_TAG_LEN {
            return Err(CryptoError::InvalidInput(format!(
                "tag must be {AEAD_TAG_LEN} bytes, got {}",
                tag.len()
            )));
        }
        let cipher = load_aead(store, key_id)?;
        let mut buf = Zeroizing::new(ciphertext.to_vec());
        cipher
            .decrypt_in_place_detached(Nonce::from_slice(iv), aad, &mut buf, Tag::from_slice(tag))
            .map_err(|_| CryptoError::AuthenticationFailed)?;
        Ok(buf)
    }

    fn random_bytes(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        OsRng.try_fill_bytes(buf).map_err(|_| CryptoError::Random)
    }

    fn hash(&self, data: &[u8]) -> [u8; SHA256_LEN] {
        Sha256::digest(data).into()
    }
}
