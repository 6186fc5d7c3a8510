//! Certificate authority used for provisioning: keeps one signing key in a
//! private in-memory store and issues device credentials in the bootstrap
//! file format.

use tracing::info;
use zeroize::Zeroizing;

use super::errors::SmpError;
use crate::adapters::store::MemoryKeyStore;
use crate::domain::cert::Certificate;
use crate::ports::crypto::{CryptoProvider, EccOptions, P256_PRIVATE_KEY_LEN, SignatureCheck};
use crate::ports::key_store::{KeyId, KeyStore, delete_if_present};
use crate::protocol::cert::{issue_certificate, self_signed_root};

const CA_PRIVATE: &str = "ca.private";
const CA_PUBLIC: &str = "ca.public";
const ISSUED_PRIVATE: &str = "issued.private";
const ISSUED_PUBLIC: &str = "issued.public";
const KEY_CHECK_MESSAGE: &[u8] = b"smp authority key check";

/// Certificate and private key handed to a device.
pub struct IssuedCredential {
    pub certificate: Vec<u8>,
    /// Raw 32-byte P-256 scalar.
    pub private_key: Zeroizing<Vec<u8>>,
}

pub struct CertificateAuthority<P: CryptoProvider> {
    provider: P,
    keys: MemoryKeyStore,
    subject: String,
    certificate: Vec<u8>,
}

impl<P: CryptoProvider> CertificateAuthority<P> {
    /// Fresh self-signed root named `subject`.
    ///
    /// # Errors
    /// `BadParams` for an empty subject, crypto errors otherwise.
    pub fn generate(provider: P, subject: &str) -> Result<Self, SmpError> {
        check_subject(subject)?;
        let mut keys = MemoryKeyStore::new();
        let (private, public) = (KeyId::new(CA_PRIVATE)?, KeyId::new(CA_PUBLIC)?);
        provider.ecc_generate_key(&EccOptions::P256_SHA256, &mut keys, &private, &public)?;
        let public_key = keys.read(&public)?;
        let certificate = self_signed_root(&provider, &keys, &private, subject, &public_key)?;
        info!(subject, "generated root certificate authority");
        Ok(Self {
            provider,
            keys,
            subject: subject.to_owned(),
            certificate,
        })
    }

    /// Authority from an existing certificate and its private key, e.g. a
    /// root loaded from disk or an issued intermediate.
    ///
    /// # Errors
    /// `BadParams` if the certificate does not parse or the key does not
    /// belong to it.
    pub fn from_parts(
        provider: P,
        certificate: Vec<u8>,
        private_key: &[u8],
    ) -> Result<Self, SmpError> {
        let cert = Certificate::parse(&certificate)
            .map_err(|e| SmpError::BadParams(format!("authority certificate: {e}")))?;
        if private_key.len() != P256_PRIVATE_KEY_LEN {
            return Err(SmpError::BadParams(format!(
                "authority private key must be {P256_PRIVATE_KEY_LEN} bytes, got {}",
                private_key.len()
            )));
        }
        let mut keys = MemoryKeyStore::new();
        let private = KeyId::new(CA_PRIVATE)?;
        keys.write(&private, private_key)?;

        let signature =
            provider.ecc_sign(&EccOptions::P256_SHA256, &keys, &private, KEY_CHECK_MESSAGE)?;
        let check = provider.ecc_verify(
            &cert.subject_key_options()?,
            cert.subject_public_key(),
            KEY_CHECK_MESSAGE,
            &signature,
        )?;
        if check != SignatureCheck::Match {
            return Err(SmpError::BadParams(
                "authority private key does not match its certificate".into(),
            ));
        }
        Ok(Self {
            provider,
            keys,
            subject: cert.tbs.subject_id,
            certificate,
        })
    }

    /// Issue a certificate for a freshly generated device key.
    ///
    /// # Errors
    /// `BadParams` for an empty subject, crypto or storage errors otherwise.
    pub fn issue(&mut self, subject: &str) -> Result<IssuedCredential, SmpError> {
        check_subject(subject)?;
        let (private, public) = (KeyId::new(ISSUED_PRIVATE)?, KeyId::new(ISSUED_PUBLIC)?);
        self.provider
            .ecc_generate_key(&EccOptions::P256_SHA256, &mut self.keys, &private, &public)?;
        let issued = self.issue_for(&private, &public, subject);
        delete_if_present(&mut self.keys, &private)?;
        delete_if_present(&mut self.keys, &public)?;
        let issued = issued?;
        info!(issuer = %self.subject, subject, "issued device certificate");
        Ok(issued)
    }

    fn issue_for(
        &self,
        private: &KeyId,
        public: &KeyId,
        subject: &str,
    ) -> Result<IssuedCredential, SmpError> {
        let public_key = self.keys.read(public)?;
        let certificate = issue_certificate(
            &self.provider,
            &self.keys,
            &KeyId::new(CA_PRIVATE)?,
            &self.subject,
            subject,
            &public_key,
        )?;
        Ok(IssuedCredential {
            certificate,
            private_key: self.keys.read(private)?,
        })
    }

    #[must_use]
    pub fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Raw private scalar of the authority, for persisting a root.
    ///
    /// # Errors
    /// `Storage` if the key is missing from the internal store.
    pub fn private_key(&self) -> Result<Zeroizing<Vec<u8>>, SmpError> {
        Ok(self.keys.read(&KeyId::new(CA_PRIVATE)?)?)
    }
}

fn check_subject(subject: &str) -> Result<(), SmpError> {
    if subject.trim().is_empty() {
        return Err(SmpError::BadParams("certificate subject is empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crypto::RustCryptoProvider;
    use crate::application::errors::ErrorKind;
    use crate::protocol::cert::{ChainVerdict, validate_chain};

    #[test]
    fn issued_certificate_chains_to_root() {
        let mut ca = CertificateAuthority::generate(RustCryptoProvider, "root").unwrap();
        let dev = ca.issue("device").unwrap();
        let cert = Certificate::parse(&dev.certificate).unwrap();
        assert_eq!(cert.tbs.issuer_id, "root");
        assert_eq!(cert.tbs.subject_id, "device");
        assert_eq!(dev.private_key.len(), P256_PRIVATE_KEY_LEN);

        let mut store = MemoryKeyStore::new();
        let key = KeyId::new("dev").unwrap();
        store.write(&key, &dev.private_key).unwrap();
        let sig = RustCryptoProvider
            .ecc_sign(&EccOptions::P256_SHA256, &store, &key, b"payload")
            .unwrap();
        let verdict = validate_chain(
            &RustCryptoProvider,
            ca.certificate(),
            b"payload",
            &sig,
            &[dev.certificate],
        )
        .unwrap();
        assert_eq!(verdict, ChainVerdict::SignatureMatch);
    }

    #[test]
    fn reload_from_parts() {
        let ca = CertificateAuthority::generate(RustCryptoProvider, "root").unwrap();
        let key = ca.private_key().unwrap();
        let mut again =
            CertificateAuthority::from_parts(RustCryptoProvider, ca.certificate().to_vec(), &key)
                .unwrap();
        assert_eq!(again.subject(), "root");
        assert!(again.issue("d").is_ok());
    }

    #[test]
    fn from_parts_rejects_foreign_key() {
        let a = CertificateAuthority::generate(RustCryptoProvider, "a").unwrap();
        let b = CertificateAuthority::generate(RustCryptoProvider, "b").unwrap();
        let err = CertificateAuthority::from_parts(
            RustCryptoProvider,
            a.certificate().to_vec(),
            &b.private_key().unwrap(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::BadParams);
    }

    #[test]
    fn empty_subject_is_bad_params() {
        let mut ca = CertificateAuthority::generate(RustCryptoProvider, "root").unwrap();
        assert_eq!(ca.issue(" ").err().unwrap().kind(), ErrorKind::BadParams);
    }
}
