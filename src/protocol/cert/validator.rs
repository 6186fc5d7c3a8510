//! Certificate chain validation.
//!
//! The validation path is the trusted root followed by the wire chain in
//! issuer-first order: `[root, cert_1, .., cert_n]`. Every element must be
//! issued by its predecessor; the root is its own predecessor, so a tampered
//! root fails the same way a tampered chain link does. The end-entity
//! `cert_n` then has to verify the caller's data signature.

use tracing::debug;

use crate::domain::cert::{CertError, Certificate};
use crate::ports::crypto::{CryptoError, CryptoProvider, EccOptions, SignatureCheck};

/// Outcome of a chain validation that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainVerdict {
    /// Every link verified and the end-entity key verified the data signature.
    SignatureMatch,
    /// `issuerId` at `depth` does not name its predecessor's subject.
    InvalidIssuer { depth: usize },
    /// Container signature at `depth` does not verify under its predecessor's key.
    InvalidChainSignature { depth: usize },
    /// The chain is sound but the data signature does not verify.
    InvalidDataSignature,
}

impl ChainVerdict {
    #[must_use]
    pub fn is_match(self) -> bool {
        self == ChainVerdict::SignatureMatch
    }
}

/// Validate `chain` up to `root_cert` and check `signature` over `signed_data`
/// with the end-entity key. Depth 0 is the root, depth `i` is `chain[i - 1]`.
///
/// # Errors
/// [`CertError`] when a certificate does not parse, declares an unsupported
/// algorithm, or the crypto backend fails for a reason other than a
/// non-matching signature. `chain` must not be empty.
pub fn validate_chain<P: CryptoProvider + ?Sized>(
    provider: &P,
    root_cert: &[u8],
    signed_data: &[u8],
    signature: &[u8],
    chain: &[Vec<u8>],
) -> Result<ChainVerdict, CertError> {
    if chain.is_empty() {
        return Err(CertError::EmptyChain);
    }
    let mut path = Vec::with_capacity(chain.len() + 1);
    path.push(Certificate::parse(root_cert)?);
    for raw in chain {
        path.push(Certificate::parse(raw)?);
    }

    for depth in 0..path.len() {
        let issuer = &path[depth.saturating_sub(1)];
        let subject = &path[depth];
        if subject.tbs.issuer_id != issuer.tbs.subject_id {
            debug!(depth, "certificate issuer does not match predecessor subject");
            return Ok(ChainVerdict::InvalidIssuer { depth });
        }
        let options = link_options(issuer, subject)?;
        let check = verify(
            provider,
            &options,
            issuer.subject_public_key(),
            &subject.container.encoded_tbs,
            &subject.container.signature,
        )?;
        if check != SignatureCheck::Match {
            debug!(depth, "certificate signature does not verify under issuer key");
            return Ok(ChainVerdict::InvalidChainSignature { depth });
        }
    }

    let Some(end_entity) = path.last() else {
        return Err(CertError::EmptyChain);
    };
    let options = end_entity.subject_key_options()?;
    match verify(
        provider,
        &options,
        end_entity.subject_public_key(),
        signed_data,
        signature,
    )? {
        SignatureCheck::Match => Ok(ChainVerdict::SignatureMatch),
        SignatureCheck::NoMatch => {
            debug!("data signature does not verify under end-entity key");
            Ok(ChainVerdict::InvalidDataSignature)
        }
    }
}

/// Options for verifying `subject`'s container signature: the declared
/// signature algorithm, which must agree with the issuer's key algorithm.
fn link_options(issuer: &Certificate, subject: &Certificate) -> Result<EccOptions, CertError> {
    let signed_with = subject.signature_options()?;
    let issuer_key = issuer.subject_key_options()?;
    if signed_with.curve != issuer_key.curve {
        return Err(CertError::UnsupportedAlgorithm {
            field: "signature",
            id: subject.tbs.signature_algorithm,
        });
    }
    Ok(signed_with)
}

/// Signature verification where a malformed signature counts as a mismatch.
fn verify<P: CryptoProvider + ?Sized>(
    provider: &P,
    options: &EccOptions,
    public_key: &[u8],
    data: &[u8],
    signature: &[u8],
) -> Result<SignatureCheck, CertError> {
    match provider.ecc_verify(options, public_key, data, signature) {
        Ok(check) => Ok(check),
        Err(CryptoError::InvalidSignatureEncoding) => Ok(SignatureCheck::NoMatch),
        Err(e) => Err(e.into()),
    }
}
