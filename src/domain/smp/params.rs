//! Body schemas of the two SMP message kinds.
//!
//! Establishment (CONNECT / CONNACK):
//! `[encodedHeader][cipherSchemeId, CONNECT only][ephemeralPublicKey][innerPacket][signature][certCount][cert_1]..[cert_n]`
//!
//! Control (everything else):
//! `[encodedHeader][innerPacket][iv][authTag]`
//!
//! Decoders enforce every fixed length and the certificate-count bound before
//! anything is handed to crypto.

use super::errors::{WireError, check_len};
use super::{CERT_CHAIN_MAX, CERT_MAX, CIPHER_SCHEME_P256_AES256GCM};
use crate::core::cbor::{CborSeqReader, CborSeqWriter, CodecError};
use crate::ports::crypto::{
    AEAD_IV_LEN, AEAD_TAG_LEN, ECDSA_P256_SIGNATURE_LEN, P256_PUBLIC_KEY_LEN,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEstablishmentParams {
    pub encoded_header: Vec<u8>,
    /// Present only on CONNECT (initiator to responder).
    pub cipher_scheme_id: Option<u8>,
    pub ephemeral_public_key: Vec<u8>,
    pub inner_packet: Vec<u8>,
    pub signature: Vec<u8>,
    /// Issuer-first: `cert_chain[0]` is issued by the root CA, the last entry
    /// is the sender's own certificate.
    pub cert_chain: Vec<Vec<u8>>,
}

impl SessionEstablishmentParams {
    /// Bytes covered by the establishment signature:
    /// `encodedHeader ‖ [cipherSchemeId as one byte] ‖ ephemeralPublicKey ‖ innerPacket`.
    #[must_use]
    pub fn signed_payload(&self) -> Vec<u8> {
        signed_payload(
            &self.encoded_header,
            self.cipher_scheme_id,
            &self.ephemeral_public_key,
            &self.inner_packet,
        )
    }

    /// # Errors
    /// Codec errors, or [`WireError::EmptyCertChain`] when there is nothing to send.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        if self.cert_chain.is_empty() {
            return Err(WireError::EmptyCertChain);
        }
        let mut w = CborSeqWriter::new();
        w.bytes(&self.encoded_header)?;
        if let Some(id) = self.cipher_scheme_id {
            w.uint(u64::from(id))?;
        }
        w.bytes(&self.ephemeral_public_key)?
            .bytes(&self.inner_packet)?
            .bytes(&self.signature)?
            .uint(self.cert_chain.len() as u64)?;
        for cert in &self.cert_chain {
            w.bytes(cert)?;
        }
        Ok(w.finish())
    }

    /// Decode an establishment message. `with_cipher_scheme` is true when the
    /// message is a CONNECT, the only direction that carries the scheme id.
    ///
    /// # Errors
    /// Any [`WireError`] describing the first broken field.
    pub fn decode(bytes: &[u8], with_cipher_scheme: bool) -> Result<Self, WireError> {
        let mut r = CborSeqReader::new(bytes);
        let encoded_header = r.bytes("encodedHeader")?;
        let cipher_scheme_id = if with_cipher_scheme {
            let id = r.uint("cipherSchemeId")?;
            if id != u64::from(CIPHER_SCHEME_P256_AES256GCM) {
                return Err(WireError::UnsupportedCipherScheme(id));
            }
            Some(CIPHER_SCHEME_P256_AES256GCM)
        } else {
            None
        };
        let ephemeral_public_key = r.bytes("ephemeralPublicKey")?;
        let inner_packet = r.bytes("innerPacket")?;
        let signature = r.bytes("signature")?;
        let declared = r.uint("certCount")?;
        if declared == 0 {
            return Err(WireError::EmptyCertChain);
        }
        if declared > CERT_CHAIN_MAX as u64 {
            return Err(WireError::CertCountMismatch { declared, found: 0 });
        }
        let mut cert_chain = Vec::new();
        while (cert_chain.len() as u64) < declared {
            match r.bytes("cert") {
                Ok(cert) => cert_chain.push(cert),
                Err(CodecError::MissingItem { .. }) => {
                    return Err(WireError::CertCountMismatch {
                        declared,
                        found: cert_chain.len(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
        if !r.is_empty() {
            return Err(WireError::CertCountMismatch {
                declared,
                found: cert_chain.len() + 1,
            });
        }

        let params = Self {
            encoded_header,
            cipher_scheme_id,
            ephemeral_public_key,
            inner_packet,
            signature,
            cert_chain,
        };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), WireError> {
        if self.encoded_header.is_empty() {
            return Err(WireError::EmptyField("encodedHeader"));
        }
        check_len(
            "ephemeralPublicKey",
            &self.ephemeral_public_key,
            P256_PUBLIC_KEY_LEN,
        )?;
        check_len("signature", &self.signature, ECDSA_P256_SIGNATURE_LEN)?;
        if self.inner_packet.is_empty() {
            return Err(WireError::EmptyField("innerPacket"));
        }
        for cert in &self.cert_chain {
            if cert.is_empty() {
                return Err(WireError::EmptyField("cert"));
            }
            if cert.len() > CERT_MAX {
                return Err(WireError::CertTooLarge(cert.len()));
            }
        }
        Ok(())
    }
}

/// Free-standing form of [`SessionEstablishmentParams::signed_payload`], used
/// by the producer before the params value exists.
#[must_use]
pub fn signed_payload(
    encoded_header: &[u8],
    cipher_scheme_id: Option<u8>,
    ephemeral_public_key: &[u8],
    inner_packet: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        encoded_header.len() + 1 + ephemeral_public_key.len() + inner_packet.len(),
    );
    out.extend_from_slice(encoded_header);
    if let Some(id) = cipher_scheme_id {
        out.push(id);
    }
    out.extend_from_slice(ephemeral_public_key);
    out.extend_from_slice(inner_packet);
    out
}

/// Secured control message body. `inner_packet` holds ciphertext for the
/// encrypted types and the cleartext packet otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlParams {
    pub encoded_header: Vec<u8>,
    pub inner_packet: Vec<u8>,
    pub iv: [u8; AEAD_IV_LEN],
    pub auth_tag: [u8; AEAD_TAG_LEN],
}

impl ControlParams {
    /// # Errors
    /// Codec errors only.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut w = CborSeqWriter::new();
        w.bytes(&self.encoded_header)?
            .bytes(&self.inner_packet)?
            .bytes(&self.iv)?
            .bytes(&self.auth_tag)?;
        Ok(w.finish())
    }

    /// # Errors
    /// Codec errors or [`WireError::LengthMismatch`] for the IV / tag.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut r = CborSeqReader::new(bytes);
        let encoded_header = r.bytes("encodedHeader")?;
        let inner_packet = r.bytes("innerPacket")?;
        let iv = r.bytes("iv")?;
        let auth_tag = r.bytes("authTag")?;
        r.finish()?;
        if encoded_header.is_empty() {
            return Err(WireError::EmptyField("encodedHeader"));
        }
        Ok(Self {
            encoded_header,
            inner_packet,
            iv: fixed("iv", &iv)?,
            auth_tag: fixed("authTag", &auth_tag)?,
        })
    }
}

fn fixed<const N: usize>(field: &'static str, bytes: &[u8]) -> Result<[u8; N], WireError> {
    check_len(field, bytes, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn establishment(with_scheme: bool, certs: usize) -> SessionEstablishmentParams {
        SessionEstablishmentParams {
            encoded_header: vec![0x01, 0x01, 0x01],
            cipher_scheme_id: with_scheme.then_some(CIPHER_SCHEME_P256_AES256GCM),
            ephemeral_public_key: vec![0x04; P256_PUBLIC_KEY_LEN],
            inner_packet: b"mqtt-connect-bytes".to_vec(),
            signature: vec![0xAB; ECDSA_P256_SIGNATURE_LEN],
            cert_chain: (0..certs).map(|i| vec![i as u8 + 1; 12]).collect(),
        }
    }

    #[test]
    fn connect_carries_scheme_and_connack_does_not() {
        for with in [true, false] {
            let p = establishment(with, 2);
            let back = SessionEstablishmentParams::decode(&p.encode().unwrap(), with).unwrap();
            assert_eq!(back, p);
        }
    }

    #[test]
    fn signed_payload_layout() {
        let p = establishment(true, 1);
        let s = p.signed_payload();
        assert_eq!(&s[..3], &[0x01, 0x01, 0x01]);
        assert_eq!(s[3], CIPHER_SCHEME_P256_AES256GCM);
        assert_eq!(s.len(), 3 + 1 + P256_PUBLIC_KEY_LEN + b"mqtt-connect-bytes".len());
        let q = establishment(false, 1);
        assert_eq!(q.signed_payload().len(), s.len() - 1);
    }

    #[test]
    fn decoding_connack_as_connect_fails() {
        let p = establishment(false, 1);
        assert!(SessionEstablishmentParams::decode(&p.encode().unwrap(), true).is_err());
    }

    #[test]
    fn wrong_cipher_scheme_is_rejected() {
        let mut w = CborSeqWriter::new();
        w.bytes(&[1]).unwrap().uint(7).unwrap();
        assert!(matches!(
            SessionEstablishmentParams::decode(&w.finish(), true),
            Err(WireError::UnsupportedCipherScheme(7))
        ));
    }

    #[test]
    fn cert_count_must_match_entries() {
        let p = establishment(false, 2);
        let mut bytes = p.encode().unwrap();
        // drop the last certificate item (1-byte header + 12 bytes)
        bytes.truncate(bytes.len() - 13);
        assert!(matches!(
            SessionEstablishmentParams::decode(&bytes, false),
            Err(WireError::CertCountMismatch { declared: 2, found: 1 })
        ));

        let mut extra = p.encode().unwrap();
        let mut w = CborSeqWriter::new();
        w.bytes(&[9; 4]).unwrap();
        extra.extend(w.finish());
        assert!(matches!(
            SessionEstablishmentParams::decode(&extra, false),
            Err(WireError::CertCountMismatch { declared: 2, found: 3 })
        ));
    }

    #[test]
    fn empty_chain_rejected_both_ways() {
        assert!(matches!(
            establishment(false, 0).encode(),
            Err(WireError::EmptyCertChain)
        ));
        let mut w = CborSeqWriter::new();
        w.bytes(&[1])
            .unwrap()
            .bytes(&[4; P256_PUBLIC_KEY_LEN])
            .unwrap()
            .bytes(b"p")
            .unwrap()
            .bytes(&[0; ECDSA_P256_SIGNATURE_LEN])
            .unwrap()
            .uint(0)
            .unwrap();
        assert!(matches!(
            SessionEstablishmentParams::decode(&w.finish(), false),
            Err(WireError::EmptyCertChain)
        ));
    }

    #[test]
    fn bad_key_length_is_reported() {
        let mut p = establishment(false, 1);
        p.ephemeral_public_key.pop();
        assert!(matches!(
            SessionEstablishmentParams::decode(&p.encode().unwrap(), false),
            Err(WireError::LengthMismatch {
                field: "ephemeralPublicKey",
                expected: 65,
                actual: 64
            })
        ));
    }

    #[test]
    fn control_params_fixed_lengths() {
        let c = ControlParams {
            encoded_header: vec![1, 2],
            inner_packet: vec![],
            iv: [7; AEAD_IV_LEN],
            auth_tag: [9; AEAD_TAG_LEN],
        };
        assert_eq!(ControlParams::decode(&c.encode().unwrap()).unwrap(), c);

        let mut w = CborSeqWriter::new();
        w.bytes(&[1]).unwrap().bytes(&[]).unwrap();
        w.bytes(&[0; 11]).unwrap().bytes(&[0; AEAD_TAG_LEN]).unwrap();
        assert!(matches!(
            ControlParams::decode(&w.finish()),
            Err(WireError::LengthMismatch { field: "iv", .. })
        ));
    }
}
