//! SMP session engine.
//!
//! A session has two phases. While *unestablished* only the establishment
//! messages flow: the initiator sends CONNECT, the responder answers with
//! CONNACK, each signed with the sender's long-term key and carrying its
//! ephemeral P-256 public key plus certificate chain. Consuming the peer's
//! establishment message validates the chain against the local root CA,
//! derives the ECDH shared secret into the Key Store and purges the ephemeral
//! private key. From then on the session is *established* and every other
//! message type is framed with AES-256-GCM under the shared key.
//!
//! Transitions:
//! - Initiator: produce CONNECT, then consume CONNACK (established).
//! - Responder: consume CONNECT (established), then produce CONNACK.
//!
//! Establishment messages are one-shot per direction; a second one in either
//! direction is rejected.
//!
//! Every received header is checked before the body is parsed: context and
//! version, client id, type allowed for the receiving role, and the message
//! id against the replay watermark. A failed consume leaves the session
//! exactly as it was.

use tracing::{debug, warn};

use super::types::{Session, SessionKeyRefs};
use crate::application::credentials::CredentialBundle;
use crate::application::errors::SmpError;
use crate::application::rollback::KeyRollback;
use crate::config::SmpConfig;
use crate::domain::smp::{
    CIPHER_SCHEME_P256_AES256GCM, CLIENT_ID_MAX_LEN, ControlParams, MESSAGE_CONTEXT_SMP_MQTT,
    MESSAGE_CONTEXT_VERSION, MessageType, Role, SessionEstablishmentParams, SmpHeader,
    signed_payload,
};
use crate::ports::crypto::{CipherSuite, CryptoError, CryptoProvider};
use crate::ports::key_store::{KeyId, KeyStore, delete_if_present};
use crate::protocol::cert::validate_chain;
use crate::protocol::smp::control_aad;

/// Random bytes per session key identifier (hex-encoded to 32 characters).
const KEY_ID_RANDOM_LEN: usize = 16;

/// Drives SMP sessions against one crypto backend and one Key Store.
///
/// The engine itself is stateless between calls apart from its backends;
/// all protocol state lives in the caller-owned [`Session`].
pub struct SmpEngine<P: CryptoProvider, S: KeyStore> {
    provider: P,
    store: S,
    config: SmpConfig,
}

impl<P: CryptoProvider, S: KeyStore> SmpEngine<P, S> {
    pub fn new(provider: P, store: S, config: SmpConfig) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the Key Store, e.g. to bootstrap credentials.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &SmpConfig {
        &self.config
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn random_key_id(&self) -> Result<KeyId, SmpError> {
        let mut raw = [0u8; KEY_ID_RANDOM_LEN];
        self.provider.random_bytes(&mut raw)?;
        Ok(KeyId::new(hex::encode(raw))?)
    }

    /// Open a session: generate the ephemeral ECDH pair and reserve the
    /// shared-key identifier.
    ///
    /// # Errors
    /// * `BadParams` for an empty or over-long client id.
    /// * `Storage` if the credentials are not in the Key Store or a write fails.
    /// * `CryptoOperation` if key generation fails.
    ///
    /// On error nothing written by this call remains in the Key Store.
    pub fn open(
        &mut self,
        credentials: &CredentialBundle,
        role: Role,
        client_id: &str,
    ) -> Result<Session, SmpError> {
        if client_id.is_empty() || client_id.len() > CLIENT_ID_MAX_LEN {
            return Err(SmpError::BadParams(format!(
                "client id must be 1..={CLIENT_ID_MAX_LEN} bytes, got {}",
                client_id.len()
            )));
        }
        CredentialBundle::provisioned(&self.store)?;

        let suite = CipherSuite::default();
        let keys = SessionKeyRefs {
            ephemeral_private: self.random_key_id()?,
            ephemeral_public: self.random_key_id()?,
            shared: self.random_key_id()?,
        };

        let mut guard = KeyRollback::new(&mut self.store);
        guard.track(&keys.ephemeral_private);
        guard.track(&keys.ephemeral_public);
        self.provider.ecc_generate_key(
            &suite.ecc,
            guard.store(),
            &keys.ephemeral_private,
            &keys.ephemeral_public,
        )?;
        guard.commit();

        debug!(client_id, ?role, "session opened");
        Ok(Session {
            client_id: client_id.to_owned(),
            role,
            suite,
            keys,
            credentials: credentials.clone(),
            pre_session_keys_generated: true,
            session_key_established: false,
            establishment_sent: false,
            establishment_received: false,
            to_be_sent_message_id: 0,
            last_received_message_id: 0,
            received_any: false,
        })
    }

    /// Wrap `inner_packet` in an SMP message of `message_type`.
    ///
    /// CONNECT / CONNACK produce the signed establishment message; every other
    /// type produces a secured control message and needs an established
    /// session. The outgoing message id advances by one on success only.
    ///
    /// # Errors
    /// * `BadParams` if the role cannot send the type, the packet is too large,
    ///   an establishment packet is empty, or the establishment message was
    ///   already produced.
    /// * `BadSession` if the session is not in the right phase.
    /// * `CryptoOperation`, `Storage`, `Serialization` from the backends.
    pub fn produce_message(
        &mut self,
        session: &mut Session,
        message_type: MessageType,
        inner_packet: &[u8],
    ) -> Result<Vec<u8>, SmpError> {
        if !message_type.sent_by(session.role) {
            return Err(SmpError::BadParams(format!(
                "{message_type} cannot be sent by the {:?}",
                session.role
            )));
        }
        if inner_packet.len() > self.config.max_packet_len {
            return Err(SmpError::BadParams(format!(
                "inner packet of {} bytes exceeds limit of {}",
                inner_packet.len(),
                self.config.max_packet_len
            )));
        }
        let next_id = session
            .to_be_sent_message_id
            .checked_add(1)
            .ok_or_else(|| SmpError::BadSession("outgoing message id exhausted".into()))?;

        let wire = if message_type.is_establishment() {
            self.produce_establishment(session, message_type, inner_packet)?
        } else {
            self.produce_control(session, message_type, inner_packet)?
        };

        debug!(
            client_id = %session.client_id,
            role = ?session.role,
            %message_type,
            message_id = session.to_be_sent_message_id,
            "produced message"
        );
        session.to_be_sent_message_id = next_id;
        Ok(wire)
    }

    fn produce_establishment(
        &mut self,
        session: &mut Session,
        message_type: MessageType,
        inner_packet: &[u8],
    ) -> Result<Vec<u8>, SmpError> {
        if session.establishment_sent {
            return Err(SmpError::BadParams(format!(
                "{message_type} already produced for this session"
            )));
        }
        if inner_packet.is_empty() {
            return Err(SmpError::BadParams(format!(
                "{message_type} requires a non-empty inner packet"
            )));
        }
        if !session.pre_session_keys_generated {
            return Err(SmpError::BadSession("no ephemeral key pair".into()));
        }
        if session.role == Role::Responder && !session.establishment_received {
            return Err(SmpError::BadSession(
                "CONNACK requires a consumed CONNECT".into(),
            ));
        }

        let header = SmpHeader::new(
            message_type,
            &session.client_id,
            session.to_be_sent_message_id,
        )?;
        let encoded_header = header.encode()?;
        let ephemeral_public_key = self.store.read(&session.keys.ephemeral_public)?;
        let cipher_scheme_id =
            (session.role == Role::Initiator).then_some(CIPHER_SCHEME_P256_AES256GCM);
        let payload = signed_payload(
            &encoded_header,
            cipher_scheme_id,
            &ephemeral_public_key,
            inner_packet,
        );
        let signature = self.provider.ecc_sign(
            &session.suite.ecc,
            &self.store,
            session.credentials.self_key(),
            &payload,
        )?;
        let self_cert = self.store.read(session.credentials.self_cert())?;

        let wire = SessionEstablishmentParams {
            encoded_header,
            cipher_scheme_id,
            ephemeral_public_key: ephemeral_public_key.to_vec(),
            inner_packet: inner_packet.to_vec(),
            signature,
            cert_chain: vec![self_cert.to_vec()],
        }
        .encode()?;

        if session.role == Role::Responder {
            // CONNACK was the last use of the ephemeral public key
            delete_if_present(&mut self.store, &session.keys.ephemeral_public)?;
            session.pre_session_keys_generated = false;
        }
        session.establishment_sent = true;
        Ok(wire)
    }

    fn produce_control(
        &self,
        session: &Session,
        message_type: MessageType,
        inner_packet: &[u8],
    ) -> Result<Vec<u8>, SmpError> {
        if !session.session_key_established {
            return Err(SmpError::BadSession(format!(
                "{message_type} requires an established session"
            )));
        }
        let header = SmpHeader::new(
            message_type,
            &session.client_id,
            session.to_be_sent_message_id,
        )?;
        let encoded_header = header.encode()?;
        let encrypted = message_type.is_encrypted();
        let label = message_type.auth_label(session.role.outbound());
        let aad = control_aad(
            &encoded_header,
            &label,
            (!encrypted).then_some(inner_packet),
        );
        let plaintext: &[u8] = if encrypted { inner_packet } else { &[] };
        let sealed = self.provider.aead_encrypt(
            &session.suite.aead,
            &self.store,
            &session.keys.shared,
            plaintext,
            &aad,
        )?;

        Ok(ControlParams {
            encoded_header,
            inner_packet: if encrypted {
                sealed.ciphertext
            } else {
                inner_packet.to_vec()
            },
            iv: sealed.iv,
            auth_tag: sealed.tag,
        }
        .encode()?)
    }

    /// Validate and unwrap a message from the peer, returning its inner packet.
    ///
    /// # Errors
    /// * `BadParams` for an empty buffer.
    /// * `InvalidMessage` for a header that breaks protocol rules, a rejected
    ///   certificate chain or signature, or an establishment message in an
    ///   established session.
    /// * `BadSession` for a control message before establishment.
    /// * `CryptoOperation` on AEAD tag mismatch; no plaintext is returned.
    /// * `Serialization` for malformed CBOR.
    pub fn consume_message(
        &mut self,
        session: &mut Session,
        wire: &[u8],
    ) -> Result<Vec<u8>, SmpError> {
        if wire.is_empty() {
            return Err(SmpError::BadParams("empty wire message".into()));
        }
        let (header, encoded_header) = SmpHeader::peek(wire).inspect_err(|e| {
            warn!(client_id = %session.client_id, error = %e, "unreadable message header");
        })?;
        self.check_header(session, &header)?;

        let establishment = MessageType::establishment_for(session.role.peer());
        let packet = if header.message_type == establishment {
            self.consume_establishment(session, header.message_type, wire)?
        } else {
            self.consume_control(session, header.message_type, &encoded_header, wire)?
        };

        session.last_received_message_id = header.message_id;
        session.received_any = true;
        debug!(
            client_id = %session.client_id,
            role = ?session.role,
            message_type = %header.message_type,
            message_id = header.message_id,
            "consumed message"
        );
        Ok(packet)
    }

    fn check_header(&self, session: &Session, header: &SmpHeader) -> Result<(), SmpError> {
        let reject = |reason: String| {
            warn!(client_id = %session.client_id, %reason, "rejected message header");
            Err(SmpError::InvalidMessage(reason))
        };
        if header.context != MESSAGE_CONTEXT_SMP_MQTT {
            return reject(format!("unexpected message context {}", header.context));
        }
        if header.context_version != MESSAGE_CONTEXT_VERSION {
            return reject(format!(
                "unsupported context version {}",
                header.context_version
            ));
        }
        if header.client_id != session.client_id {
            return reject("client id does not match session".into());
        }
        if !header.message_type.received_by(session.role) {
            return reject(format!(
                "{} is not accepted by the {:?}",
                header.message_type, session.role
            ));
        }
        if !self.config.replay_policy.accepts(
            session.last_received_message_id,
            header.message_id,
            session.received_any,
        ) {
            return reject(format!(
                "message id {} behind watermark {}",
                header.message_id, session.last_received_message_id
            ));
        }
        Ok(())
    }

    fn consume_establishment(
        &mut self,
        session: &mut Session,
        message_type: MessageType,
        wire: &[u8],
    ) -> Result<Vec<u8>, SmpError> {
        if session.session_key_established || session.establishment_received {
            warn!(client_id = %session.client_id, %message_type, "second establishment message");
            return Err(SmpError::InvalidMessage(format!(
                "{message_type} in an established session"
            )));
        }
        if !session.pre_session_keys_generated {
            return Err(SmpError::BadSession("no ephemeral key pair".into()));
        }
        let params =
            SessionEstablishmentParams::decode(wire, message_type == MessageType::Connect)
                .inspect_err(|e| {
                    warn!(
                        client_id = %session.client_id,
                        error = %e,
                        "malformed establishment message"
                    );
                })?;

        let root = self.store.read(session.credentials.root_ca())?;
        let verdict = validate_chain(
            &self.provider,
            &root,
            &params.signed_payload(),
            &params.signature,
            &params.cert_chain,
        )
        .inspect_err(|e| {
            warn!(client_id = %session.client_id, error = %e, "certificate chain unusable");
        })?;
        if !verdict.is_match() {
            warn!(client_id = %session.client_id, ?verdict, "establishment authentication failed");
            return Err(SmpError::InvalidMessage(format!(
                "establishment authentication failed: {verdict:?}"
            )));
        }

        let keys = &session.keys;
        let mut guard = KeyRollback::new(&mut self.store);
        guard.track(&keys.shared);
        self.provider
            .ecdh_derive(
                &session.suite.ecc,
                guard.store(),
                &keys.ephemeral_private,
                &params.ephemeral_public_key,
                &keys.shared,
            )
            .inspect_err(|e| {
                warn!(client_id = %session.client_id, error = %e, "key agreement failed");
            })?;
        guard.commit();
        session.session_key_established = true;
        session.establishment_received = true;
        debug!(client_id = %session.client_id, role = ?session.role, "session established");

        // Past this point the session is established; a failed purge leaves
        // the entry for `close` to remove.
        let mut purge = vec![&keys.ephemeral_private];
        if session.role == Role::Initiator {
            purge.push(&keys.ephemeral_public);
            session.pre_session_keys_generated = false;
        }
        for id in purge {
            if let Err(e) = delete_if_present(&mut self.store, id) {
                warn!(
                    client_id = %session.client_id,
                    key = %id,
                    error = %e,
                    "ephemeral key not purged"
                );
            }
        }
        Ok(params.inner_packet)
    }

    fn consume_control(
        &self,
        session: &Session,
        message_type: MessageType,
        encoded_header: &[u8],
        wire: &[u8],
    ) -> Result<Vec<u8>, SmpError> {
        if !session.session_key_established {
            return Err(SmpError::BadSession(format!(
                "{message_type} received before establishment"
            )));
        }
        let params = ControlParams::decode(wire)?;
        let encrypted = message_type.is_encrypted();
        let label = message_type.auth_label(session.role.inbound());
        let aad = control_aad(
            encoded_header,
            &label,
            (!encrypted).then_some(params.inner_packet.as_slice()),
        );
        let ciphertext: &[u8] = if encrypted { &params.inner_packet } else { &[] };
        let plaintext = self
            .provider
            .aead_decrypt(
                &session.suite.aead,
                &self.store,
                &session.keys.shared,
                ciphertext,
                &aad,
                &params.iv,
                &params.auth_tag,
            )
            .inspect_err(|e| {
                if matches!(e, CryptoError::AuthenticationFailed) {
                    warn!(
                        client_id = %session.client_id,
                        %message_type,
                        "control message failed authentication"
                    );
                }
            })?;

        Ok(if encrypted {
            plaintext.to_vec()
        } else {
            params.inner_packet
        })
    }

    /// Delete every session key that still exists and drop the session.
    ///
    /// Missing entries are not an error, so closing a session whose handshake
    /// never completed succeeds. All three deletions are attempted even if
    /// one fails; the first failure is returned.
    ///
    /// # Errors
    /// `Storage` for backend failures other than `NotFound`.
    pub fn close(&mut self, session: Session) -> Result<(), SmpError> {
        let mut first_error = None;
        let mut removed = 0usize;
        for id in session.keys.all() {
            match delete_if_present(&mut self.store, id) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(key = %id, error = %e, "could not delete session key");
                    first_error.get_or_insert(e);
                }
            }
        }
        debug!(client_id = %session.client_id, removed, "session closed");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
