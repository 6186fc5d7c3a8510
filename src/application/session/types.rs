use crate::application::credentials::CredentialBundle;
use crate::domain::smp::Role;
use crate::ports::crypto::CipherSuite;
use crate::ports::key_store::KeyId;

/// Key Store identifiers of the secrets belonging to one session.
///
/// The session never holds key bytes; it names them. The shared-key id is
/// reserved at open time and only written once the handshake completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeyRefs {
    pub ephemeral_private: KeyId,
    pub ephemeral_public: KeyId,
    pub shared: KeyId,
}

impl SessionKeyRefs {
    pub(crate) fn all(&self) -> [&KeyId; 3] {
        [&self.ephemeral_private, &self.ephemeral_public, &self.shared]
    }
}

/// State of one SMP session, owned by a single caller between
/// `SmpEngine::open` and `SmpEngine::close`.
///
/// Not `Clone`: closing consumes the session.
#[derive(Debug)]
pub struct Session {
    pub(crate) client_id: String,
    pub(crate) role: Role,
    pub(crate) suite: CipherSuite,
    pub(crate) keys: SessionKeyRefs,
    pub(crate) credentials: CredentialBundle,
    pub(crate) pre_session_keys_generated: bool,
    pub(crate) session_key_established: bool,
    /// This side's establishment message has been produced.
    pub(crate) establishment_sent: bool,
    /// The peer's establishment message has been consumed.
    pub(crate) establishment_received: bool,
    pub(crate) to_be_sent_message_id: u64,
    pub(crate) last_received_message_id: u64,
    pub(crate) received_any: bool,
}

impl Session {
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn cipher_suite(&self) -> CipherSuite {
        self.suite
    }

    #[must_use]
    pub fn key_refs(&self) -> &SessionKeyRefs {
        &self.keys
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialBundle {
        &self.credentials
    }

    #[must_use]
    pub fn pre_session_keys_generated(&self) -> bool {
        self.pre_session_keys_generated
    }

    /// True once the shared key exists; gates all control messages.
    #[must_use]
    pub fn is_established(&self) -> bool {
        self.session_key_established
    }

    /// Id the next produced message will carry.
    #[must_use]
    pub fn next_message_id(&self) -> u64 {
        self.to_be_sent_message_id
    }

    #[must_use]
    pub fn last_received_message_id(&self) -> u64 {
        self.last_received_message_id
    }
}
