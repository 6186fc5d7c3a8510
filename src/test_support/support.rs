#![allow(dead_code)]
use std::fs;
use std::io;
use std::path::Path;

use crate::adapters::crypto::RustCryptoProvider;
use crate::adapters::store::MemoryKeyStore;
use crate::application::authority::CertificateAuthority;
use crate::application::credentials::{
    CredentialBundle, ROOT_CA_KEY_ID, SELF_CERT_KEY_ID, SELF_KEY_KEY_ID,
};
use crate::application::session::{Session, SmpEngine};
use crate::config::{CredentialPaths, SmpConfig};
use crate::domain::smp::{MessageType, Role};
use crate::ports::crypto::{CryptoProvider, EccOptions};
use crate::ports::key_store::{KeyId, KeyStore, StoreError};

pub const ROOT_SUBJECT: &str = "smp-root-ca";
pub const CLIENT_ID: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

pub type TestEngine = SmpEngine<RustCryptoProvider, MemoryKeyStore>;

/// Root CA plus an issuer-first chain of `depth` certificates; the last one
/// is the leaf whose key lives in `store`.
pub struct Pki {
    pub store: MemoryKeyStore,
    pub root: Vec<u8>,
    pub chain: Vec<Vec<u8>>,
    leaf_key: KeyId,
}

impl Pki {
    pub fn new(depth: usize) -> Self {
        assert!(depth >= 1);
        let mut ca = CertificateAuthority::generate(RustCryptoProvider, ROOT_SUBJECT).unwrap();
        let root = ca.certificate().to_vec();
        let mut chain = Vec::new();
        let mut store = MemoryKeyStore::new();
        let leaf_key = KeyId::new("leaf.key").unwrap();
        for level in 1..=depth {
            let issued = ca.issue(&format!("level-{level}")).unwrap();
            chain.push(issued.certificate.clone());
            if level == depth {
                store.write(&leaf_key, &issued.private_key).unwrap();
            } else {
                ca = CertificateAuthority::from_parts(
                    RustCryptoProvider,
                    issued.certificate,
                    &issued.private_key,
                )
                .unwrap();
            }
        }
        Self {
            store,
            root,
            chain,
            leaf_key,
        }
    }

    pub fn sign_leaf(&self, data: &[u8]) -> Vec<u8> {
        RustCryptoProvider
            .ecc_sign(&EccOptions::P256_SHA256, &self.store, &self.leaf_key, data)
            .unwrap()
    }
}

/// Write root CA, device certificate and device key under `dir` in the
/// bootstrap layout.
pub fn write_device_files(dir: &Path, subject: &str) -> CredentialPaths {
    let mut ca = CertificateAuthority::generate(RustCryptoProvider, ROOT_SUBJECT).unwrap();
    let device = ca.issue(subject).unwrap();
    let paths = CredentialPaths::in_dir(dir);
    fs::write(&paths.root_ca, ca.certificate()).unwrap();
    fs::write(&paths.self_cert, &device.certificate).unwrap();
    fs::write(&paths.self_key, device.private_key.as_slice()).unwrap();
    paths
}

/// Store provisioned with a device credential issued by `ca`.
pub fn provisioned_store(
    ca: &mut CertificateAuthority<RustCryptoProvider>,
    subject: &str,
) -> (MemoryKeyStore, CredentialBundle) {
    let device = ca.issue(subject).unwrap();
    let mut store = MemoryKeyStore::new();
    put(&mut store, ROOT_CA_KEY_ID, ca.certificate());
    put(&mut store, SELF_CERT_KEY_ID, &device.certificate);
    put(&mut store, SELF_KEY_KEY_ID, &device.private_key);
    let bundle = CredentialBundle::provisioned(&store).unwrap();
    (store, bundle)
}

fn put(store: &mut MemoryKeyStore, id: &str, bytes: &[u8]) {
    store.write(&KeyId::new(id).unwrap(), bytes).unwrap();
}

/// Initiator and responder engines sharing one root CA, each with an open
/// session for [`CLIENT_ID`].
pub struct Peers {
    pub initiator: TestEngine,
    pub responder: TestEngine,
    pub client: Session,
    pub broker: Session,
}

impl Peers {
    pub fn open_with(config: SmpConfig) -> Self {
        let mut ca = CertificateAuthority::generate(RustCryptoProvider, ROOT_SUBJECT).unwrap();
        let (client_store, client_creds) = provisioned_store(&mut ca, "client");
        let (broker_store, broker_creds) = provisioned_store(&mut ca, "broker");
        let mut initiator = SmpEngine::new(RustCryptoProvider, client_store, config.clone());
        let mut responder = SmpEngine::new(RustCryptoProvider, broker_store, config);
        let client = initiator
            .open(&client_creds, Role::Initiator, CLIENT_ID)
            .unwrap();
        let broker = responder
            .open(&broker_creds, Role::Responder, CLIENT_ID)
            .unwrap();
        Self {
            initiator,
            responder,
            client,
            broker,
        }
    }

    pub fn open() -> Self {
        Self::open_with(SmpConfig::default())
    }

    /// CONNECT / CONNACK exchange; both sessions end up established.
    pub fn established() -> Self {
        let mut p = Self::open();
        p.handshake();
        p
    }

    pub fn handshake(&mut self) {
        let connect = self
            .initiator
            .produce_message(&mut self.client, MessageType::Connect, b"mqtt-connect-bytes")
            .unwrap();
        self.responder
            .consume_message(&mut self.broker, &connect)
            .unwrap();
        let connack = self
            .responder
            .produce_message(&mut self.broker, MessageType::Connack, b"mqtt-connack-bytes")
            .unwrap();
        self.initiator
            .consume_message(&mut self.client, &connack)
            .unwrap();
    }

    pub fn client_to_broker(&mut self, t: MessageType, packet: &[u8]) -> Vec<u8> {
        let wire = self
            .initiator
            .produce_message(&mut self.client, t, packet)
            .unwrap();
        self.responder
            .consume_message(&mut self.broker, &wire)
            .unwrap()
    }

    pub fn broker_to_client(&mut self, t: MessageType, packet: &[u8]) -> Vec<u8> {
        let wire = self
            .responder
            .produce_message(&mut self.broker, t, packet)
            .unwrap();
        self.initiator
            .consume_message(&mut self.client, &wire)
            .unwrap()
    }
}

/// `MemoryKeyStore` wrapper that fails one chosen write or delete.
///
/// `fail_write_in(n)` lets `n` more writes through and fails the next one;
/// `fail_delete_of(id)` fails every delete of `id` until `heal()`.
#[derive(Default)]
pub struct FaultStore {
    pub inner: MemoryKeyStore,
    writes_left: Option<usize>,
    broken_delete: Option<KeyId>,
}

impl FaultStore {
    pub fn wrap(inner: MemoryKeyStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn fail_write_in(&mut self, n: usize) {
        self.writes_left = Some(n);
    }

    pub fn fail_delete_of(&mut self, id: &KeyId) {
        self.broken_delete = Some(id.clone());
    }

    pub fn heal(&mut self) {
        self.writes_left = None;
        self.broken_delete = None;
    }

    fn injected(what: &str) -> StoreError {
        StoreError::Io(io::Error::other(format!("injected {what} failure")))
    }
}

impl KeyStore for FaultStore {
    fn write(&mut self, id: &KeyId, bytes: &[u8]) -> Result<(), StoreError> {
        match self.writes_left {
            Some(0) => {
                self.writes_left = None;
                return Err(Self::injected("write"));
            }
            Some(n) => self.writes_left = Some(n - 1),
            None => {}
        }
        self.inner.write(id, bytes)
    }

    fn read(&self, id: &KeyId) -> Result<zeroize::Zeroizing<Vec<u8>>, StoreError> {
        self.inner.read(id)
    }

    fn delete(&mut self, id: &KeyId) -> Result<(), StoreError> {
        if self.broken_delete.as_ref() == Some(id) {
            return Err(Self::injected("delete"));
        }
        self.inner.delete(id)
    }
}
