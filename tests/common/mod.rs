#![allow(dead_code)]
//! Shared fixtures for the integration tests: a root CA, device credentials
//! bootstrapped from files, and a connected initiator/responder pair.

use std::fs;
use std::path::Path;

use smp::adapters::crypto::RustCryptoProvider;
use smp::adapters::store::MemoryKeyStore;
use smp::{
    CertificateAuthority, CredentialBundle, CredentialPaths, MessageType, Role, Session,
    SmpConfig, SmpEngine,
};

pub const CLIENT_ID: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

pub type Engine = SmpEngine<RustCryptoProvider, MemoryKeyStore>;

pub fn root_ca() -> CertificateAuthority<RustCryptoProvider> {
    CertificateAuthority::generate(RustCryptoProvider, "integration-root").unwrap()
}

/// Issue a device credential and write it in the bootstrap layout.
pub fn write_credentials(
    ca: &mut CertificateAuthority<RustCryptoProvider>,
    dir: &Path,
    subject: &str,
) -> CredentialPaths {
    let device = ca.issue(subject).unwrap();
    let paths = CredentialPaths::in_dir(dir);
    fs::create_dir_all(dir).unwrap();
    fs::write(&paths.root_ca, ca.certificate()).unwrap();
    fs::write(&paths.self_cert, &device.certificate).unwrap();
    fs::write(&paths.self_key, device.private_key.as_slice()).unwrap();
    paths
}

/// Engine whose store was bootstrapped from freshly written files.
pub fn engine(
    ca: &mut CertificateAuthority<RustCryptoProvider>,
    subject: &str,
) -> (Engine, CredentialBundle) {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_credentials(ca, dir.path(), subject);
    let mut store = MemoryKeyStore::new();
    let creds = CredentialBundle::bootstrap(&mut store, &paths).unwrap();
    (
        SmpEngine::new(RustCryptoProvider, store, SmpConfig::default()),
        creds,
    )
}

pub struct Pair {
    pub initiator: Engine,
    pub responder: Engine,
    pub client: Session,
    pub broker: Session,
}

impl Pair {
    pub fn open() -> Self {
        let mut ca = root_ca();
        let (mut initiator, ic) = engine(&mut ca, "client");
        let (mut responder, rc) = engine(&mut ca, "broker");
        let client = initiator.open(&ic, Role::Initiator, CLIENT_ID).unwrap();
        let broker = responder.open(&rc, Role::Responder, CLIENT_ID).unwrap();
        Self {
            initiator,
            responder,
            client,
            broker,
        }
    }

    pub fn connected() -> Self {
        let mut p = Self::open();
        let connect = p
            .initiator
            .produce_message(&mut p.client, MessageType::Connect, b"mqtt-connect-bytes")
            .unwrap();
        p.responder.consume_message(&mut p.broker, &connect).unwrap();
        let connack = p
            .responder
            .produce_message(&mut p.broker, MessageType::Connack, b"mqtt-connack-bytes")
            .unwrap();
        p.initiator.consume_message(&mut p.client, &connack).unwrap();
        p
    }
}
