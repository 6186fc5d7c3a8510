//! Credential bootstrap against real files and the flat-file Key Store.

mod common;

use std::fs;

use smp::adapters::crypto::RustCryptoProvider;
use smp::adapters::store::FileKeyStore;
use smp::ports::key_store::KeyStore;
use smp::{CredentialBundle, ErrorKind, MessageType, Role, SmpConfig, SmpEngine};

#[test]
fn bootstrap_into_file_store_survives_restart() {
    let files = tempfile::tempdir().unwrap();
    let keys = tempfile::tempdir().unwrap();
    let mut ca = common::root_ca();
    let paths = common::write_credentials(&mut ca, files.path(), "device");

    {
        let mut store = FileKeyStore::open(keys.path()).unwrap();
        CredentialBundle::bootstrap(&mut store, &paths).unwrap();
    }
    // files gone: a second process start relies on the stored copies
    fs::remove_dir_all(files.path()).unwrap();
    let mut store = FileKeyStore::open(keys.path()).unwrap();
    let bundle = CredentialBundle::bootstrap(&mut store, &paths).unwrap();
    assert_eq!(CredentialBundle::provisioned(&store).unwrap(), bundle);
}

#[test]
fn sessions_run_on_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut ca = common::root_ca();
    let client_paths = common::write_credentials(&mut ca, &dir.path().join("client"), "client");
    let broker_paths = common::write_credentials(&mut ca, &dir.path().join("broker"), "broker");

    let mut cstore = FileKeyStore::open(dir.path().join("client-keys")).unwrap();
    let ccreds = CredentialBundle::bootstrap(&mut cstore, &client_paths).unwrap();
    let mut bstore = FileKeyStore::open(dir.path().join("broker-keys")).unwrap();
    let bcreds = CredentialBundle::bootstrap(&mut bstore, &broker_paths).unwrap();

    let mut client_engine = SmpEngine::new(RustCryptoProvider, cstore, SmpConfig::default());
    let mut broker_engine = SmpEngine::new(RustCryptoProvider, bstore, SmpConfig::default());
    let mut client = client_engine
        .open(&ccreds, Role::Initiator, common::CLIENT_ID)
        .unwrap();
    let mut broker = broker_engine
        .open(&bcreds, Role::Responder, common::CLIENT_ID)
        .unwrap();

    let connect = client_engine
        .produce_message(&mut client, MessageType::Connect, b"c")
        .unwrap();
    broker_engine.consume_message(&mut broker, &connect).unwrap();
    let connack = broker_engine
        .produce_message(&mut broker, MessageType::Connack, b"a")
        .unwrap();
    client_engine.consume_message(&mut client, &connack).unwrap();

    let wire = broker_engine
        .produce_message(&mut broker, MessageType::Suback, b"granted")
        .unwrap();
    assert_eq!(client_engine.consume_message(&mut client, &wire).unwrap(), b"granted");

    let shared = client.key_refs().shared.clone();
    client_engine.close(client).unwrap();
    broker_engine.close(broker).unwrap();
    assert!(!client_engine.store().contains(&shared).unwrap());
    // only the three credential files are left
    assert_eq!(fs::read_dir(dir.path().join("client-keys")).unwrap().count(), 3);
}

#[test]
fn teardown_then_teardown_again() {
    let files = tempfile::tempdir().unwrap();
    let keys = tempfile::tempdir().unwrap();
    let mut ca = common::root_ca();
    let paths = common::write_credentials(&mut ca, files.path(), "device");
    let mut store = FileKeyStore::open(keys.path()).unwrap();
    let bundle = CredentialBundle::bootstrap(&mut store, &paths).unwrap();
    bundle.clone().teardown(&mut store).unwrap();
    bundle.teardown(&mut store).unwrap();
    let err = CredentialBundle::provisioned(&store).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[test]
fn missing_file_fails_with_storage_kind_and_rolls_back() {
    let files = tempfile::tempdir().unwrap();
    let keys = tempfile::tempdir().unwrap();
    let mut ca = common::root_ca();
    let paths = common::write_credentials(&mut ca, files.path(), "device");
    fs::remove_file(&paths.self_key).unwrap();
    let mut store = FileKeyStore::open(keys.path()).unwrap();
    let err = CredentialBundle::bootstrap(&mut store, &paths).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(fs::read_dir(keys.path()).unwrap().count(), 0);
}
