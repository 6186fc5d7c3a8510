//! Process-wide device credentials.
//!
//! The bundle names three Key Store entries: the trusted root CA certificate,
//! the device's own certificate and its long-term private key. It is built
//! once at start-up by [`CredentialBundle::bootstrap`] and then handed by
//! reference to every `SmpEngine::open` call; sessions copy the identifiers,
//! never the bytes.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use zeroize::Zeroizing;

use super::errors::SmpError;
use super::rollback::KeyRollback;
use crate::config::CredentialPaths;
use crate::domain::cert::Certificate;
use crate::ports::crypto::P256_PRIVATE_KEY_LEN;
use crate::ports::key_store::{KeyId, KeyStore, StoreError, delete_if_present};

pub const ROOT_CA_KEY_ID: &str = "smp.root_ca";
pub const SELF_CERT_KEY_ID: &str = "smp.self_cert";
pub const SELF_KEY_KEY_ID: &str = "smp.self_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credential {
    RootCa,
    SelfCert,
    SelfKey,
}

/// Identifiers of the provisioned credentials.
///
/// The self-certificate entry is the whole chain sent to the peer: a single
/// device certificate issued directly by the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    root_ca: KeyId,
    self_cert: KeyId,
    self_key: KeyId,
}

impl CredentialBundle {
    fn well_known() -> Result<Self, SmpError> {
        Ok(Self {
            root_ca: KeyId::new(ROOT_CA_KEY_ID)?,
            self_cert: KeyId::new(SELF_CERT_KEY_ID)?,
            self_key: KeyId::new(SELF_KEY_KEY_ID)?,
        })
    }

    fn entries(&self) -> [(Credential, &KeyId); 3] {
        [
            (Credential::RootCa, &self.root_ca),
            (Credential::SelfCert, &self.self_cert),
            (Credential::SelfKey, &self.self_key),
        ]
    }

    /// Populate the Key Store from `paths`, skipping entries already present.
    ///
    /// Stored values are never overwritten, even if the file on disk changed.
    /// Anything written by this call is deleted again if a later step fails.
    ///
    /// # Errors
    /// * [`SmpError::BadParams`] for an empty path or a file that is not a
    ///   certificate / raw P-256 private key.
    /// * [`SmpError::CredentialFile`] if a file cannot be read.
    /// * [`SmpError::Storage`] on Key Store failure.
    pub fn bootstrap(store: &mut dyn KeyStore, paths: &CredentialPaths) -> Result<Self, SmpError> {
        let bundle = Self::well_known()?;
        let sources = [&paths.root_ca, &paths.self_cert, &paths.self_key];
        let mut guard = KeyRollback::new(store);
        let mut loaded = 0usize;
        for ((which, id), path) in bundle.entries().into_iter().zip(sources) {
            if guard.store().contains(id)? {
                debug!(key = %id, "credential already present, keeping stored value");
                continue;
            }
            let bytes = read_credential(path)?;
            check_credential(which, id, &bytes)?;
            guard.track(id);
            guard.store().write(id, &bytes)?;
            loaded += 1;
        }
        guard.commit();
        info!(loaded, "credential bundle bootstrapped");
        Ok(bundle)
    }

    /// Bundle for credentials already in the Key Store (e.g. provisioned by
    /// an earlier process).
    ///
    /// # Errors
    /// [`SmpError::Storage`] with `NotFound` for the first missing entry.
    pub fn provisioned(store: &dyn KeyStore) -> Result<Self, SmpError> {
        let bundle = Self::well_known()?;
        for (_, id) in bundle.entries() {
            if !store.contains(id)? {
                return Err(StoreError::NotFound(id.clone()).into());
            }
        }
        Ok(bundle)
    }

    /// Delete all three entries. Entries that are already gone are skipped.
    ///
    /// # Errors
    /// [`SmpError::Storage`] for backend failures other than `NotFound`.
    pub fn teardown(self, store: &mut dyn KeyStore) -> Result<(), SmpError> {
        let mut removed = 0usize;
        for (_, id) in self.entries() {
            if delete_if_present(store, id)? {
                removed += 1;
            }
        }
        info!(removed, "credential bundle torn down");
        Ok(())
    }

    #[must_use]
    pub fn root_ca(&self) -> &KeyId {
        &self.root_ca
    }

    #[must_use]
    pub fn self_cert(&self) -> &KeyId {
        &self.self_cert
    }

    #[must_use]
    pub fn self_key(&self) -> &KeyId {
        &self.self_key
    }
}

fn read_credential(path: &Path) -> Result<Zeroizing<Vec<u8>>, SmpError> {
    if path.as_os_str().is_empty() {
        return Err(SmpError::BadParams("credential path is empty".into()));
    }
    fs::read(path)
        .map(Zeroizing::new)
        .map_err(|source| SmpError::CredentialFile {
            path: path.to_path_buf(),
            source,
        })
}

fn check_credential(which: Credential, id: &KeyId, bytes: &[u8]) -> Result<(), SmpError> {
    match which {
        Credential::RootCa | Credential::SelfCert => Certificate::parse(bytes)
            .map(|_| ())
            .map_err(|e| SmpError::BadParams(format!("`{id}` is not a certificate: {e}"))),
        Credential::SelfKey if bytes.len() == P256_PRIVATE_KEY_LEN => Ok(()),
        Credential::SelfKey => Err(SmpError::BadParams(format!(
            "`{id}` must be a {P256_PRIVATE_KEY_LEN}-byte private key, got {} bytes",
            bytes.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::MemoryKeyStore;
    use crate::application::errors::ErrorKind;
    use crate::test_support::support::write_device_files;

    #[test]
    fn bootstrap_loads_all_three() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_device_files(dir.path(), "device-1");
        let mut store = MemoryKeyStore::new();
        let bundle = CredentialBundle::bootstrap(&mut store, &paths).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.read(bundle.self_key()).unwrap().as_slice(),
            fs::read(&paths.self_key).unwrap().as_slice()
        );
        assert_eq!(CredentialBundle::provisioned(&store).unwrap(), bundle);
    }

    #[test]
    fn bootstrap_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_device_files(dir.path(), "device-1");
        let mut store = MemoryKeyStore::new();
        let id = KeyId::new(ROOT_CA_KEY_ID).unwrap();
        let first = CredentialBundle::bootstrap(&mut store, &paths).unwrap();
        let stored = store.read(first.root_ca()).unwrap();

        // rotate the files on disk; the store keeps the first values
        write_device_files(dir.path(), "device-2");
        CredentialBundle::bootstrap(&mut store, &paths).unwrap();
        assert_eq!(store.read(&id).unwrap(), stored);
    }

    #[test]
    fn failure_rolls_back_partial_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_device_files(dir.path(), "device-1");
        paths.self_key = dir.path().join("missing.key");
        let mut store = MemoryKeyStore::new();
        let err = CredentialBundle::bootstrap(&mut store, &paths).unwrap_err();
        assert!(matches!(err, SmpError::CredentialFile { .. }));
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(store.is_empty());
    }

    #[test]
    fn rejects_non_certificate_and_empty_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_device_files(dir.path(), "device-1");
        fs::write(&paths.self_cert, b"not a cert").unwrap();
        let mut store = MemoryKeyStore::new();
        let err = CredentialBundle::bootstrap(&mut store, &paths).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadParams);
        assert!(store.is_empty());

        paths.root_ca = Default::default();
        let err = CredentialBundle::bootstrap(&mut store, &paths).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadParams);
    }

    #[test]
    fn teardown_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_device_files(dir.path(), "device-1");
        let mut store = MemoryKeyStore::new();
        let bundle = CredentialBundle::bootstrap(&mut store, &paths).unwrap();
        bundle.clone().teardown(&mut store).unwrap();
        assert!(store.is_empty());
        bundle.teardown(&mut store).unwrap();
        assert!(matches!(
            CredentialBundle::provisioned(&store),
            Err(SmpError::Storage(StoreError::NotFound(_)))
        ));
    }
}
