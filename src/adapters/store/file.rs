use crate::ports::key_store::{KeyId, KeyStore, StoreError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Flat-file `KeyStore`: one file per identifier inside a root directory.
///
/// Identifiers are validated by [`KeyId`] so they map to plain file names.
/// Writes go through a temporary sibling file and a rename, so a reader never
/// observes a half-written value. There is no locking: concurrent use from
/// several processes or threads must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    root: PathBuf,
}

impl FileKeyStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, id: &KeyId) -> PathBuf {
        self.root.join(id.as_str())
    }
}

fn not_found_or_io(id: &KeyId, e: std::io::Error) -> StoreError {
    if e.kind() == ErrorKind::NotFound {
        StoreError::NotFound(id.clone())
    } else {
        StoreError::Io(e)
    }
}

impl KeyStore for FileKeyStore {
    fn write(&mut self, id: &KeyId, bytes: &[u8]) -> Result<(), StoreError> {
        let target = self.path_of(id);
        // leading dot: never a valid `KeyId`, so never a live entry
        let tmp = self.root.join(format!(".{}.tmp", id.as_str()));
        let mut opts = fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut f = opts.open(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn read(&self, id: &KeyId) -> Result<Zeroizing<Vec<u8>>, StoreError> {
        fs::read(self.path_of(id))
            .map(Zeroizing::new)
            .map_err(|e| not_found_or_io(id, e))
    }

    fn delete(&mut self, id: &KeyId) -> Result<(), StoreError> {
        fs::remove_file(self.path_of(id)).map_err(|e| not_found_or_io(id, e))
    }

    fn contains(&self, id: &KeyId) -> Result<bool, StoreError> {
        match fs::metadata(self.path_of(id)) {
            Ok(m) => Ok(m.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
