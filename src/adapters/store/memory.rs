use crate::ports::key_store::{KeyId, KeyStore, StoreError};
use std::collections::HashMap;
use zeroize::Zeroizing;

/// Process-local `KeyStore` backed by a `HashMap`.
///
/// Values are held in [`Zeroizing`] buffers, so deleted or overwritten
/// entries (and the whole map on drop) are wiped. Not `Sync`-safe for shared
/// mutation; wrap it in a lock if several threads drive sessions at once.
#[derive(Default)]
pub struct MemoryKeyStore {
    entries: HashMap<KeyId, Zeroizing<Vec<u8>>>,
}

impl MemoryKeyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyStore for MemoryKeyStore {
    fn write(&mut self, id: &KeyId, bytes: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(id.clone(), Zeroizing::new(bytes.to_vec()));
        Ok(())
    }

    fn read(&self, id: &KeyId) -> Result<Zeroizing<Vec<u8>>, StoreError> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn delete(&mut self, id: &KeyId) -> Result<(), StoreError> {
        self.entries
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn contains(&self, id: &KeyId) -> Result<bool, StoreError> {
        Ok(self.entries.contains_key(id))
    }
}
