use tracing::warn;

use crate::ports::key_store::{KeyId, KeyStore, StoreError};

/// Deletes every tracked Key Store entry on drop unless committed.
///
/// Multi-step operations track each identifier *before* the step that may
/// write it, so a failure anywhere nets to zero entries left behind.
/// Identifiers that were never written are skipped silently.
pub(crate) struct KeyRollback<'s> {
    store: &'s mut dyn KeyStore,
    tracked: Vec<KeyId>,
    armed: bool,
}

impl<'s> KeyRollback<'s> {
    pub(crate) fn new(store: &'s mut dyn KeyStore) -> Self {
        Self {
            store,
            tracked: Vec::new(),
            armed: true,
        }
    }

    pub(crate) fn track(&mut self, id: &KeyId) {
        self.tracked.push(id.clone());
    }

    pub(crate) fn store(&mut self) -> &mut dyn KeyStore {
        &mut *self.store
    }

    /// Keep everything written so far.
    pub(crate) fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for KeyRollback<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for id in self.tracked.iter().rev() {
            match self.store.delete(id) {
                Ok(()) | Err(StoreError::NotFound(_)) => {}
                Err(e) => warn!(key = %id, error = %e, "rollback could not delete key store entry"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::MemoryKeyStore;

    fn id(s: &str) -> KeyId {
        KeyId::new(s).unwrap()
    }

    #[test]
    fn drop_without_commit_deletes_tracked() {
        let mut store = MemoryKeyStore::new();
        store.write(&id("keep"), b"x").unwrap();
        {
            let mut g = KeyRollback::new(&mut store);
            g.track(&id("a"));
            g.store().write(&id("a"), b"1").unwrap();
            // tracked but never written
            g.track(&id("b"));
        }
        assert!(!store.contains(&id("a")).unwrap());
        assert!(store.contains(&id("keep")).unwrap());
    }

    #[test]
    fn commit_keeps_entries() {
        let mut store = MemoryKeyStore::new();
        let mut g = KeyRollback::new(&mut store);
        g.track(&id("a"));
        g.store().write(&id("a"), b"1").unwrap();
        g.commit();
        assert!(store.contains(&id("a")).unwrap());
    }
}
