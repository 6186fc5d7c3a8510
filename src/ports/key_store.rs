//! Key Store port: opaque persistence for secret and credential material.
//!
//! The store is a flat namespace of printable identifiers mapping to opaque
//! byte buffers. There are no transactions and no versioning; callers that
//! need atomic multi-write behaviour track what they wrote and delete it on
//! failure.
use std::fmt;
use zeroize::Zeroizing;

/// Maximum identifier length accepted by [`KeyId::new`].
pub const KEY_ID_MAX_LEN: usize = 64;

/// Validated Key Store identifier.
///
/// Identifiers start with an ASCII alphanumeric character and continue with
/// alphanumerics, `.`, `_` or `-`. The restriction keeps identifiers usable
/// as file names in the flat-file backend without escaping.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(String);

impl KeyId {
    /// Validate and wrap an identifier.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidId`] if the identifier is empty, longer than
    /// [`KEY_ID_MAX_LEN`] or contains a disallowed character.
    pub fn new(id: impl Into<String>) -> Result<Self, StoreError> {
        let id = id.into();
        let mut chars = id.chars();
        let head_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
        let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !head_ok || !tail_ok || id.len() > KEY_ID_MAX_LEN {
            return Err(StoreError::InvalidId(id));
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.0)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("key store entry `{0}` not found")]
    NotFound(KeyId),
    #[error("invalid key store identifier `{0}`")]
    InvalidId(String),
    #[error("key store i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Get/put/delete persistence for opaque byte buffers.
///
/// Contract:
/// * `write` replaces any existing value under the same identifier.
/// * `read` and `delete` report a missing identifier as [`StoreError::NotFound`].
/// * Values returned by `read` are wrapped in [`Zeroizing`] so secret material
///   is wiped when the caller drops it.
///
/// Thread safety is backend-specific; the trait itself imposes no `Sync` bound.
pub trait KeyStore {
    /// Store `bytes` under `id`.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the backend cannot persist the value.
    fn write(&mut self, id: &KeyId, bytes: &[u8]) -> Result<(), StoreError>;

    /// Fetch the value stored under `id`.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if absent or [`StoreError::Io`] on
    /// backend failure.
    fn read(&self, id: &KeyId) -> Result<Zeroizing<Vec<u8>>, StoreError>;

    /// Remove the value stored under `id`.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if absent or [`StoreError::Io`] on
    /// backend failure.
    fn delete(&mut self, id: &KeyId) -> Result<(), StoreError>;

    /// Presence check. The default reads the value and discards it.
    ///
    /// # Errors
    /// Propagates backend failures other than `NotFound`.
    fn contains(&self, id: &KeyId) -> Result<bool, StoreError> {
        match self.read(id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Delete `id`, treating "not found" as success.
///
/// Returns whether a value was actually removed.
///
/// # Errors
/// Propagates backend failures other than `NotFound`.
pub fn delete_if_present(store: &mut dyn KeyStore, id: &KeyId) -> Result<bool, StoreError> {
    match store.delete(id) {
        Ok(()) => Ok(true),
        Err(StoreError::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}
