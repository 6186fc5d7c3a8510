//! Typed configuration for the engine and the credential bootstrap.

use std::path::{Path, PathBuf};

/// Directory holding the credential files, relative to the working directory.
pub const DEFAULT_CREDENTIAL_DIR: &str = "certs";
pub const ROOT_CA_FILE: &str = "root_ca.cert";
pub const SELF_CERT_FILE: &str = "self.cert";
pub const SELF_KEY_FILE: &str = "self.key";
/// Default upper bound on an inner packet handed to `produce_message`.
pub const DEFAULT_MAX_PACKET_LEN: usize = 256 * 1024;

/// Where the bootstrap reads the device credentials from.
///
/// Each file is a raw blob: certificates in container format, the private
/// key as a 32-byte P-256 scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPaths {
    pub root_ca: PathBuf,
    pub self_cert: PathBuf,
    pub self_key: PathBuf,
}

impl CredentialPaths {
    /// The well-known file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            root_ca: dir.join(ROOT_CA_FILE),
            self_cert: dir.join(SELF_CERT_FILE),
            self_key: dir.join(SELF_KEY_FILE),
        }
    }
}

impl Default for CredentialPaths {
    fn default() -> Self {
        Self::in_dir(DEFAULT_CREDENTIAL_DIR)
    }
}

/// How incoming message ids are checked against the receive watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayPolicy {
    /// Accept ids `>=` the last accepted id; exact repeats pass.
    #[default]
    NonDecreasing,
    /// Accept ids `>` the last accepted id (the first message may carry 0).
    StrictlyIncreasing,
}

impl ReplayPolicy {
    /// Whether `incoming` is acceptable given the watermark. `received_any`
    /// is false until the session has accepted its first message.
    #[must_use]
    pub fn accepts(self, last_received: u64, incoming: u64, received_any: bool) -> bool {
        match self {
            ReplayPolicy::NonDecreasing => incoming >= last_received,
            ReplayPolicy::StrictlyIncreasing => !received_any || incoming > last_received,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmpConfig {
    pub replay_policy: ReplayPolicy,
    pub max_packet_len: usize,
}

impl Default for SmpConfig {
    fn default() -> Self {
        Self {
            replay_policy: ReplayPolicy::default(),
            max_packet_len: DEFAULT_MAX_PACKET_LEN,
        }
    }
}
