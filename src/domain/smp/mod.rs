//! SMP wire vocabulary: message types, roles, the header, and the two message
//! body schemas. Everything here is pure data plus codec bindings; no crypto,
//! no Key Store access.

pub mod errors;
pub mod header;
pub mod message_type;
pub mod params;
pub mod role;

pub use errors::WireError;
pub use header::SmpHeader;
pub use message_type::{AUTH_LABEL_LEN, MessageType};
pub use params::{ControlParams, SessionEstablishmentParams, signed_payload};
pub use role::{Direction, Role};

/// Message context value for SMP over MQTT.
pub const MESSAGE_CONTEXT_SMP_MQTT: u64 = 1;
/// The only supported context version.
pub const MESSAGE_CONTEXT_VERSION: u64 = 1;
/// P-256 ECDH/ECDSA with AES-256-GCM; the only negotiable scheme.
pub const CIPHER_SCHEME_P256_AES256GCM: u8 = 1;
/// Upper bound on the client id carried in every header.
pub const CLIENT_ID_MAX_LEN: usize = 32;
pub(crate) const CERT_CHAIN_MAX: usize = 8; // upper bound on certCount
pub(crate) const CERT_MAX: usize = 16 * 1024; // upper bound per certificate blob
