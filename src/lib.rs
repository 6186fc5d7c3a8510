//! Crate root for `smp`, the Secure Messaging Protocol.
//!
//! SMP wraps MQTT-like control packets in an authenticated, optionally
//! encrypted envelope between an initiator and a responder that start with
//! no shared secret. A certificate-authenticated ECDH handshake
//! (CONNECT / CONNACK) derives an AES-256-GCM key; every later packet is
//! framed under it.
//!
//! High-level tree:
//! * `core::cbor` – CBOR sequence codec shared by every wire schema.
//! * `ports` – the crypto provider and Key Store capability traits.
//! * `adapters` – P-256 / AES-GCM provider, in-memory and flat-file stores.
//! * `domain` – SMP header, message types and bodies; certificate schema.
//! * `protocol` – certificate chain validation and issuance, control AAD.
//! * `application` – credential bootstrap, certificate authority, and the
//!   session engine (`open` / `produce_message` / `consume_message` / `close`).
//! * `config` – typed configuration.
pub mod adapters;
pub mod application;
pub mod config;
pub mod core;
pub mod domain;
pub mod ports;
pub mod protocol;

#[cfg(test)]
pub(crate) mod test_support;

pub use application::{
    CertificateAuthority, CredentialBundle, ErrorKind, IssuedCredential, Session,
    SessionKeyRefs, SmpEngine, SmpError,
};
pub use config::{CredentialPaths, ReplayPolicy, SmpConfig};
pub use domain::smp::{MessageType, Role};
