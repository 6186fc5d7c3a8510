pub mod authority;
pub mod credentials;
pub mod errors;
pub(crate) mod rollback;
pub mod session;

pub use authority::{CertificateAuthority, IssuedCredential};
pub use credentials::CredentialBundle;
pub use errors::{ErrorKind, SmpError};
pub use session::{Session, SessionKeyRefs, SmpEngine};
