pub mod issue;
pub mod validator;

pub use issue::{issue_certificate, self_signed_root};
pub use validator::{ChainVerdict, validate_chain};
