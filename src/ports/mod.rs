pub mod crypto;
pub mod key_store;

pub use crypto::*;
pub use key_store::*;
