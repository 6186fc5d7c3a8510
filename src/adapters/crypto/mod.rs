pub mod p256_aes_gcm;

pub use p256_aes_gcm::RustCryptoProvider;
