pub mod cert;
pub mod smp;
