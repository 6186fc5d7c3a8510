pub mod aad;

pub use aad::control_aad;
