pub mod engine;
pub mod types;

pub use engine::SmpEngine;
pub use types::{Session, SessionKeyRefs};
