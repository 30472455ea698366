//! Verification engine: validates submitted codes against stored records

pub mod engine;
pub mod types;

pub use engine::VerificationEngine;
pub use types::VerifiedIdentity;
