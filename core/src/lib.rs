//! # CampusHire Core
//!
//! Core business logic and domain layer for the CampusHire verification
//! service. This crate contains the verification record entity, the issuance
//! guard and delivery orchestrator, the verification engine, repository
//! interfaces and error types.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
