//! # CampusHire Infrastructure
//!
//! Provider gateway adapters (chat-webhook, SMS, transactional email), the
//! in-memory record store and supporting plumbing for the CampusHire
//! verification service.

pub mod providers;
pub mod store;

use thiserror::Error;

/// Infrastructure layer errors
#[derive(Error, Debug)]
pub enum InfrastructureError {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure building an HTTP client
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
