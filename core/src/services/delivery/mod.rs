//! Delivery provider contracts

pub mod traits;

pub use traits::{CodeSender, Notifier, ProviderError, ProviderReceipt, RemoteCodeVerifier};
