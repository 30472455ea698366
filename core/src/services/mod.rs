//! Business services

pub mod delivery;
pub mod handoff;
pub mod issuance;
pub mod retention;
pub mod verification;

pub use delivery::{CodeSender, Notifier, ProviderError, ProviderReceipt, RemoteCodeVerifier};
pub use handoff::{HandoffOutcome, NoOpSessionHandoff, SessionHandoff};
pub use issuance::{DeliveryOutcome, IssuanceResult, IssuanceService};
pub use retention::{RetentionSweeper, SweepConfig};
pub use verification::{VerificationEngine, VerifiedIdentity};
