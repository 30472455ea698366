//! Code issuance: guard checks and delivery orchestration

pub mod service;
pub mod types;

pub use service::IssuanceService;
pub use types::{DeliveryOutcome, IssuanceResult};
