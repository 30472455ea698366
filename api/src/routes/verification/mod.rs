//! Verification endpoints.

pub mod request_code;
pub mod verify_code;

use std::sync::Arc;

use ch_core::repositories::{AccountDirectory, RecordStore};
use ch_core::services::handoff::SessionHandoff;
use ch_core::services::issuance::IssuanceService;
use ch_core::services::verification::VerificationEngine;

/// Shared application state for the verification endpoints
pub struct AppState<R, A>
where
    R: RecordStore,
    A: AccountDirectory,
{
    pub issuance: Arc<IssuanceService<R, A>>,
    pub engine: Arc<VerificationEngine<R>>,
    pub handoff: Arc<dyn SessionHandoff>,
}
