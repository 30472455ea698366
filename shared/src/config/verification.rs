//! Verification policy configuration
//!
//! One configuration object carries every tunable of the issuance and
//! verification flows. It is built once at startup and injected into the
//! services; nothing in the engine reads the process environment directly.

use serde::{Deserialize, Serialize};
use std::env;

/// Policy values governing code issuance and verification.
///
/// A single expiry window applies to every flow. Earlier deployments drifted
/// between 15 and 10 minute windows across flows; the window is now unified
/// and configurable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationPolicy {
    /// Minutes before an issued code expires
    pub code_expiry_minutes: i64,
    /// Maximum number of verification attempts per record
    pub max_attempts: u32,
    /// Minimum seconds between issuance requests for one identity
    pub cooldown_seconds: i64,
    /// Hours a record is retained before the passive sweep removes it
    pub retention_hours: i64,
    /// Per-call provider timeout in seconds
    pub provider_timeout_seconds: u64,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            code_expiry_minutes: 15,
            max_attempts: 3,
            cooldown_seconds: 60,
            retention_hours: 24,
            provider_timeout_seconds: 10,
        }
    }
}

impl VerificationPolicy {
    /// Build the policy from environment variables, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            code_expiry_minutes: env_parse("VERIFY_CODE_EXPIRY_MINUTES", defaults.code_expiry_minutes),
            max_attempts: env_parse("VERIFY_MAX_ATTEMPTS", defaults.max_attempts),
            cooldown_seconds: env_parse("VERIFY_COOLDOWN_SECONDS", defaults.cooldown_seconds),
            retention_hours: env_parse("VERIFY_RETENTION_HOURS", defaults.retention_hours),
            provider_timeout_seconds: env_parse(
                "VERIFY_PROVIDER_TIMEOUT_SECONDS",
                defaults.provider_timeout_seconds,
            ),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
