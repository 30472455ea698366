//! Configuration modules

pub mod environment;
pub mod verification;

pub use environment::Environment;
pub use verification::VerificationPolicy;
