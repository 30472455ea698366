//! Utility modules

pub mod identity;
