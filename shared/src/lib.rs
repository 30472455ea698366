//! # CampusHire Shared
//!
//! Shared configuration, common types and identity utilities used across the
//! CampusHire verification service crates.

pub mod config;
pub mod types;
pub mod utils;
