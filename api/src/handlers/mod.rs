//! Shared handler plumbing.

pub mod error;
