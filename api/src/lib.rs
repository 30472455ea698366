//! # CampusHire API
//!
//! HTTP surface over the verification core: code issuance and code
//! verification endpoints, plus health. Route handlers stay thin; guard
//! checks, delivery orchestration and the attempt state machine all live in
//! `ch_core`.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
