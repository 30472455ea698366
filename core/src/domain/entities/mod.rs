//! Domain entities

pub mod verification_record;
