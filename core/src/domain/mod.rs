//! Domain layer: entities and value types

pub mod entities;

pub use entities::verification_record::{
    Channel, Identity, UserType, VerificationRecord, CODE_LENGTH,
};
