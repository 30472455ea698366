//! Repository interfaces and in-memory mocks

pub mod account;
pub mod record;

pub use account::AccountDirectory;
pub use record::{AttemptAdmission, RecordStore};

pub use account::InMemoryAccountDirectory;
pub use record::MockRecordStore;
