pub mod core;
pub mod types;

pub use crate::core::PhotoCore;
pub use crate::core::db::{PhotoDb, RecordStore};
pub use crate::core::error::PhotoStoreError;
pub use crate::core::file_storage::PhotoStorage;
pub use crate::core::upload::UploadCandidate;
