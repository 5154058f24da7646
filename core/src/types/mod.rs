pub(crate) mod config;
pub use config::{StorageConfig, StorageConfigError};

pub(crate) mod owner;
pub use owner::OwnerId;

pub(crate) mod record;
pub use record::PhotoRecord;

pub(crate) mod reference;
pub use reference::{StoredReference, StoredReferenceError};
