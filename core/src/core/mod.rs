//! Photo store core combining the record store and file storage.
//!
//! The replace protocol is write-new → swap-pointer → delete-old: the pointer
//! never refers to a file that does not exist, at the cost of two files on
//! disk for the duration of a replace.

use std::io::Read;
use std::path::PathBuf;
use std::time::SystemTime;

use tracing::warn;

use crate::core::db::error::DatabaseError;
use crate::core::db::{PhotoDb, RecordStore};
use crate::core::file_storage::PhotoStorage;
use crate::core::file_storage::error::FileStorageError;
use crate::core::upload::UploadCandidate;
use crate::types::{OwnerId, StorageConfig, StoredReference};
use error::PhotoStoreError;

pub mod db;
pub mod file_storage;
pub mod upload;

pub mod error {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum PhotoStoreError {
        #[error("Database error: {0}")]
        Database(#[from] DatabaseError),

        #[error("File storage error: {0}")]
        FileStorage(#[from] FileStorageError),

        #[error("Invalid configuration: {0}")]
        Config(String),
    }
}

pub struct PhotoCore<S: RecordStore = PhotoDb> {
    storage: PhotoStorage,
    records: S,
}

impl PhotoCore<PhotoDb> {
    /// Validates the config, opens the pointer database, and registers the
    /// before-delete cleanup hook.
    pub fn open(config: StorageConfig) -> Result<Self, PhotoStoreError> {
        let db_path = config.db_path();
        let storage = checked_storage(config)?;
        let records = PhotoDb::new(&db_path)?;

        Ok(Self::assemble(storage, records))
    }
}

impl<S: RecordStore> PhotoCore<S> {
    /// Builds a core over a caller-provided record store.
    pub fn with_store(config: StorageConfig, records: S) -> Result<Self, PhotoStoreError> {
        let storage = checked_storage(config)?;
        Ok(Self::assemble(storage, records))
    }

    fn assemble(storage: PhotoStorage, records: S) -> Self {
        // Registration is one-time; reassembling over the same store keeps
        // the first hook.
        let cleanup = storage.clone();
        records.set_before_delete(Box::new(move |record| {
            if let Err(e) = cleanup.remove(&record.reference) {
                warn!(reference = %record.reference, error = %e, "failed to remove photo file during record delete");
            }
        }));

        Self { storage, records }
    }

    /// Direct access to the storage facade, for callers that stream file
    /// contents themselves.
    pub fn storage(&self) -> &PhotoStorage {
        &self.storage
    }
}

fn checked_storage(config: StorageConfig) -> Result<PhotoStorage, PhotoStoreError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(PhotoStoreError::Config(errors.join("; ")));
    }
    Ok(PhotoStorage::new(config)?)
}

/// Upload operations.
impl<S: RecordStore> PhotoCore<S> {
    /// Uploads or replaces the owner's photo.
    ///
    /// The new file is written before the pointer swap; if the swap fails the
    /// file is removed again and the error surfaced, leaving the previous
    /// state intact. Only after the swap commits is the old file removed,
    /// best-effort.
    pub fn set_photo<R: Read>(
        &mut self,
        owner: OwnerId,
        candidate: UploadCandidate<R>,
        now: SystemTime,
    ) -> Result<StoredReference, PhotoStoreError> {
        let new_reference = self.storage.save(candidate, owner)?;

        let previous = match self.records.swap(owner, &new_reference, now) {
            Ok(previous) => previous,
            Err(e) => {
                if let Err(cleanup) = self.storage.remove(&new_reference) {
                    warn!(reference = %new_reference, error = %cleanup, "failed to remove photo file after aborted swap");
                }
                return Err(e.into());
            }
        };

        if let Some(previous) = previous
            && previous.reference != new_reference
            && let Err(e) = self.storage.remove(&previous.reference)
        {
            // The swap is committed; an orphaned file beats a failed upload.
            warn!(reference = %previous.reference, error = %e, "failed to remove replaced photo file");
        }

        Ok(new_reference)
    }
}

/// Read operations.
impl<S: RecordStore> PhotoCore<S> {
    /// The owner's current stored reference, if any.
    pub fn photo_reference(&self, owner: OwnerId) -> Result<Option<StoredReference>, PhotoStoreError> {
        Ok(self.records.get(owner)?.map(|record| record.reference))
    }

    /// Absolute path of the owner's photo. A reference that fails to resolve
    /// is reported as absent rather than as an error so callers cannot probe
    /// the layout of the storage directory.
    pub fn photo_path(&self, owner: OwnerId) -> Result<Option<PathBuf>, PhotoStoreError> {
        let Some(record) = self.records.get(owner)? else {
            return Ok(None);
        };

        match self.storage.resolve(&record.reference) {
            Ok(path) => Ok(Some(path)),
            Err(e) => {
                warn!(reference = %record.reference, error = %e, "stored reference failed to resolve");
                Ok(None)
            }
        }
    }
}

/// Removal operations.
impl<S: RecordStore> PhotoCore<S> {
    /// Drops the owner's photo: pointer first, then the file best-effort.
    pub fn remove_photo(&mut self, owner: OwnerId) -> Result<(), PhotoStoreError> {
        let Some(previous) = self.records.clear(owner)? else {
            return Ok(());
        };

        if let Err(e) = self.storage.remove(&previous.reference) {
            warn!(reference = %previous.reference, error = %e, "failed to remove photo file");
        }
        Ok(())
    }

    /// Entry point for "owning record deleted". The before-delete hook runs
    /// synchronously inside the store's delete and never propagates storage
    /// failures; a record deletion is not allowed to fail over a file.
    pub fn delete_record(&mut self, owner: OwnerId) -> Result<(), PhotoStoreError> {
        self.records.delete(owner)?;
        Ok(())
    }
}
