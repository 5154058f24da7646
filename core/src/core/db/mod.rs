//! Record store for photo pointers.
//!
//! A single redb table maps an owner to the photo of record. The swap is the
//! one transactional step of a replace: whichever write commits last owns the
//! pointer, and everything else in the upload path keys off its outcome.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::SystemTime;

use redb::{ReadableDatabase, ReadableTable, TableDefinition};

use crate::types::{OwnerId, PhotoRecord, StoredReference};
use error::DatabaseError;

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum DatabaseError {
        #[error("Database error: {0}")]
        Redb(#[from] redb::DatabaseError),

        #[error("Table error: {0}")]
        TableError(#[from] redb::TableError),

        #[error("Storage error: {0}")]
        StorageError(#[from] redb::StorageError),

        #[error("Transaction error: {0}")]
        TransactionError(#[from] redb::TransactionError),

        #[error("Commit error: {0}")]
        CommitError(#[from] redb::CommitError),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("constraint violation: {0}")]
        Constraint(String),
    }
}

/// Pointer table: OwnerId → PhotoRecord
const PHOTO_TABLE: TableDefinition<OwnerId, PhotoRecord> = TableDefinition::new("profile_photos");

/// Callback fired with the current record just before its row is deleted.
/// Implementations must swallow their own failures; the deletion proceeds
/// regardless.
pub type BeforeDeleteHook = Box<dyn Fn(&PhotoRecord) + Send + Sync>;

/// Transactional pointer store contract consumed by the replacement
/// coordinator.
pub trait RecordStore {
    /// Current record for an owner, if any.
    fn get(&self, owner: OwnerId) -> Result<Option<PhotoRecord>, DatabaseError>;

    /// Atomically points the owner at a new reference and commits, returning
    /// the previous record. On error nothing is changed.
    fn swap(
        &mut self,
        owner: OwnerId,
        reference: &StoredReference,
        now: SystemTime,
    ) -> Result<Option<PhotoRecord>, DatabaseError>;

    /// Drops the owner's pointer, returning the previous record. Does not
    /// fire the before-delete hook; the caller owns any file cleanup.
    fn clear(&mut self, owner: OwnerId) -> Result<Option<PhotoRecord>, DatabaseError>;

    /// Removes the owner's row entirely, firing the before-delete hook with
    /// the current record before the removal is committed.
    fn delete(&mut self, owner: OwnerId) -> Result<(), DatabaseError>;

    /// One-time hook registration; later calls are no-ops.
    fn set_before_delete(&self, hook: BeforeDeleteHook);
}

/// The redb-backed pointer store.
pub struct PhotoDb {
    db: redb::Database,
    before_delete: OnceLock<BeforeDeleteHook>,
}

impl PhotoDb {
    /// Creates or opens the pointer database at the given path.
    pub fn new(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let db = redb::Database::create(path)?;

        // Initialize the table
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PHOTO_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            before_delete: OnceLock::new(),
        })
    }
}

impl RecordStore for PhotoDb {
    fn get(&self, owner: OwnerId) -> Result<Option<PhotoRecord>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PHOTO_TABLE)?;

        Ok(table.get(owner)?.map(|g| g.value()))
    }

    fn swap(
        &mut self,
        owner: OwnerId,
        reference: &StoredReference,
        now: SystemTime,
    ) -> Result<Option<PhotoRecord>, DatabaseError> {
        let write_txn = self.db.begin_write()?;

        let previous;
        {
            let mut table = write_txn.open_table(PHOTO_TABLE)?;
            let record = PhotoRecord {
                reference: reference.clone(),
                updated_at: now,
            };
            previous = table.insert(owner, &record)?.map(|g| g.value());
        }

        write_txn.commit()?;
        Ok(previous)
    }

    fn clear(&mut self, owner: OwnerId) -> Result<Option<PhotoRecord>, DatabaseError> {
        let write_txn = self.db.begin_write()?;

        let previous;
        {
            let mut table = write_txn.open_table(PHOTO_TABLE)?;
            previous = table.remove(owner)?.map(|g| g.value());
        }

        write_txn.commit()?;
        Ok(previous)
    }

    fn delete(&mut self, owner: OwnerId) -> Result<(), DatabaseError> {
        let write_txn = self.db.begin_write()?;

        {
            let mut table = write_txn.open_table(PHOTO_TABLE)?;

            let current = table.get(owner)?.map(|g| g.value());
            if let Some(record) = &current
                && let Some(hook) = self.before_delete.get()
            {
                hook(record);
            }

            table.remove(owner)?;
        }

        write_txn.commit()?;
        Ok(())
    }

    fn set_before_delete(&self, hook: BeforeDeleteHook) {
        let _ = self.before_delete.set(hook);
    }
}
