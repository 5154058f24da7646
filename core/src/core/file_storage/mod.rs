//! Filesystem side of the photo store: path resolution, atomic persistence,
//! and idempotent removal.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::core::upload::{self, UploadCandidate};
use crate::types::{OwnerId, StorageConfig, StoredReference};
use error::FileStorageError;

pub mod error {
    use crate::core::upload::error::ValidationError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum FileStorageError {
        #[error("invalid upload: {0}")]
        InvalidUpload(#[from] ValidationError),

        #[error("invalid storage path: {0}")]
        InvalidPath(String),

        #[error("failed to write file to disk: {0}")]
        WriteFailed(#[source] std::io::Error),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
    }
}

/// Suffix of in-flight files. A name carrying it is never handed out as a
/// stored reference.
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Clone)]
pub struct PhotoStorage {
    photos_dir: PathBuf,
    config: StorageConfig,
}

impl PhotoStorage {
    /// Creates the photos directory and returns a storage handle.
    pub fn new(config: StorageConfig) -> Result<Self, FileStorageError> {
        let photos_dir = config.photos_dir();
        fs::create_dir_all(&photos_dir)?;

        Ok(Self { photos_dir, config })
    }

    pub fn photos_dir(&self) -> &Path {
        &self.photos_dir
    }
}

/// Path resolution. Every disk path the store produces or accepts goes
/// through `resolve`; no other code constructs one.
impl PhotoStorage {
    /// Maps a stored reference to an absolute path under the photos
    /// directory. Rejects with `InvalidPath` anything that would escape it:
    /// absolute inputs, `..` segments, or references that normalize to
    /// nothing.
    pub fn resolve(&self, reference: &StoredReference) -> Result<PathBuf, FileStorageError> {
        let mut relative = PathBuf::new();
        for component in Path::new(reference.as_str()).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(FileStorageError::InvalidPath(reference.to_string()));
                }
            }
        }

        if relative.as_os_str().is_empty() {
            return Err(FileStorageError::InvalidPath(reference.to_string()));
        }

        Ok(self.photos_dir.join(relative))
    }

    fn ensure_owner_dir(&self, owner: OwnerId) -> Result<PathBuf, FileStorageError> {
        let dir = self.photos_dir.join(owner.to_string());
        fs::create_dir_all(&dir)?;
        restrict_permissions(&dir);
        Ok(dir)
    }
}

/// Atomic write: full payload to a sibling temp file, durable flush, then
/// rename onto the final name. The final path either does not exist or holds
/// complete content.
impl PhotoStorage {
    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), FileStorageError> {
        let temp = temp_path(path);
        if let Err(e) = write_then_rename(&temp, path, data) {
            if let Err(cleanup) = fs::remove_file(&temp)
                && cleanup.kind() != io::ErrorKind::NotFound
            {
                warn!(temp = %temp.display(), error = %cleanup, "failed to clean up temp file");
            }
            return Err(FileStorageError::WriteFailed(e));
        }
        Ok(())
    }
}

/// Public operations.
impl PhotoStorage {
    /// Validates an upload and persists it under the owner's directory,
    /// returning the new stored reference. One new file on disk on success;
    /// no file at all on any failure.
    pub fn save<R: Read>(
        &self,
        candidate: UploadCandidate<R>,
        owner: OwnerId,
    ) -> Result<StoredReference, FileStorageError> {
        let upload = upload::validate(candidate, &self.config)?;

        self.ensure_owner_dir(owner)?;
        let name = unique_file_name(&upload.extension);
        let reference = StoredReference::try_new(format!("{owner}/{name}"))
            .map_err(|e| FileStorageError::InvalidPath(e.to_string()))?;

        let path = self.resolve(&reference)?;
        self.write_atomic(&path, &upload.bytes)?;

        Ok(reference)
    }

    /// Removes the referenced file. An already-absent file is success so the
    /// cleanup paths can race or retry freely.
    pub fn remove(&self, reference: &StoredReference) -> Result<(), FileStorageError> {
        let path = self.resolve(reference)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FileStorageError::Io(e)),
        }
    }
}

/// Per-call random token: concurrent uploads for one owner can never collide
/// and old names are not guessable.
fn unique_file_name(extension: &str) -> String {
    format!("{}{}", Uuid::new_v4().simple(), extension)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

fn write_then_rename(temp: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(temp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp, path)
}

fn restrict_permissions(dir: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = fs::set_permissions(dir, fs::Permissions::from_mode(0o700)) {
            tracing::debug!(dir = %dir.display(), error = %e, "could not restrict directory permissions");
        }
    }
    #[cfg(not(unix))]
    let _ = dir;
}
