//! Durable storage for the single live credential.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use metroconsole_auth::Credential;

use crate::error::StorageError;

/// Key-value persistence for exactly one credential.
///
/// Read at startup, written on login, cleared on logout. Implementations are
/// synchronous: the operations are small and local.
pub trait CredentialStorage: Send + Sync {
    fn load(&self) -> Result<Option<Credential>, StorageError>;

    /// Replace whatever is stored.
    fn save(&self, credential: &Credential) -> Result<(), StorageError>;

    /// Remove the stored credential. Clearing empty storage is not an error.
    fn clear(&self) -> Result<(), StorageError>;
}

/// In-process storage (tests, ephemeral sessions).
#[derive(Debug, Default)]
pub struct MemoryCredentialStorage {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStorage for MemoryCredentialStorage {
    fn load(&self) -> Result<Option<Credential>, StorageError> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        Ok(())
    }
}

/// JSON file holding the credential.
///
/// Writes go to a sibling temp file and are renamed into place, so a crash
/// mid-write leaves either the old or the new credential.
#[derive(Debug, Clone)]
pub struct FileCredentialStorage {
    path: PathBuf,
}

impl FileCredentialStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CredentialStorage for FileCredentialStorage {
    fn load(&self) -> Result<Option<Credential>, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, credential: &Credential) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.temp_path();
        std::fs::write(&tmp, serde_json::to_vec(credential)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn credential(token: &str) -> Credential {
        let now = Utc::now();
        Credential::new(token, now, Some(now + Duration::hours(1)))
    }

    #[test]
    fn memory_storage_holds_one_credential() {
        let storage = MemoryCredentialStorage::new();
        assert!(storage.load().unwrap().is_none());
        storage.save(&credential("a")).unwrap();
        storage.save(&credential("b")).unwrap();
        assert_eq!(storage.load().unwrap().unwrap().token(), "b");
        storage.clear().unwrap();
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credential.json");

        let storage = FileCredentialStorage::new(&path);
        assert!(storage.load().unwrap().is_none());
        storage.save(&credential("persisted")).unwrap();

        let reopened = FileCredentialStorage::new(&path);
        assert_eq!(reopened.load().unwrap().unwrap().token(), "persisted");
        assert!(!storage.temp_path().exists());
    }

    #[test]
    fn file_storage_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCredentialStorage::new(dir.path().join("credential.json"));
        storage.clear().unwrap();
        storage.save(&credential("x")).unwrap();
        storage.clear().unwrap();
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credential.json");
        std::fs::write(&path, b"not json").unwrap();
        let err = FileCredentialStorage::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
