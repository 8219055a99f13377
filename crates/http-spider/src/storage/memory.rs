use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::{ArtifactStore, Visibility};
use crate::error::StorageError;

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    visibility: BTreeMap<String, Visibility>,
}

/// In-memory [`ArtifactStore`], mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    state: Mutex<MemoryState>,
    read_only: bool,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self, name: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::WriteFile {
                path: PathBuf::from(name),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "artifact store is read-only",
                ),
            });
        }
        Ok(())
    }

    /// Names of every stored file, sorted.
    pub fn file_names(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    pub fn directories(&self) -> Vec<String> {
        self.state().dirs.iter().cloned().collect()
    }

    pub fn visibility(&self, name: &str) -> Option<Visibility> {
        self.state().visibility.get(name).copied()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn has(&self, name: &str) -> bool {
        let state = self.state();
        state.files.contains_key(name) || state.dirs.contains(name)
    }

    fn write(&self, name: &str, contents: &[u8]) -> Result<(), StorageError> {
        self.check_writable(name)?;
        let mut state = self.state();
        if state.files.contains_key(name) {
            return Err(StorageError::FileExists(PathBuf::from(name)));
        }
        state.files.insert(name.to_string(), contents.to_vec());
        Ok(())
    }

    fn append(&self, name: &str, contents: &[u8]) -> Result<(), StorageError> {
        self.check_writable(name)?;
        self.state()
            .files
            .entry(name.to_string())
            .or_default()
            .extend_from_slice(contents);
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        self.state()
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::ReadFile {
                path: PathBuf::from(name),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }

    fn create_dir(&self, name: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::CreateDirectory {
                path: PathBuf::from(name),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        if !self.state().dirs.insert(name.to_string()) {
            return Err(StorageError::FileExists(PathBuf::from(name)));
        }
        Ok(())
    }

    fn set_visibility(&self, name: &str, visibility: Visibility) -> Result<(), StorageError> {
        let mut state = self.state();
        if !state.dirs.contains(name) && !state.files.contains_key(name) {
            return Err(StorageError::SetVisibility {
                path: PathBuf::from(name),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        state.visibility.insert(name.to_string(), visibility);
        Ok(())
    }
}
