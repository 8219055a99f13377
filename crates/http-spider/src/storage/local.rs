use std::io::Write;
use std::path::{Component, Path, PathBuf};

use log::debug;

use super::{ArtifactStore, Visibility};
use crate::error::StorageError;

/// [`ArtifactStore`] on the local filesystem, rooted at one directory.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for `name`. Names that would leave the root are rejected.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

        if escapes || name.is_empty() {
            return Err(StorageError::WriteFile {
                path: relative.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "artifact names must be relative to the store root",
                ),
            });
        }

        Ok(self.root.join(relative))
    }

    fn ensure_parent(&self, path: &Path) -> Result<(), StorageError> {
        match path.parent() {
            Some(parent) => ensure_directory(parent),
            None => Ok(()),
        }
    }
}

fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.is_dir() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

impl ArtifactStore for LocalArtifactStore {
    fn has(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.exists()).unwrap_or(false)
    }

    fn write(&self, name: &str, contents: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        self.ensure_parent(&path)?;

        // create_new makes the existence check and the creation one step
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    StorageError::FileExists(path.clone())
                } else {
                    StorageError::WriteFile {
                        path: path.clone(),
                        source: e,
                    }
                }
            })?;

        file.write_all(contents)
            .map_err(|e| StorageError::WriteFile {
                path: path.clone(),
                source: e,
            })?;

        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }

    fn append(&self, name: &str, contents: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        self.ensure_parent(&path)?;
        append_to_file(&path, contents).map_err(|e| match e {
            StorageError::WriteLocalFile { path, source } => StorageError::WriteFile { path, source },
            other => other,
        })?;
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(name)?;
        std::fs::read(&path).map_err(|e| StorageError::ReadFile { path, source: e })
    }

    fn create_dir(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        self.ensure_parent(&path)?;

        std::fs::create_dir(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                StorageError::FileExists(path.clone())
            } else {
                StorageError::CreateDirectory {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        debug!("Created directory {}", path.display());
        Ok(())
    }

    fn set_visibility(&self, name: &str, visibility: Visibility) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        apply_visibility(&path, visibility)
            .map_err(|e| StorageError::SetVisibility { path, source: e })
    }
}

#[cfg(unix)]
fn apply_visibility(path: &Path, visibility: Visibility) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = match visibility {
        Visibility::Public => 0o755,
        Visibility::Private => 0o700,
    };
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_visibility(path: &Path, _visibility: Visibility) -> std::io::Result<()> {
    std::fs::metadata(path).map(|_| ())
}

/// Appends `contents` to the file at `path`, creating the file if needed.
///
/// The parent directory must already exist. Returns the number of bytes written.
pub fn append_to_file(path: &Path, contents: &[u8]) -> Result<usize, StorageError> {
    let to_error = |e| StorageError::WriteLocalFile {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)?;
    file.write_all(contents).map_err(to_error)?;

    Ok(contents.len())
}
