use crate::error::StorageError;

/// Access mode applied to a directory in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    /// Readable by the owner only.
    Private,
}

/// Storage the spider writes its README probe, debug log and artifacts to.
///
/// Names are `/`-separated paths relative to the store root.
pub trait ArtifactStore: Send + Sync {
    fn has(&self, name: &str) -> bool;

    /// Creates `name` with `contents`. Fails if it already exists.
    fn write(&self, name: &str, contents: &[u8]) -> Result<(), StorageError>;

    /// Appends to `name`, creating it when missing.
    fn append(&self, name: &str, contents: &[u8]) -> Result<(), StorageError>;

    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Creates directory `name`. Fails with `FileExists` if it is already there.
    fn create_dir(&self, name: &str) -> Result<(), StorageError>;

    fn set_visibility(&self, name: &str, visibility: Visibility) -> Result<(), StorageError>;
}
