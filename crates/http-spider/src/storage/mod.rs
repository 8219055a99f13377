mod artifact;
mod local;
mod memory;

pub use artifact::{ArtifactStore, Visibility};
pub use local::{append_to_file, LocalArtifactStore};
pub use memory::MemoryArtifactStore;
