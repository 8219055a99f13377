//! Test harness for isolated spider execution.
//!
//! The `TestHarness` owns a temporary directory holding the spider's
//! storage root and an output directory for sinks and local files, plus a
//! shared `ScriptedExecutor` every spider it builds sends through.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use http_spider::{LocalArtifactStore, Spider, SpiderConfig};

use super::scripted::ScriptedExecutor;

pub struct TestHarness {
    temp_dir: TempDir,
    /// Storage root for README, debug log and run directories.
    pub storage_dir: PathBuf,
    /// Directory for sinks and local files.
    pub output_dir: PathBuf,
    pub executor: Arc<ScriptedExecutor>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage_dir = temp_dir.path().join("storage");
        let output_dir = temp_dir.path().join("output");

        std::fs::create_dir_all(&storage_dir).expect("Failed to create storage dir");
        std::fs::create_dir_all(&output_dir).expect("Failed to create output dir");

        Self {
            temp_dir,
            storage_dir,
            output_dir,
            executor: Arc::new(ScriptedExecutor::new()),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self, debug: bool) -> SpiderConfig {
        SpiderConfig::new(&self.storage_dir).with_debug(debug)
    }

    /// Spider with debugging off.
    pub fn spider(&self) -> Spider {
        self.build(false)
    }

    /// Spider writing a debug log and per-step artifacts.
    pub fn debug_spider(&self) -> Spider {
        self.build(true)
    }

    fn build(&self, debug: bool) -> Spider {
        Spider::new(
            self.config(debug),
            self.executor.clone(),
            Box::new(LocalArtifactStore::new(&self.storage_dir)),
        )
        .expect("Failed to create spider")
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    /// Every `run_*` directory under the storage root.
    pub fn run_directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&self.storage_dir)
            .expect("Failed to read storage dir")
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_dir()
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("run_"))
            })
            .collect();
        dirs.sort();
        dirs
    }

    /// File names inside a directory, sorted.
    pub fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .expect("Failed to read dir")
            .filter_map(|entry| entry.ok())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
