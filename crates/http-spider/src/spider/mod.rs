//! The sequential step orchestrator.

mod debug;
mod runner;

pub use debug::{DEBUG_FILE_EXTENSION, DEBUG_LOG_FILE_NAME, README_FILE_NAME};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::SpiderConfig;
use crate::error::{ConfigError, SpiderError, StorageError};
use crate::http::{CookieJar, HttpExecutor, RequestExecutor, Response};
use crate::step::Step;
use crate::storage::{ArtifactStore, LocalArtifactStore};

/// Position and name of the step that aborted the latest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedStep {
    pub index: usize,
    pub name: String,
    /// The response a failure rule rejected. `None` when the request itself failed.
    pub response: Option<Response>,
}

/// Runs named [`Step`]s in insertion order, sharing one cookie jar.
///
/// A successful [`Spider::run`] drains the queued steps. A failed run keeps
/// them queued and records which one failed in [`Spider::failed_step`].
pub struct Spider {
    config: SpiderConfig,
    executor: Arc<dyn RequestExecutor>,
    store: Box<dyn ArtifactStore>,
    cookie_jar: CookieJar,
    steps: IndexMap<String, Step>,
    responses: IndexMap<String, Option<Response>>,
    sink: Option<PathBuf>,
    steps_executed: usize,
    local_files_written: IndexMap<String, PathBuf>,
    run_directory: Option<String>,
    failed_step: Option<FailedStep>,
}

impl Spider {
    /// Builds a spider and prepares its storage.
    ///
    /// The README probe is always written. With debugging on, the debug log
    /// and this spider's `run_*` directory are created too.
    pub fn new(
        config: SpiderConfig,
        executor: Arc<dyn RequestExecutor>,
        store: Box<dyn ArtifactStore>,
    ) -> Result<Self, SpiderError> {
        let mut spider = Self {
            config,
            executor,
            store,
            cookie_jar: CookieJar::new(),
            steps: IndexMap::new(),
            responses: IndexMap::new(),
            sink: None,
            steps_executed: 0,
            local_files_written: IndexMap::new(),
            run_directory: None,
            failed_step: None,
        };

        spider.create_readme_file()?;
        if spider.config.debug {
            spider.create_log_file()?;
            spider.create_run_directory()?;
        }

        Ok(spider)
    }

    /// Spider with the reqwest executor and a store rooted at `config.storage_path`.
    pub fn open(config: SpiderConfig) -> Result<Self, SpiderError> {
        let executor = HttpExecutor::from_config(&config).map_err(|e| {
            ConfigError::Validation {
                message: format!("unable to build HTTP client: {}", e),
            }
        })?;
        let store = LocalArtifactStore::new(&config.storage_path);

        Self::new(config, Arc::new(executor), Box::new(store))
    }

    pub fn config(&self) -> &SpiderConfig {
        &self.config
    }

    pub fn is_debug(&self) -> bool {
        self.config.debug
    }

    pub fn executor(&self) -> &Arc<dyn RequestExecutor> {
        &self.executor
    }

    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    /// Drops every cookie collected so far.
    pub fn reset_cookies(&mut self) {
        self.cookie_jar = CookieJar::new();
    }

    /// Queues `step` under `name`. A step already queued under that name is replaced.
    pub fn add_step(&mut self, name: impl Into<String>, mut step: Step) -> Result<(), SpiderError> {
        let name = name.into();
        step.assign_name(&name);

        self.log(&format!(
            "Step added. [{}] [{}] {}",
            self.steps.len(),
            name,
            step.url()
        ))?;
        self.steps.insert(name, step);
        Ok(())
    }

    pub fn step(&self, name: &str) -> Result<&Step, SpiderError> {
        self.steps
            .get(name)
            .ok_or_else(|| SpiderError::StepNotFound(name.to_string()))
    }

    pub fn step_mut(&mut self, name: &str) -> Result<&mut Step, SpiderError> {
        self.steps
            .get_mut(name)
            .ok_or_else(|| SpiderError::StepNotFound(name.to_string()))
    }

    pub fn steps(&self) -> &IndexMap<String, Step> {
        &self.steps
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn step_host(&self, name: &str) -> Result<Option<String>, SpiderError> {
        Ok(self.step(name)?.host())
    }

    pub fn remove_all_steps(&mut self) {
        self.steps.clear();
    }

    /// Response recorded for `name`. A step whose request never completed
    /// is reported the same as one that never ran.
    pub fn response(&self, name: &str) -> Result<&Response, SpiderError> {
        self.responses
            .get(name)
            .and_then(Option::as_ref)
            .ok_or_else(|| SpiderError::ResponseNotFound(name.to_string()))
    }

    pub fn response_body(&self, name: &str) -> Result<&[u8], SpiderError> {
        Ok(self.response(name)?.body())
    }

    pub fn responses(&self) -> &IndexMap<String, Option<Response>> {
        &self.responses
    }

    pub fn num_responses(&self) -> usize {
        self.responses.len()
    }

    pub fn clear_responses(&mut self) {
        self.responses.clear();
    }

    /// Sends the body of the next executed step to `path`. Used once, then cleared.
    pub fn set_sink(&mut self, path: impl Into<PathBuf>) {
        self.sink = Some(path.into());
    }

    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    pub fn sink(&self) -> Option<&Path> {
        self.sink.as_deref()
    }

    pub fn local_files_written(&self) -> &IndexMap<String, PathBuf> {
        &self.local_files_written
    }

    pub fn steps_executed(&self) -> usize {
        self.steps_executed
    }

    pub fn failed_step(&self) -> Option<&FailedStep> {
        self.failed_step.as_ref()
    }

    /// Name of this spider's `run_*` directory, when debugging.
    pub fn run_directory(&self) -> Option<&str> {
        self.run_directory.as_deref()
    }

    pub(crate) fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    pub(crate) fn record_local_file(&mut self, step: &str, path: &Path) {
        self.local_files_written
            .insert(step.to_string(), path.to_path_buf());
    }

    pub fn readme_contents(&self) -> Result<String, StorageError> {
        self.read_text(README_FILE_NAME, StorageError::ReadMeMissing)
    }

    pub fn debug_log_contents(&self) -> Result<String, StorageError> {
        self.read_text(DEBUG_LOG_FILE_NAME, StorageError::DebugLogMissing)
    }

    fn read_text(&self, name: &str, missing: StorageError) -> Result<String, StorageError> {
        if !self.store.has(name) {
            return Err(missing);
        }
        let bytes = self.store.read(name)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
