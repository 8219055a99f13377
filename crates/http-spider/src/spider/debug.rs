use chrono::{Local, Utc};
use tracing::debug;

use super::Spider;
use crate::error::StorageError;
use crate::storage::Visibility;

pub const README_FILE_NAME: &str = "README.md";
pub const DEBUG_LOG_FILE_NAME: &str = "debug.log";
pub const DEBUG_FILE_EXTENSION: &str = "dprc";

const MAX_RUN_DIRECTORY_ATTEMPTS: usize = 1000;

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Keeps a step label usable as a single file name.
fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

impl Spider {
    /// Writes the README probe if it is missing, proving the store is writable.
    pub(super) fn create_readme_file(&self) -> Result<(), StorageError> {
        if self.store().has(README_FILE_NAME) {
            return Ok(());
        }

        let contents = format!("[{}] README.md file created.", timestamp());
        self.store()
            .write(README_FILE_NAME, contents.as_bytes())
            .map_err(|e| StorageError::ReadMeNotWritten {
                path: self.config.storage_path.clone(),
                source: Box::new(e),
            })
    }

    pub(super) fn create_log_file(&self) -> Result<(), StorageError> {
        let line = format!("[{}] Debug Log file created.\n", timestamp());
        self.store()
            .append(DEBUG_LOG_FILE_NAME, line.as_bytes())
            .map_err(|e| StorageError::WriteDebugLog(Box::new(e)))
    }

    /// Claims a fresh `run_{YmdHis}` directory. Spiders started within the
    /// same second get `_2`, `_3`, ... suffixes.
    pub(super) fn create_run_directory(&mut self) -> Result<(), StorageError> {
        let base = format!("run_{}", Local::now().format("%Y%m%d%H%M%S"));
        let mut name = base.clone();
        let mut attempt = 1;
        loop {
            match self.store().create_dir(&name) {
                Ok(()) => break,
                Err(StorageError::FileExists(_)) if attempt < MAX_RUN_DIRECTORY_ATTEMPTS => {
                    attempt += 1;
                    name = format!("{}_{}", base, attempt);
                }
                Err(e) => return Err(e),
            }
        }
        self.store().set_visibility(&name, Visibility::Private)?;

        self.log(&format!("Debug run directory was set to: {}", name))?;
        self.run_directory = Some(name);
        Ok(())
    }

    /// Emits `message` as a tracing event and, when debugging, appends it to the debug log.
    pub(crate) fn log(&self, message: &str) -> Result<(), StorageError> {
        debug!("{}", message);
        if !self.config.debug {
            return Ok(());
        }

        let line = format!("[{}] {}\n", timestamp(), message);
        self.store()
            .append(DEBUG_LOG_FILE_NAME, line.as_bytes())
            .map_err(|e| StorageError::WriteDebugLog(Box::new(e)))
    }

    /// Store name a debug artifact for `step_label` would be written to now.
    pub fn debug_artifact_name(&self, step_label: &str) -> String {
        let file = format!(
            "request_{}_{}.{}",
            Utc::now().timestamp(),
            sanitize_label(step_label),
            DEBUG_FILE_EXTENSION
        );
        match &self.run_directory {
            Some(dir) => format!("{}/{}", dir, file),
            None => file,
        }
    }

    /// Writes a response body to the run directory. No-op unless debugging.
    pub(crate) fn save_debug_artifact(
        &self,
        body: &[u8],
        step_label: &str,
    ) -> Result<Option<String>, StorageError> {
        if !self.config.debug {
            return Ok(None);
        }

        let name = self.debug_artifact_name(step_label);
        self.store()
            .write(&name, body)
            .map_err(|e| StorageError::WriteArtifact {
                step: step_label.to_string(),
                source: Box::new(e),
            })?;

        self.log(&format!("Response body written to {}", name))?;
        Ok(Some(name))
    }
}
