use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings a [`crate::Spider`] is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiderConfig {
    /// Directory holding the README probe, the debug log and every `run_*` folder.
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Connect timeout for the HTTP client, in seconds. 0 disables it.
    #[serde(default)]
    pub connect_timeout_secs: u64,
}

pub(crate) fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("http-spider")
}

pub(crate) fn default_max_redirects() -> usize {
    5
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            debug: false,
            max_redirects: default_max_redirects(),
            user_agent: None,
            connect_timeout_secs: 0,
        }
    }
}

impl SpiderConfig {
    pub fn new<P: Into<PathBuf>>(storage_path: P) -> Self {
        Self {
            storage_path: storage_path.into(),
            ..Self::default()
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
