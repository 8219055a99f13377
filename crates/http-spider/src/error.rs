use std::path::PathBuf;
use thiserror::Error;

/// Error code reported by a triggered failure rule.
pub const FAILURE_RULE_TRIGGERED_CODE: i32 = -100;

/// Error code reported when a request fails for a non-transport reason.
pub const REQUEST_SEND_CODE: i32 = -300;

/// Boxed error used where the executor has no concrete error type to expose.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Returned unchanged from failure-rule evaluation.
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport error in step '{step}': {source}")]
    Transport {
        step: String,
        #[source]
        source: ExecutorError,
    },

    #[error("There was an error when the client sent the request for step '{step}': {source}")]
    RequestSend {
        step: String,
        #[source]
        source: ExecutorError,
    },

    #[error("Step not found under: {0}")]
    StepNotFound(String),

    #[error("There is no index in the responses map called: {0}")]
    ResponseNotFound(String),
}

impl SpiderError {
    pub fn code(&self) -> i32 {
        match self {
            SpiderError::Rule(e) => e.code(),
            SpiderError::RequestSend { .. } => REQUEST_SEND_CODE,
            _ => 0,
        }
    }

    /// True when a failure rule detected its condition in a response body.
    pub fn is_failure_rule(&self) -> bool {
        matches!(self, SpiderError::Rule(RuleError::Triggered { .. }))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SpiderError::Transport { .. })
    }

    /// Name of the step the error was raised in, when the error carries one.
    pub fn step_name(&self) -> Option<&str> {
        match self {
            SpiderError::Transport { step, .. } | SpiderError::RequestSend { step, .. } => {
                Some(step)
            }
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid HTTP method '{0}' (expected GET or POST)")]
    InvalidMethod(String),

    #[error("Invalid value for environment variable '{name}': {value}")]
    InvalidEnv { name: String, value: String },

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum RuleError {
    /// The rule found its failure condition. The message is the rule name.
    #[error("{name}")]
    Triggered { name: String },

    #[error("Undefined failure rule type: {0}")]
    UndefinedType(String),

    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl RuleError {
    pub fn code(&self) -> i32 {
        match self {
            RuleError::Triggered { .. } => FAILURE_RULE_TRIGGERED_CODE,
            _ => 0,
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unable to write to the debug directory at '{path}': {source}")]
    ReadMeNotWritten {
        path: PathBuf,
        #[source]
        source: Box<StorageError>,
    },

    #[error("The README file does not exist in the debug directory")]
    ReadMeMissing,

    #[error("The debug log file does not exist. Did you forget to turn debugging on?")]
    DebugLogMissing,

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to set visibility of '{path}': {source}")]
    SetVisibility {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write to the debug log: {0}")]
    WriteDebugLog(#[source] Box<StorageError>),

    #[error("Unable to write the response body to the debug file for step '{step}': {source}")]
    WriteArtifact {
        step: String,
        #[source]
        source: Box<StorageError>,
    },

    #[error("Unable to write the response body to the local file '{path}': {source}")]
    WriteLocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write the response body to the sink '{path}': {source}")]
    WriteSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

/// Errors reported by a [`crate::http::RequestExecutor`].
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The server could not be reached or did not answer in time.
    #[error("Transport failure: {0}")]
    Transport(#[source] BoxError),

    #[error("Failed to stream response body to '{path}': {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),

    #[error("Request failed: {0}")]
    Request(#[source] BoxError),
}

pub type Result<T> = std::result::Result<T, SpiderError>;
