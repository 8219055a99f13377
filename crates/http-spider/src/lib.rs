pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod rule;
pub mod spider;
pub mod step;
pub mod storage;

pub use config::{load_config, load_config_from_str, ConfigFormat, SpiderConfig};
pub use error::{
    ConfigError, ExecutorError, Result, RuleError, SpiderError, StorageError,
    FAILURE_RULE_TRIGGERED_CODE, REQUEST_SEND_CODE,
};
pub use http::{CookieJar, HttpExecutor, RequestExecutor, Response, SendOptions};
pub use logging::{init_logging, LogFormat};
pub use rule::{FailureRule, RuleType};
pub use spider::{FailedStep, Spider};
pub use step::{Method, RequestSpec, Step};
pub use storage::{ArtifactStore, LocalArtifactStore, MemoryArtifactStore, Visibility};
