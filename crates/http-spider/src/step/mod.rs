//! Request descriptors executed by a [`crate::Spider`].

mod method;
mod request;

pub use method::Method;
pub use request::RequestSpec;

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use url::Url;

use crate::error::ConfigError;
use crate::rule::FailureRule;

pub const DEFAULT_PROTOCOL_VERSION: &str = "1.1";

/// One HTTP request plus the failure rules checked against its response.
///
/// Steps hold no run state and can be cloned into several spiders.
#[derive(Debug, Clone)]
pub struct Step {
    name: Option<String>,
    url: String,
    method: Method,
    headers: IndexMap<String, String>,
    body: Vec<u8>,
    form_params: IndexMap<String, String>,
    timeout_secs: u64,
    protocol_version: String,
    failure_rules: IndexMap<String, FailureRule>,
    next_rule_index: usize,
    local_file_path: Option<PathBuf>,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            name: None,
            url: String::new(),
            method: Method::Get,
            headers: IndexMap::new(),
            body: Vec::new(),
            form_params: IndexMap::new(),
            timeout_secs: 0,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            failure_rules: IndexMap::new(),
            next_rule_index: 0,
            local_file_path: None,
        }
    }
}

impl Step {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        let mut step = Self::new(url);
        step.method = Method::Post;
        step
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn assign_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.url = url.into();
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    /// Sets the method from text such as `"post"`.
    pub fn set_method_str(&mut self, method: &str) -> Result<&mut Self, ConfigError> {
        self.method = method.parse()?;
        Ok(self)
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn set_headers(&mut self, headers: IndexMap<String, String>) -> &mut Self {
        self.headers = headers;
        self
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = body.into();
        self
    }

    pub fn form_params(&self) -> &IndexMap<String, String> {
        &self.form_params
    }

    pub fn set_form_params(&mut self, params: IndexMap<String, String>) -> &mut Self {
        self.form_params = params;
        self
    }

    pub fn add_form_param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.form_params.insert(name.into(), value.into());
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Request timeout in seconds; 0 waits indefinitely.
    pub fn set_timeout_secs(&mut self, secs: u64) -> &mut Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn set_protocol_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.protocol_version = version.into();
        self
    }

    pub fn failure_rules(&self) -> &IndexMap<String, FailureRule> {
        &self.failure_rules
    }

    /// Attaches a rule under `name`, or under the next free positional
    /// index when no name is given. Returns the key used.
    ///
    /// Re-using a name replaces the earlier rule but keeps its position.
    pub fn add_failure_rule(&mut self, mut rule: FailureRule, name: Option<&str>) -> String {
        let key = match name {
            Some(name) => name.to_string(),
            None => self.next_positional_key(),
        };

        rule.set_name(key.clone());
        self.failure_rules.insert(key.clone(), rule);
        key
    }

    fn next_positional_key(&mut self) -> String {
        loop {
            let key = self.next_rule_index.to_string();
            self.next_rule_index += 1;
            if !self.failure_rules.contains_key(&key) {
                return key;
            }
        }
    }

    pub fn local_file_path(&self) -> Option<&Path> {
        self.local_file_path.as_deref()
    }

    pub fn set_local_file_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.local_file_path = Some(path.into());
        self
    }

    pub fn clear_local_file_path(&mut self) -> &mut Self {
        self.local_file_path = None;
        self
    }

    pub fn needs_response_saved_to_local_file(&self) -> bool {
        self.local_file_path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }

    /// Host component of the URL, if it parses and has one.
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }

    pub fn request(&self) -> RequestSpec {
        RequestSpec {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            form_params: self.form_params.clone(),
            protocol_version: self.protocol_version.clone(),
        }
    }
}
