use indexmap::IndexMap;

use super::Method;

/// A request ready to hand to an executor, built from a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: Vec<u8>,
    /// Sent form-encoded in place of `body` when non-empty.
    pub form_params: IndexMap<String, String>,
    pub protocol_version: String,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: IndexMap::new(),
            body: Vec::new(),
            form_params: IndexMap::new(),
            protocol_version: super::DEFAULT_PROTOCOL_VERSION.to_string(),
        }
    }

    /// Maps the protocol version string onto an HTTP version, if recognised.
    pub fn http_version(&self) -> Option<reqwest::Version> {
        match self.protocol_version.trim() {
            "1.0" => Some(reqwest::Version::HTTP_10),
            "1.1" => Some(reqwest::Version::HTTP_11),
            "2" | "2.0" => Some(reqwest::Version::HTTP_2),
            _ => None,
        }
    }
}
