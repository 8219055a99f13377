use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::{CookieJar, Response};
use crate::error::ExecutorError;
use crate::step::RequestSpec;

/// Per-send options the spider passes alongside a request.
#[derive(Debug, Clone, Copy)]
pub struct SendOptions<'a> {
    pub allow_redirects: bool,
    pub cookie_jar: &'a CookieJar,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Destination file for the raw response body.
    pub sink: Option<&'a Path>,
}

impl<'a> SendOptions<'a> {
    pub fn new(cookie_jar: &'a CookieJar) -> Self {
        Self {
            allow_redirects: true,
            cookie_jar,
            timeout: None,
            sink: None,
        }
    }
}

/// Sends one request and returns the complete response.
///
/// Implementations must read and update `options.cookie_jar` so that
/// cookies set by one step are sent by the next.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn send(
        &self,
        request: &RequestSpec,
        options: SendOptions<'_>,
    ) -> Result<Response, ExecutorError>;
}
