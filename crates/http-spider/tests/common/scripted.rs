//! Request executor that replays scripted outcomes per URL.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;

use http_spider::{ExecutorError, Method, RequestExecutor, RequestSpec, Response, SendOptions};

/// Outcome returned for a scripted URL.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(Response),
    /// Simulates a refused connection.
    Transport(String),
    /// Simulates a non-transport failure inside the client.
    TooManyRedirects,
}

/// One call the executor received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub method: Method,
    pub form_params: IndexMap<String, String>,
    pub timeout: Option<Duration>,
    pub sink: Option<PathBuf>,
    pub allow_redirects: bool,
}

/// Executor replying from a URL-keyed script. Unscripted URLs get an empty 200.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.script(
            url,
            Reply::Respond(Response::new(status, body.to_string()).with_url(url)),
        );
    }

    pub fn fail_transport(&self, url: &str) {
        self.script(url, Reply::Transport("connection refused".to_string()));
    }

    pub fn fail_send(&self, url: &str) {
        self.script(url, Reply::TooManyRedirects);
    }

    pub fn script(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url).collect()
    }

    pub fn was_called(&self, url: &str) -> bool {
        self.calls().iter().any(|c| c.url == url)
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn send(
        &self,
        request: &RequestSpec,
        options: SendOptions<'_>,
    ) -> Result<Response, ExecutorError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: request.url.clone(),
            method: request.method,
            form_params: request.form_params.clone(),
            timeout: options.timeout,
            sink: options.sink.map(|p| p.to_path_buf()),
            allow_redirects: options.allow_redirects,
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Reply::Respond(Response::new(200, "").with_url(&request.url)));

        match reply {
            Reply::Respond(response) => {
                if let Some(path) = options.sink {
                    std::fs::write(path, response.body()).map_err(|source| {
                        ExecutorError::Sink {
                            path: path.to_path_buf(),
                            source,
                        }
                    })?;
                }
                Ok(response)
            }
            Reply::Transport(message) => Err(ExecutorError::Transport(message.into())),
            Reply::TooManyRedirects => Err(ExecutorError::TooManyRedirects(5)),
        }
    }
}
