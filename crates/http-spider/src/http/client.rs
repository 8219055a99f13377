use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, LOCATION};
use reqwest::redirect::Policy;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use super::{RequestExecutor, Response, SendOptions};
use crate::config::SpiderConfig;
use crate::error::ExecutorError;
use crate::step::{Method, RequestSpec};

const DEFAULT_USER_AGENT: &str = concat!("http-spider/", env!("CARGO_PKG_VERSION"));

/// Step headers withheld once a redirect has left the original origin.
const CREDENTIAL_HEADERS: [&str; 3] = ["authorization", "cookie", "proxy-authorization"];

fn is_credential_header(name: &str) -> bool {
    CREDENTIAL_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Statuses whose `Location` is followed. 300 and 304 are returned as-is.
fn is_followed_redirect(code: u16) -> bool {
    matches!(code, 301 | 302 | 303 | 307 | 308)
}

/// [`RequestExecutor`] backed by `reqwest`.
///
/// Redirects are followed here rather than by reqwest so that every hop
/// reads and updates the spider's cookie jar. Once a redirect leaves the
/// starting origin, the step's credential headers are no longer sent.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    max_redirects: usize,
}

impl HttpExecutor {
    pub fn new() -> Result<Self, ExecutorError> {
        Self::from_config(&SpiderConfig::default())
    }

    pub fn from_config(config: &SpiderConfig) -> Result<Self, ExecutorError> {
        let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);

        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .user_agent(user_agent);
        if config.connect_timeout_secs > 0 {
            builder = builder.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        }

        let client = builder
            .build()
            .map_err(|e| ExecutorError::Request(Box::new(e)))?;

        Ok(Self {
            client,
            max_redirects: config.max_redirects,
        })
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    fn build_request(
        &self,
        request: &RequestSpec,
        method: Method,
        url: &Url,
        with_body: bool,
        cross_origin: bool,
        options: &SendOptions<'_>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method.into(), url.clone());

        if let Some(version) = request.http_version() {
            builder = builder.version(version);
        }
        for (name, value) in &request.headers {
            if cross_origin && is_credential_header(name) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookies) = options.cookie_jar.cookie_header(url) {
            builder = builder.header(COOKIE, cookies);
        }

        if with_body {
            if !request.form_params.is_empty() {
                let pairs: Vec<(&str, &str)> = request
                    .form_params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                builder = builder.form(&pairs);
            } else if !request.body.is_empty() {
                builder = builder.body(request.body.clone());
            }
        }

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        builder
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn send(
        &self,
        request: &RequestSpec,
        options: SendOptions<'_>,
    ) -> Result<Response, ExecutorError> {
        let mut url = Url::parse(&request.url).map_err(|source| ExecutorError::InvalidUrl {
            url: request.url.clone(),
            source,
        })?;
        let mut method = request.method;
        let mut with_body = true;
        let mut redirects = 0;
        let origin = url.origin();
        let mut cross_origin = false;

        loop {
            let response = self
                .build_request(request, method, &url, with_body, cross_origin, &options)
                .send()
                .await
                .map_err(classify)?;

            options
                .cookie_jar
                .store_response_cookies(response.headers(), &url);

            let status = response.status();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let follow = options.allow_redirects && is_followed_redirect(status.as_u16());

            match location {
                Some(location) if follow => {
                    if redirects >= self.max_redirects {
                        return Err(ExecutorError::TooManyRedirects(self.max_redirects));
                    }

                    let next = url.join(&location).map_err(|source| ExecutorError::InvalidUrl {
                        url: location.clone(),
                        source,
                    })?;

                    let code = status.as_u16();
                    if code == 303 || (matches!(code, 301 | 302) && method == Method::Post) {
                        method = Method::Get;
                        with_body = false;
                    }

                    // Sticky: credentials are not restored on a hop back to the origin.
                    if next.origin() != origin {
                        cross_origin = true;
                    }

                    debug!(from = %url, to = %next, status = code, "Following redirect");
                    url = next;
                    redirects += 1;
                }
                _ => return read_response(response, options.sink).await,
            }
        }
    }
}

fn classify(err: reqwest::Error) -> ExecutorError {
    if err.is_connect() || err.is_timeout() {
        ExecutorError::Transport(Box::new(err))
    } else {
        ExecutorError::Request(Box::new(err))
    }
}

fn sink_error(path: &Path, source: std::io::Error) -> ExecutorError {
    ExecutorError::Sink {
        path: path.to_path_buf(),
        source,
    }
}

async fn read_response(
    mut response: reqwest::Response,
    sink: Option<&Path>,
) -> Result<Response, ExecutorError> {
    let status = response.status().as_u16();
    let url = response.url().to_string();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let mut file = match sink {
        Some(path) => Some(
            tokio::fs::File::create(path)
                .await
                .map_err(|e| sink_error(path, e))?,
        ),
        None => None,
    };

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(classify)? {
        if let (Some(file), Some(path)) = (file.as_mut(), sink) {
            file.write_all(&chunk)
                .await
                .map_err(|e| sink_error(path, e))?;
        }
        body.extend_from_slice(&chunk);
    }

    if let (Some(mut file), Some(path)) = (file, sink) {
        file.flush().await.map_err(|e| sink_error(path, e))?;
    }

    Ok(Response {
        url,
        status,
        headers,
        body: body.into(),
    })
}
