//! Cookie jar shared by every step of a spider.
//!
//! The jar is a cheap handle around `reqwest`'s cookie store. Executors
//! read it before each request and write every `Set-Cookie` they receive
//! back into it, including the ones on intermediate redirect hops.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    inner: Arc<Jar>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cookie in `Set-Cookie` syntax, scoped to `url`.
    pub fn add_cookie_str(&self, cookie: &str, url: &Url) {
        self.inner.add_cookie_str(cookie, url);
    }

    /// Value for the `Cookie` request header when sending to `url`.
    pub fn cookie_header(&self, url: &Url) -> Option<HeaderValue> {
        self.inner.cookies(url)
    }

    /// Stores every `Set-Cookie` header of a response received from `url`.
    pub fn store_response_cookies(&self, headers: &HeaderMap, url: &Url) {
        let mut set_cookies = headers.get_all(SET_COOKIE).iter();
        self.inner.set_cookies(&mut set_cookies, url);
    }

    /// Cookies that would be sent to `url`, as a `name=value; ...` string.
    pub fn cookies_for(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        self.cookie_header(&url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    /// True when both handles point at the same underlying store.
    pub fn same_store(&self, other: &CookieJar) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
