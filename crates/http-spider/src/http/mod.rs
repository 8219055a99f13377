mod client;
mod cookies;
mod executor;
mod response;

pub use client::HttpExecutor;
pub use cookies::CookieJar;
pub use executor::{RequestExecutor, SendOptions};
pub use response::Response;
