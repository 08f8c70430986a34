//! Translation-management service client for lingua.
//!
//! - [`RemoteClient`]: the operations the sync engine orchestrates
//! - [`HttpRemoteClient`]: reqwest implementation with retry and a global
//!   rate limiter
//! - [`LocaleMapper`]: local `en_us` ⇄ remote `en-US` codes
//! - [`unpack`]: export archive → `path → contents`

mod archive;
mod client;
mod config;
mod error;
mod http;
mod locale;
mod rate_limit;
mod retry;

pub use archive::unpack;
pub use client::{
    BuildRequest, BuildState, BuildStatus, RemoteClient, RemoteDirectory, RemoteFile,
    RemoteString,
};
pub use config::{Credential, RemoteConfig, TOKEN_ENV};
pub use error::{RemoteError, RemoteResult};
pub use http::HttpRemoteClient;
pub use locale::{LocaleMapper, default_local, default_remote};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use retry::{RetryConfig, retry};
