//! GitHub API integration.
//!
//! [`client::GithubClient`] exposes the handful of typed calls the crawler
//! needs, [`error`] owns the provider error classification, and
//! [`rate_limit`] implements the suspend-until-reset policy applied to
//! every call.

pub mod client;
pub mod error;
pub mod rate_limit;
pub mod types;

pub use client::GithubClient;
pub use error::ApiError;
pub use rate_limit::{RateLimitBucket, retry_on_rate_limit};
