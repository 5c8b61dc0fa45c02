//! GitHub API error types and classification.
//!
//! This module is the sole classifier of provider HTTP errors: the
//! crawler and the rate-limit adapter only ever see [`ApiError`]
//! variants, never raw status codes.

use thiserror::Error;

/// Errors that can occur when calling the GitHub API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The provider's rate limit is exhausted. Retried by the adapter
    /// after the provider-reported reset instant.
    #[error("API rate limit exceeded")]
    RateExceeded,

    /// The provider denied access to a specific resource. Surfaced, not
    /// retried.
    #[error("resource unavailable: {0}")]
    Unavailable(String),

    /// The call was abandoned because the daemon is shutting down.
    #[error("call cancelled by shutdown")]
    Cancelled,

    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),
}

/// Classify an octocrab error into the daemon's taxonomy.
///
/// HTTP 403 with a rate-limit message becomes [`ApiError::RateExceeded`],
/// 403 with an access-blocked message becomes [`ApiError::Unavailable`],
/// everything else passes through.
pub fn classify(err: octocrab::Error) -> ApiError {
    if let octocrab::Error::GitHub { ref source, .. } = err {
        if source.status_code.as_u16() == 403 {
            if source.message.contains("API rate limit exceeded") {
                return ApiError::RateExceeded;
            }
            if source.message.contains("access blocked") {
                return ApiError::Unavailable(source.message.clone());
            }
        }
    }

    ApiError::Api(err)
}

impl ApiError {
    /// Whether this error means the provider rate limit is exhausted.
    #[inline]
    pub fn is_rate_exceeded(&self) -> bool {
        matches!(self, Self::RateExceeded)
    }
}
