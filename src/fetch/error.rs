//! Errors reported by fetch capabilities.

use thiserror::Error;

/// Failure of a single fetch.
///
/// The engine never inspects the variant; it wraps whatever the fetcher returns
/// in [`LoaderError::FetchFailed`](crate::core::LoaderError::FetchFailed). The
/// type is `Clone` because a cached in-flight request hands the same outcome to
/// every caller that joined it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response (connection refused, timeout, ...)
    #[error("Request to {url} failed: {reason}")]
    Transport {
        /// URL that was requested
        url: String,
        /// Transport-level reason
        reason: String,
    },

    /// The server answered with a non-success status
    #[error("Request to {url} returned HTTP {status}")]
    Status {
        /// URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body is not the JSON the caller expected
    #[error("Invalid JSON from {url}: {reason}")]
    Decode {
        /// URL that was requested
        url: String,
        /// Parser message
        reason: String,
    },
}

impl FetchError {
    /// URL of the request that failed.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Transport {
                url,
                ..
            }
            | Self::Status {
                url,
                ..
            }
            | Self::Decode {
                url,
                ..
            } => url,
        }
    }
}
