//! Error types for the GitHub client

use compact_str::{CompactString, ToCompactString};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failures internal to the client.
///
/// None of these cross the facade boundary: `GithubService` converts them
/// into `None` returns plus diagnostic log lines, so callers branch on
/// absence rather than on an error taxonomy.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API. The raw body has already been
    /// logged by the transport.
    #[error("GitHub API returned HTTP {status}")]
    Status { status: u16 },

    /// A 2xx response whose body did not decode as JSON.
    #[error("Failed to parse response: {message}")]
    JsonParse { message: CompactString },

    /// Error embedded in an otherwise successful GraphQL response body.
    #[error("GraphQL error: {message}")]
    GraphQl { message: CompactString },

    /// Every candidate token failed its health probe at pool construction.
    #[error("No usable tokens: all candidates failed their health probe")]
    NoUsableTokens,
}

impl ClientError {
    pub fn status(status: u16) -> Self {
        Self::Status { status }
    }

    pub fn json_parse(source: impl std::fmt::Display) -> Self {
        Self::JsonParse { message: source.to_compact_string() }
    }

    pub fn graphql(message: impl Into<CompactString>) -> Self {
        Self::GraphQl { message: message.into() }
    }
}
