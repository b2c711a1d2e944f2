//! Configuration for the GitHub client

use std::time::Duration;

use compact_str::CompactString;

/// Main configuration for the GitHub client
///
/// Defaults target the public api.github.com GraphQL endpoint. Tests point
/// `endpoint` at a local mock server and shrink `cooldown` to zero.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GraphQL endpoint URL
    pub endpoint: CompactString,
    /// User-Agent header sent with every request (GitHub requires one)
    pub user_agent: CompactString,
    /// Request timeout
    pub timeout: Duration,
    /// Tokens with at most this much cached remaining quota are considered
    /// near exhaustion
    pub low_quota_threshold: u32,
    /// How long to block when every token is near exhaustion
    pub cooldown: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.github.com/graphql".into(),
            user_agent: "repominer".into(),
            timeout: Duration::from_secs(30),
            low_quota_threshold: 10,
            cooldown: Duration::from_secs(3600),
        }
    }
}

impl ClientConfig {
    /// Override the GraphQL endpoint, e.g. for GitHub Enterprise or a mock
    /// server in tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<CompactString>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}
