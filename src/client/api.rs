//! Core HTTP transport for the GitHub GraphQL API

use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::{debug, error};

use super::{
    config::ClientConfig,
    error::{ClientError, Result},
};
use crate::domain::TokenHealth;

/// Quota-only probe: reads viewer identity and the rate limit snapshot
/// without touching any repository data.
pub const RATE_LIMIT_QUERY: &str = "\
query TokenProbe {
  viewer { login }
  rateLimit { limit cost remaining resetAt }
}";

/// Single-shot repository metadata query. The `rateLimit` block rides along
/// so the caller can refresh token health without a separate probe.
pub const REPOSITORY_QUERY: &str = "\
query RepositoryInfo($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    name
    description
    shortDescriptionHTML
    url
    createdAt
    updatedAt
    pushedAt
    forkCount
    stargazerCount: stargazers { totalCount }
    issues(states: OPEN) { totalCount }
    pullRequests(states: OPEN) { totalCount }
    licenseInfo { name spdxId }
    owner { login }
    object(expression: \"HEAD:README.md\") { ... on Blob { text } }
  }
  viewer { login }
  rateLimit { limit cost remaining resetAt }
}";

/// One page of default-branch commit history, 100 records per page.
pub const COMMIT_HISTORY_QUERY: &str = "\
query CommitHistory($owner: String!, $name: String!, $since: GitTimestamp!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    defaultBranchRef {
      target {
        ... on Commit {
          history(first: 100, after: $cursor, since: $since) {
            pageInfo { hasNextPage endCursor }
            edges {
              node {
                oid
                messageHeadline
                author {
                  name
                  email
                  date
                  user { login location company pronouns bio websiteUrl twitterUsername }
                }
                additions
                deletions
              }
            }
          }
        }
      }
    }
  }
  rateLimit { limit cost remaining resetAt }
}";

/// One request to the GraphQL endpoint, authenticated with a single token.
///
/// The pool and the paginator talk to the API through this trait so tests
/// can script responses without a server.
pub trait GraphQlTransport {
    /// Issue one query. A non-success status or undecodable body is an
    /// `Err`; a 200 body is returned as-is and may still carry embedded
    /// GraphQL errors the caller must tolerate field-by-field.
    fn send(&self, query: &str, variables: Value, token: &str) -> Result<Value>;

    /// Health probe: quota-only query, parsed into a [`TokenHealth`].
    /// Embedded GraphQL errors (bad credentials) fail the probe.
    fn probe(&self, token: &str) -> Result<TokenHealth> {
        let body = self.send(RATE_LIMIT_QUERY, Value::Null, token)?;
        TokenHealth::from_response(&body)
    }
}

/// Blocking HTTP client for the GitHub GraphQL API
#[derive(Debug)]
pub struct GithubApi {
    client: Client,
    config: ClientConfig,
}

impl GithubApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl GraphQlTransport for GithubApi {
    fn send(&self, query: &str, variables: Value, token: &str) -> Result<Value> {
        let response = self
            .client
            .post(self.config.endpoint.as_str())
            .header("Authorization", format!("Bearer {token}"))
            .header("User-Agent", self.config.user_agent.as_str())
            .json(&json!({"query": query, "variables": variables}))
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            error!(
                status = status.as_u16(),
                body = %body,
                "GitHub API request failed"
            );
            return Err(ClientError::status(status.as_u16()));
        }

        debug!(status = status.as_u16(), bytes = body.len(), "GitHub API response received");

        serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to decode GitHub API response body");
            ClientError::json_parse(e)
        })
    }
}
