//! High-level GitHub collection operations
//!
//! Composes the token pool, transport, and paginator into the two
//! operations callers actually use. Failures surface as `None` plus log
//! lines; the internal error taxonomy stays inside the crate.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tracing::{debug, error, info, instrument};

use super::{
    api::{GithubApi, GraphQlTransport, REPOSITORY_QUERY},
    config::ClientConfig,
    error::Result,
    history,
};
use crate::domain::{CommitRecord, RepositoryRecord, TokenHealth};
use crate::pool::TokenPool;

/// Default `since` floor: predates every GitHub repository, so it means
/// "the whole history".
fn epoch_floor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2007, 1, 1, 0, 0, 0).unwrap()
}

/// High-level service for collecting repository data
///
/// Both fetch operations optionally accept an explicit token, bypassing
/// pool selection; useful when a caller shards tokens across workers via
/// [`TokenPool::best_n`].
pub struct GithubService {
    api: GithubApi,
    pool: TokenPool,
}

impl GithubService {
    /// Build the transport and probe every candidate token.
    ///
    /// Fails only when the HTTP client cannot be constructed or no token
    /// survives its probe.
    pub fn new(config: ClientConfig, tokens: &[(&str, &str)]) -> Result<Self> {
        let api = GithubApi::new(config.clone())?;
        let pool = TokenPool::initialize(tokens, &api, &config)?;
        Ok(Self { api, pool })
    }

    /// Assemble from an existing transport and pool.
    pub fn from_parts(api: GithubApi, pool: TokenPool) -> Self {
        Self { api, pool }
    }

    pub fn pool(&self) -> &TokenPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut TokenPool {
        &mut self.pool
    }

    /// Fetch repository metadata in a single call.
    ///
    /// `None` means "info unavailable": transport failure and a repository
    /// that does not exist are not distinguished here. On success the
    /// embedded rate-limit snapshot is written back into the pool for the
    /// token that was used.
    #[instrument(skip(self, token))]
    pub fn fetch_repository_info(
        &mut self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Option<RepositoryRecord> {
        let token = self.select_token(token)?;
        let variables = json!({"owner": owner, "name": repo});

        match self.api.send(REPOSITORY_QUERY, variables, &token) {
            Ok(body) => {
                match TokenHealth::from_response(&body) {
                    Ok(health) => self.pool.update_health(&token, health),
                    Err(e) => {
                        debug!(error = %e, "Response carried no usable rate limit snapshot");
                    },
                }
                Some(RepositoryRecord::from_response(&body))
            },
            Err(e) => {
                error!(owner, repo, error = %e, "Failed to fetch repository info");
                None
            },
        }
    }

    /// Fetch the full commit history of the default branch since `since`
    /// (the 2007 epoch floor when omitted).
    ///
    /// Fully drains pagination or returns `None`; a truncated history is
    /// never handed back. On success every token is re-probed, since a
    /// large fetch changes the quota landscape materially.
    #[instrument(skip(self, token, since))]
    pub fn fetch_commit_history(
        &mut self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
        since: Option<DateTime<Utc>>,
    ) -> Option<Vec<CommitRecord>> {
        let token = self.select_token(token)?;
        let since = since.unwrap_or_else(epoch_floor);

        match history::fetch_all(&self.api, owner, repo, &token, since) {
            Ok(records) => {
                info!(owner, repo, commits = records.len(), "Commit history collected");
                self.pool.refresh_all(&self.api);
                Some(records)
            },
            Err(e) => {
                error!(owner, repo, error = %e, "Failed to fetch commit history");
                None
            },
        }
    }

    fn select_token(&self, explicit: Option<&str>) -> Option<String> {
        match explicit {
            Some(token) => Some(token.to_string()),
            None => self.pool.best_single().map(str::to_string),
        }
    }
}
