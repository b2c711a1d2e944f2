use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Serialize;
use serde_json::Value;

use crate::client::error::ClientError;
use crate::extract;

/// Flat repository metadata as returned by a single GraphQL call.
///
/// Every field is optional: GitHub nulls out anything the token cannot see
/// (private forks, missing README, repos without a license), and a partially
/// errored response still carries whatever data did resolve. Absence is a
/// valid terminal state, not an error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryRecord {
    pub name: Option<CompactString>,
    pub description: Option<String>,
    pub short_description_html: Option<String>,
    pub owner: Option<CompactString>,
    pub url: Option<CompactString>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub fork_count: Option<u32>,
    pub stargazer_count: Option<u32>,
    pub open_issues_count: Option<u32>,
    pub open_pull_requests_count: Option<u32>,
    pub license_name: Option<CompactString>,
    pub license_spdx_id: Option<CompactString>,
    /// README.md blob text from the default branch HEAD, if one exists.
    pub readme: Option<String>,
}

impl RepositoryRecord {
    /// Map a full GraphQL response body onto the record.
    ///
    /// Fields the response lacks stay `None`; a response whose `repository`
    /// node is entirely null yields an all-`None` record.
    pub fn from_response(body: &Value) -> Self {
        // All reads are rooted at data.repository; a null root simply
        // resolves every field to None.
        let repo = extract::get(body, &["data", "repository"]);
        let Some(repo) = repo else {
            return Self::default();
        };

        Self {
            name: extract::get_str(repo, &["name"]).map(Into::into),
            description: extract::get_str(repo, &["description"]).map(Into::into),
            short_description_html: extract::get_str(repo, &["shortDescriptionHTML"])
                .map(Into::into),
            owner: extract::get_str(repo, &["owner", "login"]).map(Into::into),
            url: extract::get_str(repo, &["url"]).map(Into::into),
            created_at: extract::get_datetime(repo, &["createdAt"]),
            updated_at: extract::get_datetime(repo, &["updatedAt"]),
            pushed_at: extract::get_datetime(repo, &["pushedAt"]),
            fork_count: extract::get_u32(repo, &["forkCount"]),
            stargazer_count: extract::get_u32(repo, &["stargazerCount", "totalCount"]),
            open_issues_count: extract::get_u32(repo, &["issues", "totalCount"]),
            open_pull_requests_count: extract::get_u32(repo, &["pullRequests", "totalCount"]),
            license_name: extract::get_str(repo, &["licenseInfo", "name"]).map(Into::into),
            license_spdx_id: extract::get_str(repo, &["licenseInfo", "spdxId"]).map(Into::into),
            readme: extract::get_str(repo, &["object", "text"]).map(Into::into),
        }
    }
}

/// One row per commit on the default branch.
///
/// `owner` and `repo` are stamped on after the fact so rows from different
/// repositories can be joined downstream. The linked user profile fields are
/// null whenever the commit author has no GitHub account association.
#[derive(Debug, Clone, Serialize)]
pub struct CommitRecord {
    pub owner: CompactString,
    pub repo: CompactString,
    pub oid: Option<CompactString>,
    pub message_headline: Option<String>,
    pub author_name: Option<CompactString>,
    pub author_email: Option<CompactString>,
    pub author_login: Option<CompactString>,
    pub author_location: Option<CompactString>,
    pub author_company: Option<CompactString>,
    pub author_pronouns: Option<CompactString>,
    pub author_bio: Option<String>,
    pub author_website_url: Option<CompactString>,
    pub author_twitter_username: Option<CompactString>,
    pub authored_at: Option<DateTime<Utc>>,
    pub additions: Option<u32>,
    pub deletions: Option<u32>,
}

impl CommitRecord {
    /// Build a record from a single `history.edges[].node` object.
    pub fn from_node(node: &Value, owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            oid: extract::get_str(node, &["oid"]).map(Into::into),
            message_headline: extract::get_str(node, &["messageHeadline"]).map(Into::into),
            author_name: extract::get_str(node, &["author", "name"]).map(Into::into),
            author_email: extract::get_str(node, &["author", "email"]).map(Into::into),
            author_login: extract::get_str(node, &["author", "user", "login"]).map(Into::into),
            author_location: extract::get_str(node, &["author", "user", "location"])
                .map(Into::into),
            author_company: extract::get_str(node, &["author", "user", "company"]).map(Into::into),
            author_pronouns: extract::get_str(node, &["author", "user", "pronouns"])
                .map(Into::into),
            author_bio: extract::get_str(node, &["author", "user", "bio"]).map(Into::into),
            author_website_url: extract::get_str(node, &["author", "user", "websiteUrl"])
                .map(Into::into),
            author_twitter_username: extract::get_str(node, &["author", "user", "twitterUsername"])
                .map(Into::into),
            authored_at: extract::get_datetime(node, &["author", "date"]),
            additions: extract::get_u32(node, &["additions"]),
            deletions: extract::get_u32(node, &["deletions"]),
        }
    }
}

/// Cached rate-limit state for one access token.
///
/// Refreshed by probing or opportunistically from the `rateLimit` block that
/// rides along on every data query. A cache, not authoritative: it can go
/// stale between refreshes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHealth {
    /// Viewer login the token authenticates as.
    pub login: Option<CompactString>,
    pub limit: u32,
    /// Cost charged for the query that produced this snapshot.
    pub cost: u32,
    pub remaining: u32,
    pub reset_at: Option<DateTime<Utc>>,
}

impl TokenHealth {
    /// Parse the viewer + rateLimit block out of a GraphQL response.
    ///
    /// A 200 response carrying an `errors` array (bad credentials, revoked
    /// token) counts as failure: health cannot be trusted from an errored
    /// body even when HTTP succeeded.
    pub fn from_response(body: &Value) -> Result<Self, ClientError> {
        if let Some(first) = body.get("errors").and_then(Value::as_array).and_then(|e| e.first()) {
            let message =
                extract::get_str(first, &["message"]).unwrap_or("unspecified GraphQL error");
            return Err(ClientError::graphql(message));
        }

        let rate = extract::get(body, &["data", "rateLimit"])
            .ok_or_else(|| ClientError::graphql("response missing rateLimit block"))?;

        Ok(Self {
            login: extract::get_str(body, &["data", "viewer", "login"]).map(Into::into),
            limit: extract::get_u32(rate, &["limit"]).unwrap_or(0),
            cost: extract::get_u32(rate, &["cost"]).unwrap_or(0),
            remaining: extract::get_u32(rate, &["remaining"]).unwrap_or(0),
            reset_at: extract::get_datetime(rate, &["resetAt"]),
        })
    }
}
