//! Cursor pagination over default-branch commit history

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use tracing::debug;

use super::api::{COMMIT_HISTORY_QUERY, GraphQlTransport};
use super::error::Result;
use crate::domain::CommitRecord;
use crate::extract;

/// Continuation state echoed back verbatim on the next request. Owned by
/// the remote service; the loop never inspects the cursor contents.
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

fn page_info(history: &Value) -> PageInfo {
    PageInfo {
        has_next_page: extract::get_bool(history, &["pageInfo", "hasNextPage"]).unwrap_or(false),
        end_cursor: extract::get_str(history, &["pageInfo", "endCursor"]).map(Into::into),
    }
}

/// Drain the full commit history of `owner/repo` since `since`.
///
/// Pages are fetched strictly sequentially, each cursor depending on the
/// previous response. Records accumulate append-only in upstream order. A
/// transport failure on any page aborts the whole fetch: a truncated history
/// that looks complete is worse than no result.
pub fn fetch_all(
    api: &impl GraphQlTransport,
    owner: &str,
    repo: &str,
    token: &str,
    since: DateTime<Utc>,
) -> Result<Vec<CommitRecord>> {
    let since = since.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut has_next_page = true;
    let mut page = 0u32;

    while has_next_page {
        let variables = json!({
            "owner": owner,
            "name": repo,
            "since": since,
            "cursor": cursor,
        });
        let body = api.send(COMMIT_HISTORY_QUERY, variables, token)?;

        let history = extract::get(
            &body,
            &["data", "repository", "defaultBranchRef", "target", "history"],
        );

        // An absent or null edge list is an empty page, not an error.
        let empty = Vec::new();
        let edges = history
            .and_then(|h| extract::get(h, &["edges"]))
            .and_then(Value::as_array)
            .unwrap_or(&empty);

        for edge in edges {
            if let Some(node) = extract::get(edge, &["node"]) {
                records.push(CommitRecord::from_node(node, owner, repo));
            }
        }

        page += 1;
        debug!(
            owner,
            repo,
            page,
            fetched = edges.len(),
            total = records.len(),
            "Fetched commit history page"
        );

        let info = match history {
            Some(h) => page_info(h),
            None => PageInfo { has_next_page: false, end_cursor: None },
        };
        has_next_page = info.has_next_page;
        cursor = info.end_cursor;
    }

    Ok(records)
}
