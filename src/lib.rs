//! Collects GitHub repository metadata and commit history over the GraphQL
//! API, rotating among multiple access tokens to stay under rate limits.
//!
//! The pool probes every supplied token at startup, tracks a cached quota
//! snapshot per token, and hands out the least exhausted one for each call.
//! When every token is near exhaustion the caller blocks for one coarse
//! cooldown interval. Commit histories are paginated to completion or not
//! returned at all.
//!
//! ```no_run
//! use repominer::{ClientConfig, GithubService};
//!
//! let tokens = [("primary", "ghp_aaaa"), ("backup", "ghp_bbbb")];
//! let mut service = GithubService::new(ClientConfig::default(), &tokens)?;
//!
//! if let Some(info) = service.fetch_repository_info("github", "linguist", None) {
//!     println!("{:?} has {:?} stars", info.name, info.stargazer_count);
//! }
//!
//! let commits = service.fetch_commit_history("github", "linguist", None, None);
//! # Ok::<(), repominer::ClientError>(())
//! ```

pub mod client;
pub mod domain;
pub mod extract;
pub mod pool;

pub use client::{ClientConfig, ClientError, GithubApi, GithubService, GraphQlTransport};
pub use domain::{CommitRecord, RepositoryRecord, TokenHealth};
pub use pool::{Sleeper, ThreadSleeper, TokenPool};
