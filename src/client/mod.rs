//! GitHub client modules
//!
//! Transport, configuration, error taxonomy, cursor pagination, and the
//! high-level service facade, each in its own focused component.

pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod service;

// Re-export main types for convenience
pub use api::{GithubApi, GraphQlTransport};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use service::GithubService;
