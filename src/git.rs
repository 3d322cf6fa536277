//! Git operations and repository management.
//!
//! Everything here shells out to the `git` executable; no repository state
//! is read directly.

pub mod error;
pub mod remote;
pub mod repository;
pub mod runner;

pub use error::GitError;
pub use remote::{parse_remote_url, ParsedRemote, Protocol};
pub use repository::{parse_branch_listing, GitRepository, RepositoryInfo, DEFAULT_REMOTE};
