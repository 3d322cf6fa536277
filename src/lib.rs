//! # qkpr
//!
//! An interactive Git assistant for the terminal.
//!
//! ## Features
//!
//! - Pull request links and descriptions for GitHub, GitLab and Gitee
//! - Commit messages and branch names drafted by Gemini from staged changes
//! - Pinned branches listed first in every branch picker
//!
//! ## Quick Start
//!
//! ```rust
//! use qkpr::git::parse_remote_url;
//!
//! let remote = parse_remote_url("git@github.com:octo/app.git").unwrap();
//! assert_eq!(remote.host, "github.com");
//! assert_eq!(remote.repo_path, "octo/app");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod ai;
pub mod branch;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod pr;
pub mod utils;

pub use crate::cli::Cli;
pub use crate::error::FlowError;

/// The current version of qkpr.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
