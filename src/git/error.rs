//! Errors raised while invoking the Git executable.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single Git invocation.
#[derive(Error, Debug)]
pub enum GitError {
    /// The `git` binary could not be found on `PATH`.
    #[error("git executable not found in PATH")]
    NotInstalled,

    /// Git ran but exited with a non-zero status.
    #[error("git {} failed: {stderr}", args.join(" "))]
    CommandFailed {
        /// Arguments passed to git (without the `-C <dir>` prefix).
        args: Vec<String>,
        /// Trimmed standard error output, empty for inherited-stdio commands.
        stderr: String,
    },

    /// Git did not finish within the allotted time.
    #[error("git {} timed out after {}s", args.join(" "), timeout.as_secs())]
    TimedOut {
        /// Arguments passed to git.
        args: Vec<String>,
        /// The timeout that expired.
        timeout: Duration,
    },

    /// Spawning or waiting on the process failed.
    #[error("I/O error while running git: {0}")]
    Io(#[from] std::io::Error),
}
