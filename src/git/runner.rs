//! Thin async wrapper around the `git` executable.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use super::error::GitError;

/// Upper bound for Git commands whose output is captured.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for Git commands that share the user's terminal.
pub const INTERACTIVE_TIMEOUT: Duration = Duration::from_secs(300);

fn owned_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| (*s).to_string()).collect()
}

fn base_command(workdir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(workdir).args(args).kill_on_drop(true);
    cmd
}

fn map_spawn_error(e: std::io::Error) -> GitError {
    if e.kind() == std::io::ErrorKind::NotFound {
        warn!("git not found in PATH");
        GitError::NotInstalled
    } else {
        GitError::Io(e)
    }
}

/// Runs a git command and returns its trimmed stdout on success.
pub async fn run_git(workdir: &Path, args: &[&str]) -> Result<String, GitError> {
    debug!(
        cmd = %format!("git -C {} {}", workdir.display(), args.join(" ")),
        "running git command"
    );

    let mut cmd = base_command(workdir, args);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = tokio::time::timeout(QUERY_TIMEOUT, cmd.output())
        .await
        .map_err(|_| GitError::TimedOut {
            args: owned_args(args),
            timeout: QUERY_TIMEOUT,
        })?
        .map_err(map_spawn_error)?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        debug!(args = ?args, status = ?output.status.code(), stderr = %stderr, "git command failed");
        Err(GitError::CommandFailed {
            args: owned_args(args),
            stderr,
        })
    }
}

/// Runs a git command with the terminal's stdio attached.
///
/// Git prints its own progress and errors, so only the exit status is
/// inspected.
pub async fn run_git_inherited(workdir: &Path, args: &[&str]) -> Result<(), GitError> {
    debug!(args = ?args, "running git command with inherited stdio");

    let mut cmd = base_command(workdir, args);
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let mut child = cmd.spawn().map_err(map_spawn_error)?;
    let status = tokio::time::timeout(INTERACTIVE_TIMEOUT, child.wait())
        .await
        .map_err(|_| GitError::TimedOut {
            args: owned_args(args),
            timeout: INTERACTIVE_TIMEOUT,
        })??;

    if status.success() {
        Ok(())
    } else {
        Err(GitError::CommandFailed {
            args: owned_args(args),
            stderr: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failing_command_reports_args() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_git(dir.path(), &["rev-parse", "--show-toplevel"])
            .await
            .unwrap_err();

        match err {
            GitError::CommandFailed { args, .. } => {
                assert_eq!(args, vec!["rev-parse", "--show-toplevel"]);
            }
            GitError::NotInstalled => {}
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn command_failed_display_joins_args() {
        let err = GitError::CommandFailed {
            args: vec!["log".to_string(), "-1".to_string()],
            stderr: "fatal: bad revision".to_string(),
        };
        assert_eq!(err.to_string(), "git log -1 failed: fatal: bad revision");
    }
}
