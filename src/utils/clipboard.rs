//! Best-effort clipboard access through platform commands.

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// A clipboard command-line tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardTool {
    /// macOS.
    Pbcopy,
    /// X11.
    Xclip,
    /// Wayland.
    WlCopy,
    /// Windows.
    Clip,
}

impl ClipboardTool {
    /// Executable name.
    pub fn program(self) -> &'static str {
        match self {
            Self::Pbcopy => "pbcopy",
            Self::Xclip => "xclip",
            Self::WlCopy => "wl-copy",
            Self::Clip => "clip",
        }
    }

    fn args(self) -> &'static [&'static str] {
        match self {
            Self::Xclip => &["-selection", "clipboard"],
            Self::Pbcopy | Self::WlCopy | Self::Clip => &[],
        }
    }
}

/// Tools to try, in order, on the given `std::env::consts::OS`.
pub fn candidates_for(os: &str) -> &'static [ClipboardTool] {
    match os {
        "macos" => &[ClipboardTool::Pbcopy],
        "windows" => &[ClipboardTool::Clip],
        _ => &[ClipboardTool::Xclip, ClipboardTool::WlCopy],
    }
}

/// Picks the first candidate tool present on `PATH`.
pub fn detect_tool() -> Option<ClipboardTool> {
    candidates_for(std::env::consts::OS)
        .iter()
        .copied()
        .find(|tool| which::which(tool.program()).is_ok())
}

async fn pipe_to(tool: ClipboardTool, text: &str) -> Result<()> {
    let mut child = Command::new(tool.program())
        .args(tool.args())
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to start {}", tool.program()))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .await
            .context("Failed to write to clipboard tool")?;
    }

    let status = child.wait().await.context("Clipboard tool did not finish")?;
    if !status.success() {
        bail!("{} exited with {status}", tool.program());
    }
    Ok(())
}

/// Copies `text` to the system clipboard.
///
/// Returns `false` when no tool is available or it fails; the caller is
/// expected to show the text for manual copying instead.
pub async fn copy_to_clipboard(text: &str) -> bool {
    let Some(tool) = detect_tool() else {
        warn!("No clipboard tool found");
        return false;
    };

    match pipe_to(tool, text).await {
        Ok(()) => {
            debug!(tool = tool.program(), bytes = text.len(), "Copied to clipboard");
            true
        }
        Err(e) => {
            warn!(tool = tool.program(), error = %format!("{e:#}"), "Clipboard copy failed");
            false
        }
    }
}
