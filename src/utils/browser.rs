//! Opening URLs in the default browser.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

/// Command line that opens `url` on the given `std::env::consts::OS`.
pub fn browser_command(os: &str, url: &str) -> (&'static str, Vec<String>) {
    match os {
        "macos" => ("open", vec![url.to_string()]),
        // The empty argument is the window title `start` expects first.
        "windows" => (
            "cmd",
            vec!["/C".into(), "start".into(), String::new(), url.to_string()],
        ),
        _ => ("xdg-open", vec![url.to_string()]),
    }
}

/// Opens `url` in the default browser. Returns `false` on any failure.
pub async fn open_browser(url: &str) -> bool {
    let (program, args) = browser_command(std::env::consts::OS, url);

    let status = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => {
            debug!(%url, "Opened browser");
            true
        }
        Ok(status) => {
            warn!(program, %status, "Browser command failed");
            false
        }
        Err(e) => {
            warn!(program, error = %e, "Could not run browser command");
            false
        }
    }
}
