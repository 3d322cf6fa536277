//! Editing text in the user's editor.

use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::debug;

const FALLBACK_EDITOR: &str = "vi";

/// Splits an editor setting such as `code --wait` into command and args.
pub(crate) fn parse_editor_command(editor: &str) -> (&str, Vec<&str>) {
    let mut parts = editor.split_whitespace();
    let cmd = parts.next().unwrap_or(editor);
    let args: Vec<&str> = parts.collect();
    (cmd, args)
}

/// Editor from `$VISUAL`, then `$EDITOR`, then `vi`.
pub(crate) fn resolve_editor<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ["VISUAL", "EDITOR"]
        .iter()
        .find_map(|var| lookup(var).filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Opens `initial` in the editor and returns the saved text, trimmed.
///
/// Returns `None` when the result is empty.
pub fn edit_text(initial: &str) -> Result<Option<String>> {
    let mut file = tempfile::Builder::new()
        .prefix("qkpr-prompt-")
        .suffix(".md")
        .tempfile()
        .context("Failed to create temporary file")?;
    file.write_all(initial.as_bytes())
        .context("Failed to write temporary file")?;
    file.flush()?;

    let editor = resolve_editor(|var| env::var(var).ok());
    let (cmd, args) = parse_editor_command(&editor);
    debug!(editor = %editor, path = %file.path().display(), "Opening editor");

    let status = Command::new(cmd)
        .args(args)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to launch editor '{editor}'"))?;
    if !status.success() {
        bail!("Editor '{editor}' exited with {status}");
    }

    let edited = fs::read_to_string(file.path()).context("Failed to read edited file")?;
    let edited = edited.trim();
    Ok((!edited.is_empty()).then(|| edited.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_with_arguments() {
        assert_eq!(parse_editor_command("code --wait"), ("code", vec!["--wait"]));
        assert_eq!(parse_editor_command("vim"), ("vim", vec![]));
    }

    #[test]
    fn editor_resolution_order() {
        let env = |visual: Option<&str>, editor: Option<&str>| {
            let (visual, editor) = (visual.map(String::from), editor.map(String::from));
            resolve_editor(move |var| match var {
                "VISUAL" => visual.clone(),
                "EDITOR" => editor.clone(),
                _ => None,
            })
        };
        assert_eq!(env(Some("nano"), Some("vim")), "nano");
        assert_eq!(env(Some(" "), Some("vim")), "vim");
        assert_eq!(env(None, None), "vi");
    }
}
