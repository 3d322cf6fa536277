//! Prompt selection for drafts.

use std::fmt;

use super::DraftKind;
use crate::config::{Preferences, PromptLanguage};

const COMMIT_MESSAGE_EN: &str = include_str!("../templates/commit_message_en.md");
const COMMIT_MESSAGE_ZH: &str = include_str!("../templates/commit_message_zh.md");
const BRANCH_NAME_EN: &str = include_str!("../templates/branch_name_en.md");
const BRANCH_NAME_ZH: &str = include_str!("../templates/branch_name_zh.md");

/// Where the instruction part of a prompt comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// The user's own prompt from the preference file.
    Custom,
    /// A built-in template.
    BuiltIn(PromptLanguage),
}

impl PromptMode {
    /// Determines the mode for `kind` under `prefs`.
    pub fn for_kind(kind: DraftKind, prefs: &Preferences) -> Self {
        if custom_prompt(kind, prefs).is_some() {
            Self::Custom
        } else {
            Self::BuiltIn(prefs.prompt_language())
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom => write!(f, "custom"),
            Self::BuiltIn(language) => write!(f, "{language}"),
        }
    }
}

/// Built-in template for a draft kind.
pub fn builtin_prompt(kind: DraftKind, language: PromptLanguage) -> &'static str {
    match (kind, language) {
        (DraftKind::Commit, PromptLanguage::En) => COMMIT_MESSAGE_EN,
        (DraftKind::Commit, PromptLanguage::Zh) => COMMIT_MESSAGE_ZH,
        (DraftKind::Branch, PromptLanguage::En) => BRANCH_NAME_EN,
        (DraftKind::Branch, PromptLanguage::Zh) => BRANCH_NAME_ZH,
    }
}

fn custom_prompt(kind: DraftKind, prefs: &Preferences) -> Option<&str> {
    match kind {
        DraftKind::Commit => prefs.custom_commit_prompt(),
        DraftKind::Branch => prefs.custom_branch_prompt(),
    }
}

/// Returns the instruction text: custom prompt if set, else the built-in
/// template in the configured language.
pub fn instruction(kind: DraftKind, prefs: &Preferences) -> &str {
    custom_prompt(kind, prefs)
        .unwrap_or_else(|| builtin_prompt(kind, prefs.prompt_language()))
}

/// Assembles the full prompt sent to the service.
pub fn build_prompt(kind: DraftKind, prefs: &Preferences, diff: &str) -> String {
    format!("{}\n\n{diff}", instruction(kind, prefs).trim_end())
}
