//! Persisted user preferences.
//!
//! Preferences live in a single JSON file (by default `$HOME/.qkpr/config.json`).
//! Every mutation performs a full read-modify-write cycle; there is no locking,
//! so concurrent invocations follow last-writer-wins.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["QUICK_PR_GEMINI_API_KEY", "GEMINI_API_KEY"];

/// Environment variables consulted for the model name, in order.
pub const MODEL_ENV_VARS: &[&str] = &["QUICK_PR_GEMINI_MODEL", "GEMINI_MODEL"];

/// Model used when neither the file nor the environment names one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Language of the built-in prompt templates and localized messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptLanguage {
    /// English.
    En,
    /// Simplified Chinese.
    #[default]
    Zh,
}

impl fmt::Display for PromptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::En => write!(f, "en"),
            Self::Zh => write!(f, "zh"),
        }
    }
}

/// Contents of the preference file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Gemini API key.
    #[serde(
        default,
        alias = "geminiApiKey",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<String>,

    /// Gemini model identifier.
    #[serde(
        default,
        alias = "geminiModel",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub model: Option<String>,

    /// Pinned branch names; insertion order is display order.
    #[serde(
        default,
        deserialize_with = "lenient_branches",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub pinned_branches: Vec<String>,

    /// Language of the built-in prompts.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub prompt_language: Option<PromptLanguage>,

    /// Replaces the built-in commit message prompt when set.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub custom_commit_message_prompt: Option<String>,

    /// Replaces the built-in branch name prompt when set.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub custom_branch_name_prompt: Option<String>,

    /// Keys this version does not know about, kept across rewrites.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Reads a field, falling back to its default when the value has the wrong
/// shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        debug!(error = %e, "ignoring invalid preference value");
        T::default()
    }))
}

/// Keeps the string entries of the pin list and drops anything else.
fn lenient_branches<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        debug!("ignoring pinnedBranches that is not a list");
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(name) if !name.trim().is_empty() => Some(name),
            _ => None,
        })
        .collect())
}

impl Preferences {
    /// Parses preferences.
    ///
    /// Content that is not a JSON object yields defaults. Inside an object,
    /// a field with an unexpected value falls back to its own default while
    /// every other field, known or not, is kept.
    pub fn from_json(content: &str) -> Self {
        match serde_json::from_str::<Self>(content) {
            Ok(mut prefs) => {
                prefs.dedup_pinned();
                prefs
            }
            Err(e) => {
                debug!(error = %e, "discarding malformed preference file");
                Self::default()
            }
        }
    }

    fn dedup_pinned(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.pinned_branches.retain(|b| seen.insert(b.clone()));
    }

    /// Returns the configured prompt language, defaulting to Chinese.
    pub fn prompt_language(&self) -> PromptLanguage {
        self.prompt_language.unwrap_or_default()
    }

    /// Returns the custom commit prompt if one is set and non-empty.
    pub fn custom_commit_prompt(&self) -> Option<&str> {
        non_empty(self.custom_commit_message_prompt.as_deref())
    }

    /// Returns the custom branch prompt if one is set and non-empty.
    pub fn custom_branch_prompt(&self) -> Option<&str> {
        non_empty(self.custom_branch_name_prompt.as_deref())
    }

    /// Checks whether a branch is pinned.
    pub fn is_pinned(&self, branch: &str) -> bool {
        self.pinned_branches.iter().any(|b| b == branch)
    }

    /// Resolves the API key: file first, then [`API_KEY_ENV_VARS`].
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        non_empty(self.api_key.as_deref())
            .map(str::to_string)
            .or_else(|| first_set(API_KEY_ENV_VARS, &lookup))
    }

    /// Resolves the model: file, then [`MODEL_ENV_VARS`], then [`DEFAULT_MODEL`].
    pub fn resolve_model_with<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        non_empty(self.model.as_deref())
            .map(str::to_string)
            .or_else(|| first_set(MODEL_ENV_VARS, &lookup))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// Resolves the API key against the process environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(env_lookup)
    }

    /// Resolves the model against the process environment.
    pub fn resolve_model(&self) -> String {
        self.resolve_model_with(env_lookup)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn first_set<F>(keys: &[&str], lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty())
}

/// Result of pinning a single branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    /// The branch was appended to the pin list.
    Pinned,
    /// The branch was already pinned; nothing changed.
    AlreadyPinned,
}

/// Result of unpinning a single branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpinOutcome {
    /// The branch was removed from the pin list.
    Unpinned,
    /// The branch was not pinned; nothing changed.
    NotPinned,
}

/// Read/modify/write access to the preference file.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Returns the default preference file path.
    pub fn default_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

        Ok(home_dir.join(".qkpr").join("config.json"))
    }

    /// Opens the store at an explicit path, or the default one.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::at(path)),
            None => Ok(Self::at(Self::default_path()?)),
        }
    }

    /// Opens the store at a specific path.
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the preference file; missing or unreadable files yield defaults.
    pub fn load(&self) -> Preferences {
        match fs::read_to_string(&self.path) {
            Ok(content) => Preferences::from_json(&content),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no preference file, using defaults");
                Preferences::default()
            }
        }
    }

    /// Rewrites the whole preference file.
    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
        }

        let content =
            serde_json::to_string_pretty(prefs).context("Failed to serialize preferences")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write preference file: {}", self.path.display()))?;

        debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }

    /// Loads, applies `f`, and saves.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Preferences) -> T,
    {
        let mut prefs = self.load();
        let result = f(&mut prefs);
        self.save(&prefs)?;
        Ok(result)
    }

    /// Returns the pinned branches in pin order.
    pub fn pinned_branches(&self) -> Vec<String> {
        self.load().pinned_branches
    }

    /// Appends a branch to the pin list unless it is already there.
    pub fn pin(&self, branch: &str) -> Result<PinOutcome> {
        let mut prefs = self.load();
        if prefs.is_pinned(branch) {
            return Ok(PinOutcome::AlreadyPinned);
        }
        prefs.pinned_branches.push(branch.to_string());
        self.save(&prefs)?;
        Ok(PinOutcome::Pinned)
    }

    /// Pins several branches in one write; returns how many were new.
    pub fn pin_many<S: AsRef<str>>(&self, branches: &[S]) -> Result<usize> {
        let mut prefs = self.load();
        let mut added = 0;
        for branch in branches {
            let branch = branch.as_ref();
            if !prefs.is_pinned(branch) {
                prefs.pinned_branches.push(branch.to_string());
                added += 1;
            }
        }
        if added > 0 {
            self.save(&prefs)?;
        }
        Ok(added)
    }

    /// Removes a branch from the pin list, keeping the order of the rest.
    pub fn unpin(&self, branch: &str) -> Result<UnpinOutcome> {
        let mut prefs = self.load();
        let Some(index) = prefs.pinned_branches.iter().position(|b| b == branch) else {
            return Ok(UnpinOutcome::NotPinned);
        };
        prefs.pinned_branches.remove(index);
        self.save(&prefs)?;
        Ok(UnpinOutcome::Unpinned)
    }

    /// Unpins several branches in one write; returns how many were removed.
    pub fn unpin_many<S: AsRef<str>>(&self, branches: &[S]) -> Result<usize> {
        let mut prefs = self.load();
        let before = prefs.pinned_branches.len();
        prefs
            .pinned_branches
            .retain(|pinned| !branches.iter().any(|b| b.as_ref() == pinned));
        let removed = before - prefs.pinned_branches.len();
        if removed > 0 {
            self.save(&prefs)?;
        }
        Ok(removed)
    }

    /// Stores the API key.
    pub fn set_api_key(&self, api_key: &str) -> Result<()> {
        self.update(|prefs| prefs.api_key = Some(api_key.to_string()))
    }

    /// Stores the model name.
    pub fn set_model(&self, model: &str) -> Result<()> {
        self.update(|prefs| prefs.model = Some(model.to_string()))
    }

    /// Stores the prompt language.
    pub fn set_prompt_language(&self, language: PromptLanguage) -> Result<()> {
        self.update(|prefs| prefs.prompt_language = Some(language))
    }

    /// Sets or clears (`None`) the custom commit message prompt.
    pub fn set_custom_commit_prompt(&self, prompt: Option<String>) -> Result<()> {
        self.update(|prefs| prefs.custom_commit_message_prompt = prompt.filter(|p| !p.trim().is_empty()))
    }

    /// Sets or clears (`None`) the custom branch name prompt.
    pub fn set_custom_branch_prompt(&self, prompt: Option<String>) -> Result<()> {
        self.update(|prefs| prefs.custom_branch_name_prompt = prompt.filter(|p| !p.trim().is_empty()))
    }
}
