//! Settings flows: API key, model, prompt language and custom prompts.

use std::io::{BufRead, Write};

use anyhow::Result;
use crossterm::style::Stylize;

use super::commit::{prompt_api_key, API_KEY_URL};
use super::editor::edit_text;
use super::prompt::Prompter;
use super::{ui, FlowOutcome, Session};
use crate::ai::{list_models, AiClient, GeminiClient, ModelListing};
use crate::config::PromptLanguage;
use crate::error::FlowError;

fn saved(result: Result<()>) -> Result<()> {
    result.map_err(|e| FlowError::Preferences(format!("{e:#}")).into())
}

/// Asks for and stores the API key.
pub async fn configure_api_key<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
) -> Result<FlowOutcome> {
    let prompter = &mut session.prompter;
    ui::banner(prompter, "⚙️   Configuration")?;
    ui::dim(prompter, &format!("Get your API Key from: {API_KEY_URL}\n"))?;

    let Some(api_key) = prompt_api_key(prompter)? else {
        ui::warning(prompter, "Cancelled")?;
        return Ok(FlowOutcome::Cancelled);
    };

    saved(session.store.set_api_key(&api_key))?;
    ui::success(prompter, "API Key configured successfully!")?;
    Ok(FlowOutcome::Completed)
}

/// Lets the user pick a model from `listing`, filter it, or type one.
///
/// Empty input keeps `current`; a leading `/` forces filtering.
pub(crate) fn pick_model<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    listing: &ModelListing,
    current: &str,
) -> Result<Option<String>> {
    let all = listing.models();
    let mut visible: Vec<&String> = all.iter().collect();

    loop {
        prompter.say("Select a Gemini model:")?;
        for (i, model) in visible.iter().enumerate() {
            let marker = if *model == current { " (current)".green().to_string() } else { String::new() };
            prompter.say(format!("  {:>3}. {model}{marker}", i + 1))?;
        }
        prompter.say("    c. ✏️  Enter custom model name")?;
        prompter.say("    b. ↩️  Go back")?;

        let answer = prompter.ask(&format!("Number, text (or /text) to filter, c or b [{current}]:"))?;
        match answer.as_str() {
            "" => return Ok(Some(current.to_string())),
            "b" | "B" | "q" | "Q" => return Ok(None),
            "c" | "C" => {
                let custom = prompter.input("Enter model name (leave empty to go back):", None)?;
                return Ok((!custom.is_empty()).then_some(custom));
            }
            _ => {}
        }

        let query = match answer.strip_prefix('/') {
            Some(query) => query,
            None => {
                if let Ok(n) = answer.parse::<usize>() {
                    match visible.get(n.wrapping_sub(1)) {
                        Some(model) => return Ok(Some((*model).clone())),
                        None => {
                            prompter.say(format!(
                                "Please enter a number between 1 and {}.",
                                visible.len()
                            ))?;
                            continue;
                        }
                    }
                }
                answer.as_str()
            }
        };

        let needle = query.to_lowercase();
        let matches: Vec<&String> = all.iter().filter(|m| m.to_lowercase().contains(&needle)).collect();
        match matches.as_slice() {
            [] => ui::warning(prompter, &format!("No models match '{query}'"))?,
            [only] => return Ok(Some((*only).clone())),
            _ => visible = matches,
        }
    }
}

/// Fetches available models and stores the chosen one.
pub async fn configure_model<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
) -> Result<FlowOutcome> {
    let prefs = session.store.load();
    let current = prefs.resolve_model();
    let prompter = &mut session.prompter;
    ui::banner(prompter, "🤖  Model Configuration")?;
    ui::dim(prompter, &format!("Current model: {current}\n"))?;

    let client = match prefs.resolve_api_key() {
        Some(api_key) => {
            ui::dim(prompter, "Fetching available models...")?;
            Some(GeminiClient::new(api_key, current.clone()).map_err(FlowError::from)?)
        }
        None => {
            ui::warning(prompter, "ℹ️  No API Key found. Using common models list.")?;
            ui::dim(prompter, "Configure API Key first to fetch all available models dynamically.\n")?;
            None
        }
    };

    let listing = list_models(client.as_ref().map(|c| c as &dyn AiClient)).await;
    match &listing {
        ModelListing::Fetched(_) => ui::success(prompter, "Successfully fetched available models\n")?,
        ModelListing::Fallback { reason, .. } if client.is_some() => {
            ui::warning(prompter, &format!("Could not fetch models dynamically: {reason}"))?;
            ui::dim(prompter, "Using common models list instead\n")?;
        }
        ModelListing::Fallback { .. } => {}
    }

    let Some(model) = pick_model(prompter, &listing, &current)? else {
        ui::warning(prompter, "Cancelled")?;
        return Ok(FlowOutcome::Cancelled);
    };

    saved(session.store.set_model(&model))?;
    ui::success(prompter, &format!("Model configured successfully: {model}"))?;
    Ok(FlowOutcome::Completed)
}

/// Chooses the language of the built-in prompts.
pub async fn configure_prompt_language<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
) -> Result<FlowOutcome> {
    let current = session.store.load().prompt_language();
    let prompter = &mut session.prompter;
    ui::banner(prompter, "🌐  Prompt Language Configuration")?;
    ui::dim(prompter, &format!("Current prompt language: {current}\n"))?;

    let choices = [
        ("🇨🇳  Chinese", Some(PromptLanguage::Zh)),
        ("🇺🇸  English", Some(PromptLanguage::En)),
        ("↩️   Go back", None),
    ];
    let labels = choices.map(|(label, _)| label);
    let default = choices
        .iter()
        .position(|(_, lang)| *lang == Some(current))
        .unwrap_or_default();

    let picked = prompter
        .select("Select a language for the prompts:", &labels, default)?
        .and_then(|i| choices[i].1);
    let Some(language) = picked else {
        ui::warning(prompter, "Cancelled")?;
        return Ok(FlowOutcome::Cancelled);
    };

    saved(session.store.set_prompt_language(language))?;
    ui::success(prompter, &format!("Prompt language configured successfully: {language}"))?;
    Ok(FlowOutcome::Completed)
}

/// Sets or clears the custom commit and branch prompts.
pub async fn configure_prompts<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
) -> Result<FlowOutcome> {
    let prefs = session.store.load();
    let prompter = &mut session.prompter;
    ui::banner(prompter, "📝  Custom Prompts Configuration")?;

    for (title, prompt) in [
        ("Current custom commit message prompt:", prefs.custom_commit_prompt()),
        ("Current custom branch name prompt:", prefs.custom_branch_prompt()),
    ] {
        ui::dim(prompter, title)?;
        match prompt {
            Some(text) => prompter.say(text.yellow().to_string())?,
            None => ui::dim(prompter, "Not set")?,
        }
        prompter.say("")?;
    }

    let choice = prompter.select(
        "What would you like to do?",
        &[
            "✏️  Set custom commit message prompt",
            "✏️  Set custom branch name prompt",
            "🗑️  Clear custom commit message prompt",
            "🗑️  Clear custom branch name prompt",
            "↩️   Go back",
        ],
        0,
    )?;

    let store = &session.store;
    match choice {
        Some(0) => {
            let initial = prefs.custom_commit_prompt().unwrap_or_default();
            match edit_text(initial)? {
                Some(text) => {
                    saved(store.set_custom_commit_prompt(Some(text)))?;
                    ui::success(prompter, "Custom commit message prompt saved!")?;
                }
                None => ui::warning(prompter, "Cancelled")?,
            }
        }
        Some(1) => {
            let initial = prefs.custom_branch_prompt().unwrap_or_default();
            match edit_text(initial)? {
                Some(text) => {
                    saved(store.set_custom_branch_prompt(Some(text)))?;
                    ui::success(prompter, "Custom branch name prompt saved!")?;
                }
                None => ui::warning(prompter, "Cancelled")?,
            }
        }
        Some(2) => {
            saved(store.set_custom_commit_prompt(None))?;
            ui::success(prompter, "Custom commit message prompt cleared!")?;
        }
        Some(3) => {
            saved(store.set_custom_branch_prompt(None))?;
            ui::success(prompter, "Custom branch name prompt cleared!")?;
        }
        _ => {
            ui::warning(prompter, "Cancelled")?;
            return Ok(FlowOutcome::Cancelled);
        }
    }
    Ok(FlowOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::cli::prompt::tests::{scripted, transcript};
    use crate::config::PreferenceStore;
    use crate::git::GitRepository;

    fn listing() -> ModelListing {
        ModelListing::fallback("offline")
    }

    #[test]
    fn empty_answer_keeps_current_model() {
        let mut p = scripted("\n");
        assert_eq!(
            pick_model(&mut p, &listing(), "gemini-2.0-flash").unwrap().as_deref(),
            Some("gemini-2.0-flash")
        );
        assert!(transcript(p).contains("(current)"));
    }

    #[test]
    fn filter_then_number() {
        let mut p = scripted("lite\n2\n");
        assert_eq!(
            pick_model(&mut p, &listing(), "x").unwrap().as_deref(),
            Some("gemini-2.0-flash-lite")
        );
    }

    #[test]
    fn unique_filter_match_wins() {
        let mut p = scripted("2.5-PRO\n");
        assert_eq!(
            pick_model(&mut p, &listing(), "x").unwrap().as_deref(),
            Some("gemini-2.5-pro")
        );
    }

    #[test]
    fn slash_prefix_filters_by_version() {
        let mut p = scripted("/2.0-flash-l\n");
        assert_eq!(
            pick_model(&mut p, &listing(), "x").unwrap().as_deref(),
            Some("gemini-2.0-flash-lite")
        );
    }

    #[test]
    fn custom_model_and_go_back() {
        let mut p = scripted("c\ngemini-exp-1206\n");
        assert_eq!(
            pick_model(&mut p, &listing(), "x").unwrap().as_deref(),
            Some("gemini-exp-1206")
        );
        assert_eq!(pick_model(&mut scripted("c\n\n"), &listing(), "x").unwrap(), None);
        assert_eq!(pick_model(&mut scripted("b\n"), &listing(), "x").unwrap(), None);
    }

    #[tokio::test]
    async fn prompt_language_is_saved() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::at(dir.path().join("config.json"));
        let mut session = Session::new(store.clone(), GitRepository::open_at(dir.path()), scripted("2\n"));

        let outcome = configure_prompt_language(&mut session).await.unwrap();
        assert_eq!(outcome, FlowOutcome::Completed);
        assert_eq!(store.load().prompt_language(), PromptLanguage::En);
    }

    #[tokio::test]
    async fn prompts_can_be_cleared() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::at(dir.path().join("config.json"));
        store.set_custom_commit_prompt(Some("One line only.".into())).unwrap();
        let mut session = Session::new(store.clone(), GitRepository::open_at(dir.path()), scripted("3\n"));

        configure_prompts(&mut session).await.unwrap();
        assert_eq!(store.load().custom_commit_prompt(), None);
        let out = String::from_utf8(session.prompter.into_output()).unwrap();
        assert!(out.contains("One line only."));
        assert!(out.contains("cleared"));
    }

    #[tokio::test]
    async fn api_key_go_back_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::at(dir.path().join("config.json"));
        let mut session = Session::new(store.clone(), GitRepository::open_at(dir.path()), scripted("2\n"));

        let outcome = configure_api_key(&mut session).await.unwrap();
        assert_eq!(outcome, FlowOutcome::Cancelled);
        assert!(!store.path().exists());
    }
}
