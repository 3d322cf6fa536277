//! Draft generation and the accept/regenerate cycle around it.

use std::fmt;
use std::mem;

use tracing::debug;

use super::prompts::build_prompt;
use super::{AiClient, AiError, ChunkSink};
use crate::config::Preferences;

/// What is being drafted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    /// A commit message.
    Commit,
    /// A branch name.
    Branch,
}

impl fmt::Display for DraftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => write!(f, "commit message"),
            Self::Branch => write!(f, "branch name"),
        }
    }
}

/// Normalizes raw model output.
///
/// Surrounding whitespace and Markdown code fences are removed. Branch names
/// are reduced to their first non-empty line without backticks.
pub fn clean_draft(kind: DraftKind, raw: &str) -> String {
    let text = strip_code_fence(raw.trim()).trim();

    match kind {
        DraftKind::Commit => text.to_string(),
        DraftKind::Branch => text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .replace('`', "")
            .trim()
            .to_string(),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (```text, ```bash, ...).
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body)
}

/// Produces drafts from a staged diff.
pub struct DraftService<'a> {
    client: &'a dyn AiClient,
    preferences: &'a Preferences,
}

impl<'a> DraftService<'a> {
    /// Creates a service using `client` and the prompt settings in
    /// `preferences`.
    pub fn new(client: &'a dyn AiClient, preferences: &'a Preferences) -> Self {
        Self {
            client,
            preferences,
        }
    }

    /// Model the drafts come from.
    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Drafts a commit message or branch name for `diff`.
    ///
    /// Fragments are passed to `on_chunk` as they stream in; the returned
    /// text is the cleaned concatenation. Never retries.
    pub async fn draft(
        &self,
        kind: DraftKind,
        diff: &str,
        on_chunk: ChunkSink<'_>,
    ) -> Result<String, AiError> {
        if diff.trim().is_empty() {
            return Err(AiError::EmptyDiff);
        }

        let prompt = build_prompt(kind, self.preferences, diff);
        debug!(%kind, model = %self.client.model(), prompt_len = prompt.len(), "Drafting");

        let raw = self.client.stream_text(&prompt, on_chunk).await?;
        let draft = clean_draft(kind, &raw);
        if draft.is_empty() {
            return Err(AiError::InvalidResponseFormat(format!("empty {kind}")));
        }
        Ok(draft)
    }
}

/// User decision on a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftAction {
    /// Use the draft.
    Accept,
    /// Ask for a new draft.
    Regenerate,
    /// Give up.
    Cancel,
}

/// Where a drafting session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftState {
    /// Nothing requested yet.
    Idle,
    /// A draft is waiting for a decision.
    Drafted(String),
    /// The last attempt failed with this message.
    Failed(String),
    /// A new draft was requested.
    Regenerating,
    /// The user took this draft.
    Accepted(String),
    /// The user gave up.
    Cancelled,
}

/// Drives drafting as a loop instead of re-entering the flow.
///
/// ```text
/// Idle ──draft──▶ Drafted ──Accept──▶ Accepted
///   │               │  └────Cancel──▶ Cancelled
///   │               └──Regenerate──▶ Regenerating ──draft──▶ Drafted
///   └──error──▶ Failed ──Regenerate / Cancel
/// ```
#[derive(Debug, Clone)]
pub struct DraftSession {
    state: DraftState,
    attempts: u32,
}

impl Default for DraftSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftSession {
    /// Starts in [`DraftState::Idle`].
    pub fn new() -> Self {
        Self {
            state: DraftState::Idle,
            attempts: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> &DraftState {
        &self.state
    }

    /// Number of drafting attempts recorded so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the caller should request a draft now.
    pub fn needs_draft(&self) -> bool {
        matches!(self.state, DraftState::Idle | DraftState::Regenerating)
    }

    /// Whether the session reached a final state.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, DraftState::Accepted(_) | DraftState::Cancelled)
    }

    /// The draft awaiting a decision, if any.
    pub fn current_draft(&self) -> Option<&str> {
        match &self.state {
            DraftState::Drafted(text) => Some(text),
            _ => None,
        }
    }

    /// Records the outcome of a drafting attempt.
    ///
    /// Ignored unless [`needs_draft`](Self::needs_draft) holds.
    pub fn record(&mut self, outcome: Result<String, AiError>) {
        if !self.needs_draft() {
            debug!(state = ?self.state, "Ignoring draft outside of a request");
            return;
        }
        self.attempts += 1;
        self.state = match outcome {
            Ok(text) => DraftState::Drafted(text),
            Err(e) => DraftState::Failed(e.to_string()),
        };
    }

    /// Applies a decision. Returns `false` when it is not valid in the
    /// current state, which is then left unchanged.
    pub fn apply(&mut self, action: DraftAction) -> bool {
        let next = match (&mut self.state, action) {
            (DraftState::Drafted(text), DraftAction::Accept) => {
                DraftState::Accepted(mem::take(text))
            }
            (DraftState::Drafted(_) | DraftState::Failed(_), DraftAction::Regenerate) => {
                DraftState::Regenerating
            }
            (DraftState::Drafted(_) | DraftState::Failed(_), DraftAction::Cancel) => {
                DraftState::Cancelled
            }
            _ => return false,
        };
        self.state = next;
        true
    }

    /// Consumes the session, returning the accepted draft.
    pub fn into_accepted(self) -> Option<String> {
        match self.state {
            DraftState::Accepted(text) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use super::*;

    struct CannedClient {
        reply: Result<&'static str, &'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedClient {
        fn replying(reply: &'static str) -> Self {
            Self {
                reply: Ok(reply),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl AiClient for CannedClient {
        fn stream_text<'a>(
            &'a self,
            prompt: &'a str,
            on_chunk: ChunkSink<'a>,
        ) -> Pin<Box<dyn Future<Output = Result<String, AiError>> + Send + 'a>> {
            Box::pin(async move {
                self.prompts.lock().unwrap().push(prompt.to_string());
                let reply = self
                    .reply
                    .map_err(|e| AiError::ApiRequestFailed(e.to_string()))?;
                for word in reply.split_inclusive(' ') {
                    on_chunk(word);
                }
                Ok(reply.to_string())
            })
        }

        fn list_models(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AiError>> + Send + '_>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn commit_drafts_lose_fences() {
        let raw = "```text\nfeat(ui): add button\n\n- new button\n```\n";
        assert_eq!(
            clean_draft(DraftKind::Commit, raw),
            "feat(ui): add button\n\n- new button"
        );
        assert_eq!(clean_draft(DraftKind::Commit, "  fix: typo \n"), "fix: typo");
    }

    #[test]
    fn branch_drafts_keep_first_line() {
        assert_eq!(
            clean_draft(DraftKind::Branch, "\n`feat/user-login`\nBecause the diff adds login."),
            "feat/user-login"
        );
        assert_eq!(clean_draft(DraftKind::Branch, "```\nfix/crash\n```"), "fix/crash");
        assert_eq!(clean_draft(DraftKind::Branch, "   "), "");
    }

    #[tokio::test]
    async fn draft_streams_and_cleans() {
        let client = CannedClient::replying("`fix/login-error` ");
        let prefs = Preferences::from_json(r#"{"promptLanguage":"en"}"#);
        let service = DraftService::new(&client, &prefs);

        let mut streamed = String::new();
        let mut sink = |chunk: &str| streamed.push_str(chunk);
        let name = service
            .draft(DraftKind::Branch, "+fn login() {}", &mut sink)
            .await
            .unwrap();

        assert_eq!(name, "fix/login-error");
        assert_eq!(streamed, "`fix/login-error` ");
        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("Suggest a git branch name"));
        assert!(prompts[0].ends_with("+fn login() {}"));
    }

    #[tokio::test]
    async fn empty_diff_is_rejected_without_a_request() {
        let client = CannedClient::replying("unused");
        let prefs = Preferences::default();
        let service = DraftService::new(&client, &prefs);

        let mut sink = |_: &str| {};
        let err = service.draft(DraftKind::Commit, " \n", &mut sink).await;
        assert!(matches!(err, Err(AiError::EmptyDiff)));
        assert!(client.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn service_errors_propagate() {
        let client = CannedClient {
            reply: Err("HTTP 500"),
            prompts: Mutex::new(Vec::new()),
        };
        let prefs = Preferences::default();
        let service = DraftService::new(&client, &prefs);

        let mut sink = |_: &str| {};
        let err = service.draft(DraftKind::Commit, "+x", &mut sink).await;
        assert!(matches!(err, Err(AiError::ApiRequestFailed(_))));
    }

    #[tokio::test]
    async fn blank_reply_is_invalid() {
        let client = CannedClient::replying("```\n```");
        let prefs = Preferences::default();
        let service = DraftService::new(&client, &prefs);

        let mut sink = |_: &str| {};
        let err = service.draft(DraftKind::Commit, "+x", &mut sink).await;
        assert!(matches!(err, Err(AiError::InvalidResponseFormat(_))));
    }

    #[test]
    fn session_regenerates_then_accepts() {
        let mut session = DraftSession::new();
        assert!(session.needs_draft());

        session.record(Ok("first".into()));
        assert_eq!(session.current_draft(), Some("first"));
        assert!(session.apply(DraftAction::Regenerate));
        assert_eq!(session.state(), &DraftState::Regenerating);

        session.record(Ok("second".into()));
        assert!(session.apply(DraftAction::Accept));
        assert!(session.is_finished());
        assert_eq!(session.attempts(), 2);
        assert_eq!(session.into_accepted().as_deref(), Some("second"));
    }

    #[test]
    fn failed_attempt_allows_retry_but_not_accept() {
        let mut session = DraftSession::new();
        session.record(Err(AiError::Timeout));
        assert!(matches!(session.state(), DraftState::Failed(_)));

        assert!(!session.apply(DraftAction::Accept));
        assert!(session.apply(DraftAction::Regenerate));
        assert!(session.needs_draft());
    }

    #[test]
    fn cancel_is_final() {
        let mut session = DraftSession::new();
        session.record(Ok("draft".into()));
        assert!(session.apply(DraftAction::Cancel));
        assert!(session.is_finished());

        assert!(!session.apply(DraftAction::Regenerate));
        session.record(Ok("late".into()));
        assert_eq!(session.state(), &DraftState::Cancelled);
        assert_eq!(session.into_accepted(), None);
    }

    #[test]
    fn decisions_need_a_draft() {
        let mut session = DraftSession::new();
        assert!(!session.apply(DraftAction::Accept));
        assert!(!session.apply(DraftAction::Cancel));
        assert_eq!(session.state(), &DraftState::Idle);
    }
}
