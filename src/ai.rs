//! Drafting commit messages and branch names with a generation service.

pub mod draft;
pub mod error;
pub mod gemini;
pub mod models;
pub mod prompts;

use std::future::Future;
use std::pin::Pin;

pub use draft::{clean_draft, DraftAction, DraftKind, DraftService, DraftSession, DraftState};
pub use error::AiError;
pub use gemini::GeminiClient;
pub use models::{list_models, ModelListing, FALLBACK_MODELS};
pub use prompts::{build_prompt, PromptMode};

/// Callback receiving each text fragment as it arrives.
pub type ChunkSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Trait for text generation backends.
pub trait AiClient: Send + Sync {
    /// Sends `prompt` and streams the reply, passing every fragment to
    /// `on_chunk`. Resolves to the concatenated reply.
    fn stream_text<'a>(
        &'a self,
        prompt: &'a str,
        on_chunk: ChunkSink<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, AiError>> + Send + 'a>>;

    /// Lists model identifiers usable for generation.
    fn list_models(&self) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AiError>> + Send + '_>>;

    /// Model used by [`AiClient::stream_text`].
    fn model(&self) -> &str;
}
