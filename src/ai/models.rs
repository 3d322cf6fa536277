//! Model listing with an explicit fallback.

use tracing::{debug, warn};

use super::AiClient;

/// Models offered when the live list is unavailable.
pub const FALLBACK_MODELS: &[&str] = &[
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
];

/// Result of asking the service for its models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelListing {
    /// Live list from the service.
    Fetched(Vec<String>),
    /// Built-in list, with the reason the live one was not used.
    Fallback {
        /// Models from [`FALLBACK_MODELS`].
        models: Vec<String>,
        /// Human-readable cause.
        reason: String,
    },
}

impl ModelListing {
    /// Builds the fallback variant.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self::Fallback {
            models: FALLBACK_MODELS.iter().map(|m| (*m).to_string()).collect(),
            reason: reason.into(),
        }
    }

    /// Models to choose from, whichever variant.
    pub fn models(&self) -> &[String] {
        match self {
            Self::Fetched(models) | Self::Fallback { models, .. } => models,
        }
    }

    /// Checks whether the built-in list is in use.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Fetches the model list, degrading to [`FALLBACK_MODELS`] on any failure.
///
/// `client` is `None` when no API key is configured.
pub async fn list_models(client: Option<&dyn AiClient>) -> ModelListing {
    let Some(client) = client else {
        return ModelListing::fallback("no API key configured");
    };

    match client.list_models().await {
        Ok(models) if !models.is_empty() => {
            debug!(count = models.len(), "Fetched model list");
            ModelListing::Fetched(models)
        }
        Ok(_) => {
            warn!("Model list was empty, using built-in list");
            ModelListing::fallback("the service returned no models")
        }
        Err(e) => {
            warn!(error = %e, "Could not fetch model list, using built-in list");
            ModelListing::fallback(e.to_string())
        }
    }
}
