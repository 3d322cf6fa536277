//! Google Gemini API client.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use url::Url;

use super::{AiClient, AiError, ChunkSink};

/// Public Gemini endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variable overriding [`DEFAULT_BASE_URL`].
pub const BASE_URL_ENV: &str = "QKPR_GEMINI_BASE_URL";

/// HTTP timeout applied to every request.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const API_VERSION: &str = "v1beta";
const GENERATE_METHOD: &str = "generateContent";

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

/// One `data:` payload of the streaming endpoint.
#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ErrorBody>,
}

impl StreamChunk {
    fn into_text(self) -> Result<String, AiError> {
        if let Some(error) = self.error {
            return Err(AiError::ApiRequestFailed(match error.code {
                Some(code) => format!("{code}: {}", error.message),
                None => error.message,
            }));
        }

        Ok(self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Splits a server-sent event stream into text fragments.
///
/// Input arrives in arbitrary byte chunks, so partial lines are buffered
/// until their newline shows up.
#[derive(Debug, Default)]
pub struct SseTextDecoder {
    buffer: Vec<u8>,
}

impl SseTextDecoder {
    /// Feeds raw bytes, returning the text of every completed event.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<String>, AiError> {
        self.buffer.extend_from_slice(bytes);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(text) = decode_line(&line)? {
                fragments.push(text);
            }
        }
        Ok(fragments)
    }

    /// Flushes a trailing event that was not newline-terminated.
    pub fn finish(&mut self) -> Result<Option<String>, AiError> {
        let line = std::mem::take(&mut self.buffer);
        decode_line(&line)
    }
}

fn decode_line(line: &[u8]) -> Result<Option<String>, AiError> {
    let line = std::str::from_utf8(line)
        .map_err(|e| AiError::InvalidResponseFormat(format!("invalid UTF-8: {e}")))?
        .trim();

    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }

    trace!(payload_len = payload.len(), "decoding stream event");
    let chunk: StreamChunk = serde_json::from_str(payload)
        .map_err(|e| AiError::InvalidResponseFormat(e.to_string()))?;
    let text = chunk.into_text()?;
    Ok((!text.is_empty()).then_some(text))
}

/// Gemini API client.
pub struct GeminiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Creates a client for the default endpoint, or the one named by
    /// [`BASE_URL_ENV`].
    pub fn new(api_key: String, model: String) -> Result<Self, AiError> {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(&base_url, api_key, model)
    }

    /// Creates a client for an explicit endpoint.
    pub fn with_base_url(base_url: &str, api_key: String, model: String) -> Result<Self, AiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AiError::InvalidEndpoint(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AiError::InvalidEndpoint(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AiError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model: model.trim_start_matches("models/").to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AiError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .push(API_VERSION)
            .extend(segments);
        Ok(url)
    }

    fn stream_url(&self) -> Result<Url, AiError> {
        let method = format!("{}:streamGenerateContent", self.model);
        let mut url = self.endpoint(&["models", &method])?;
        url.query_pairs_mut().append_pair("alt", "sse");
        Ok(url)
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_else(|e| {
            debug!("Failed to read error response body: {e}");
            String::new()
        });
        Err(AiError::ApiRequestFailed(format!("HTTP {status}: {body}")))
    }
}

impl AiClient for GeminiClient {
    fn stream_text<'a>(
        &'a self,
        prompt: &'a str,
        on_chunk: ChunkSink<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, AiError>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.stream_url()?;
            let request = GenerateRequest {
                contents: [RequestContent {
                    role: "user",
                    parts: [RequestPart { text: prompt }],
                }],
            };

            info!(model = %self.model, prompt_len = prompt.len(), "Sending streaming request to Gemini API");

            let response = self
                .client
                .post(url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request)
                .send()
                .await?;
            let response = Self::ensure_success(response).await?;

            let mut decoder = SseTextDecoder::default();
            let mut text = String::new();
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                for fragment in decoder.feed(&chunk?)? {
                    on_chunk(&fragment);
                    text.push_str(&fragment);
                }
            }
            if let Some(fragment) = decoder.finish()? {
                on_chunk(&fragment);
                text.push_str(&fragment);
            }

            debug!(response_len = text.len(), "Gemini stream finished");
            Ok(text)
        })
    }

    fn list_models(&self) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AiError>> + Send + '_>> {
        Box::pin(async move {
            let url = self.endpoint(&["models"])?;
            debug!(url = %url, "Fetching Gemini model list");

            let response = self
                .client
                .get(url)
                .header("x-goog-api-key", &self.api_key)
                .send()
                .await?;
            let response = Self::ensure_success(response).await?;

            let listing: ModelsResponse = response
                .json()
                .await
                .map_err(|e| AiError::InvalidResponseFormat(e.to_string()))?;

            Ok(listing
                .models
                .into_iter()
                .filter(|m| m.supported_generation_methods.iter().any(|g| g == GENERATE_METHOD))
                .map(|m| m.name.trim_start_matches("models/").to_string())
                .collect())
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
