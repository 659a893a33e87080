//! OpenAI chat-completions client for batch catalog translation.
//!
//! The whole batch goes out in a single request and comes back as one JSON
//! payload, so a run makes at most one provider call (plus retries).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::analyzer::TranslationRequest;
use crate::config::Config;
use crate::retry::{with_retry_if, RetryConfig};

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// The JSON document the model is instructed to return.
#[derive(Debug, Deserialize)]
struct BatchPayload {
    translations: Vec<TranslationResult>,
}

/// Translations for one key. `translations` keeps the provider's own
/// language order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranslationResult {
    pub key: String,
    #[serde(default)]
    pub translations: IndexMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to send translation request to OpenAI API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("OpenAI API error ({status}): {body}")]
    Api {
        status: u16,
        body: String,
        /// Rate-limit headers present on the failed response.
        rate_limit: Vec<(String, String)>,
    },

    #[error("OpenAI response contained no choices")]
    EmptyResponse,

    #[error("Failed to parse translation payload returned by the model: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    #[error("Failed to encode translation batch: {0}")]
    EncodeRequest(#[source] serde_json::Error),
}

impl ProviderError {
    /// Rate limits, server errors and transport failures are worth another
    /// attempt. Client errors and bad payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::EmptyResponse
            | ProviderError::MalformedPayload(_)
            | ProviderError::EncodeRequest(_) => false,
        }
    }
}

/// Check if a model is a reasoning model (gpt-5*, o1*, o3*, o4*)
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_completion_tokens: u32,
    retry: RetryConfig,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.openai_api_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            max_completion_tokens: config.max_completion_tokens,
            retry: RetryConfig::provider(),
        }
    }

    /// Translate the whole batch in one chat-completions call.
    ///
    /// The response is taken as-is; callers decide what to do about keys or
    /// languages that are missing or unexpected. An empty request list
    /// returns immediately without touching the network.
    pub async fn translate_batch(
        &self,
        requests: &[TranslationRequest],
        source_language: &str,
        extra_instructions: Option<&str>,
    ) -> Result<Vec<TranslationResult>, ProviderError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let chat_request = self.build_chat_request(requests, source_language, extra_instructions)?;
        debug!(
            "Requesting translations for {} keys from {}",
            requests.len(),
            self.model
        );

        let response = with_retry_if(
            &self.retry,
            "OpenAI translation",
            || self.send(&chat_request),
            ProviderError::is_retryable,
        )
        .await?;

        parse_translations(response)
    }

    fn build_chat_request(
        &self,
        requests: &[TranslationRequest],
        source_language: &str,
        extra_instructions: Option<&str>,
    ) -> Result<ChatRequest, ProviderError> {
        let payload =
            serde_json::to_string_pretty(requests).map_err(ProviderError::EncodeRequest)?;
        let user_prompt = format!(
            "Translate these {} strings from {}:\n\n{}",
            requests.len(),
            source_language,
            payload
        );

        let is_reasoning = is_reasoning_model(&self.model);
        Ok(ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_system_prompt(source_language, extra_instructions),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt,
                },
            ],
            max_completion_tokens: if is_reasoning {
                self.max_completion_tokens.max(25_000)
            } else {
                self.max_completion_tokens
            },
            temperature: if is_reasoning { None } else { Some(0.2) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        })
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let rate_limit = rate_limit_headers(response.headers());
            if !rate_limit.is_empty() {
                warn!("Provider rate limit state: {:?}", rate_limit);
            }
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status,
                body,
                rate_limit,
            });
        }

        Ok(response.json::<ChatResponse>().await?)
    }
}

fn build_system_prompt(source_language: &str, extra_instructions: Option<&str>) -> String {
    let mut prompt = format!(
        "You are a professional translator for app user interface strings.\n\
         Translate each entry from {} into every language listed in its targetLanguages.\n\n",
        source_language
    );
    prompt.push_str(
        "## Rules\n\
         - Preserve format specifiers exactly as written: %@, %d, %lld, %1$@, %.2f and similar.\n\
         - Preserve placeholders in braces, HTML tags and markdown markup.\n\
         - Keep product names, trademarks and URLs untranslated.\n\
         - Match the register of short UI copy: concise, no added punctuation.\n\
         - Use each entry's comment as context when present.\n\n\
         ## Output\n\
         Respond with a single JSON object of the form\n\
         {\"translations\": [{\"key\": \"<key>\", \"translations\": {\"<language>\": \"<translated text>\"}}]}\n\
         with one item per input entry covering every requested target language.\n\
         Respond with JSON only.",
    );

    if let Some(extra) = extra_instructions {
        prompt.push_str("\n\n## Additional instructions\n");
        prompt.push_str(extra);
    }

    prompt
}

fn parse_translations(response: ChatResponse) -> Result<Vec<TranslationResult>, ProviderError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or(ProviderError::EmptyResponse)?;

    let payload: BatchPayload = serde_json::from_str(strip_code_fences(&content))
        .map_err(ProviderError::MalformedPayload)?;
    Ok(payload.translations)
}

/// Strip a wrapping markdown code fence, which some models add despite
/// JSON-mode instructions.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Collect rate-limit diagnostics (`x-ratelimit-*`, `retry-after`) from a
/// failed response, sorted for stable logging.
fn rate_limit_headers(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    let mut collected: Vec<(String, String)> = headers
        .iter()
        .filter(|(name, _)| {
            let name = name.as_str();
            name.starts_with("x-ratelimit-") || name == "retry-after"
        })
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or("<non-ascii>").to_string(),
            )
        })
        .collect();
    collected.sort();
    collected
}
