use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use shopguide_core::config::LlmConfig;
use shopguide_core::domain::chat::ChatMessage;
use shopguide_core::GuideError;

/// One model call: the freshly built system prompt plus the full ordered
/// transcript. The transcript is replayed verbatim; the system prompt is
/// rebuilt from current snapshots and never stored.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub transcript: Vec<ChatMessage>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, GuideError>;
}

/// Chat-completions client for the hosted model gateway.
pub struct GatewayChatClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GatewayChatClient {
    /// Fails with [`GuideError::Configuration`] when no credential is
    /// configured, so a misconfigured deployment surfaces before the first
    /// request instead of as an opaque upstream failure.
    pub fn from_config(config: &LlmConfig) -> Result<Self, GuideError> {
        if !config.has_api_key() {
            return Err(GuideError::Configuration(
                "no model gateway API key configured".to_string(),
            ));
        }
        let api_key = match config.api_key.clone() {
            Some(key) => key,
            None => {
                return Err(GuideError::Configuration(
                    "no model gateway API key configured".to_string(),
                ))
            }
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| {
                GuideError::Configuration(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait]
impl ChatClient for GatewayChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, GuideError> {
        let mut messages = Vec::with_capacity(request.transcript.len() + 1);
        messages.push(WireMessage { role: "system", content: &request.system_prompt });
        for message in &request.transcript {
            messages.push(WireMessage {
                role: message.role.as_str(),
                content: &message.content,
            });
        }

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&CompletionRequest { model: &self.model, messages })
            .send()
            .await
            .map_err(|error| {
                GuideError::Upstream(format!("model gateway request failed: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                event_name = "guide.gateway_error",
                %status,
                body = body.chars().take(200).collect::<String>(),
                "model gateway returned non-success status"
            );
            return Err(GuideError::Upstream(format!(
                "model gateway returned {status}"
            )));
        }

        let payload: CompletionResponse = response.json().await.map_err(|error| {
            GuideError::Upstream(format!("undecodable model gateway response: {error}"))
        })?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                GuideError::Upstream("model gateway response had no choices".to_string())
            })
    }
}
