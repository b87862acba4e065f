use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ProxySettings;
use crate::web::models::Message;

// Fixed sampling parameters for every upstream call
pub const MAX_TOKENS: u32 = 1024;
pub const TOP_P: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
}

// Provider answer once the HTTP exchange itself succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Text(String),
    // completion shape, but no usable content
    Empty,
    Malformed,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ModelError>;
}

// Client for Groq's OpenAI-compatible chat completions API
pub struct GroqModel {
    base_url: String,
    api_key: String,
    client: Client,
}

#[derive(Serialize)]
struct UpstreamPayload<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct UpstreamBody {
    choices: Vec<UpstreamChoice>,
}

#[derive(Deserialize)]
struct UpstreamChoice {
    message: Option<UpstreamMessage>,
}

#[derive(Deserialize)]
struct UpstreamMessage {
    content: Option<String>,
}

impl GroqModel {
    pub fn new(settings: &ProxySettings) -> Result<Self, ModelError> {
        info!("Initializing Groq client for {}", settings.base_url);

        let client = Client::builder()
            .timeout(settings.upstream_timeout)
            .build()?;

        Ok(Self {
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            client,
        })
    }
}

#[async_trait]
impl CompletionProvider for GroqModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);

        let payload = UpstreamPayload {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
            stream: false,
        };

        info!(
            "Sending {} messages to {} (temperature: {})",
            request.messages.len(),
            request.model,
            request.temperature
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Upstream rejected completion with {}", status);
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Response body: {}", body);
        Ok(parse_completion(&body))
    }
}

pub fn parse_completion(body: &str) -> Completion {
    let parsed = match serde_json::from_str::<UpstreamBody>(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Unexpected completion body: {}", e);
            return Completion::Malformed;
        }
    };

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content);

    match content {
        Some(text) if !text.trim().is_empty() => Completion::Text(text),
        _ => Completion::Empty,
    }
}
