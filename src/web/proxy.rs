use actix_web::http::{Method, StatusCode};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ProxySettings;
use crate::model::{Completion, CompletionProvider, CompletionRequest};
use crate::web::models::{ChatRequest, ChatResponse, ErrorResponse, Message, Role};

// Sent upstream when the caller supplied no conversation at all
pub const DEFAULT_USER_TURN: &str = "Hello";

#[derive(Debug, Clone)]
pub struct ProxyDefaults {
    pub model: String,
    pub temperature: f32,
}

impl From<&ProxySettings> for ProxyDefaults {
    fn from(settings: &ProxySettings) -> Self {
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Request body is not valid JSON")]
    InvalidJson,
    #[error("Missing or invalid messages array")]
    MissingMessages,
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProxyBody {
    Reply(ChatResponse),
    Error(ErrorResponse),
}

#[derive(Debug, Clone)]
pub struct ProxyReply {
    pub status: StatusCode,
    // None for bodiless answers such as the preflight
    pub body: Option<ProxyBody>,
}

impl ProxyReply {
    fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    fn reply(reply: String) -> Self {
        Self {
            status: StatusCode::OK,
            body: Some(ProxyBody::Reply(ChatResponse { reply })),
        }
    }

    fn error(status: StatusCode, error: ErrorResponse) -> Self {
        Self {
            status,
            body: Some(ProxyBody::Error(error)),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self::error(
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorResponse::new("Method not allowed"),
        )
    }
}

// Host-independent POST /api/chat; adapters only translate the ProxyReply
pub async fn dispatch(
    provider: &dyn CompletionProvider,
    defaults: &ProxyDefaults,
    method: &Method,
    body: &[u8],
) -> ProxyReply {
    if method == Method::OPTIONS {
        return ProxyReply::empty(StatusCode::OK);
    }
    if method != Method::POST {
        warn!("Rejected {} request to chat endpoint", method);
        return ProxyReply::method_not_allowed();
    }

    let request = match parse_request(body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected chat request: {}", e);
            return ProxyReply::error(StatusCode::BAD_REQUEST, ErrorResponse::new(e.to_string()));
        }
    };

    let completion_request = build_completion_request(request, defaults);
    info!(
        "Chat request with {} messages for model {}",
        completion_request.messages.len(),
        completion_request.model
    );

    let failure = match provider.complete(&completion_request).await {
        Ok(Completion::Text(reply)) => return ProxyReply::reply(reply),
        Ok(Completion::Empty) => "upstream returned no content".to_string(),
        Ok(Completion::Malformed) => "upstream response was malformed".to_string(),
        Err(e) => e.to_string(),
    };

    error!("Model error: {}", failure);
    ProxyReply::error(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new("Failed to get a reply from the model").with_details(failure),
    )
}

pub fn parse_request(body: &[u8]) -> Result<ChatRequest, RequestError> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body).map_err(|_| RequestError::InvalidJson)?
    };

    if !value.get("messages").is_some_and(Value::is_array) {
        return Err(RequestError::MissingMessages);
    }

    serde_json::from_value(value).map_err(|e| RequestError::InvalidBody(e.to_string()))
}

pub fn build_completion_request(request: ChatRequest, defaults: &ProxyDefaults) -> CompletionRequest {
    let mut messages = request.messages;
    if messages.is_empty() {
        messages.push(Message::new(Role::User, DEFAULT_USER_TURN));
    }

    if let Some(system) = request.system.filter(|s| !s.trim().is_empty()) {
        messages.insert(0, Message::new(Role::System, system));
    }

    CompletionRequest {
        model: request
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| defaults.model.clone()),
        messages,
        temperature: request.temperature.unwrap_or(defaults.temperature),
    }
}
