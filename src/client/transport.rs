use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::config::ClientSettings;
use crate::web::models::ChatRequest;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("proxy answered with status {0}")]
    Status(u16),
    #[error("proxy response was not a JSON object")]
    Malformed,
    #[error("no response within {0:?}")]
    TimedOut(Duration),
}

// Outcome of one round trip to the chat proxy
#[derive(Debug)]
pub enum Delivery {
    Reply(String),
    // success status without a usable reply
    NoReply,
    Failed(TransportError),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Delivery;
}

pub fn delivery_from_response(status: u16, body: &str) -> Delivery {
    if !(200..300).contains(&status) {
        return Delivery::Failed(TransportError::Status(status));
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(value @ Value::Object(_)) => value,
        _ => return Delivery::Failed(TransportError::Malformed),
    };

    match value.get("reply") {
        Some(Value::String(reply)) if !reply.trim().is_empty() => Delivery::Reply(reply.clone()),
        None | Some(Value::Null) | Some(Value::String(_)) => Delivery::NoReply,
        // a reply of the wrong type is a broken body, not an empty answer
        Some(_) => Delivery::Failed(TransportError::Malformed),
    }
}

// Posts transcripts to a deployed `/api/chat`
pub struct HttpTransport {
    endpoint: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(api_base: &str) -> Self {
        Self {
            endpoint: format!("{}/api/chat", api_base.trim_end_matches('/')),
            client: Client::new(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(&settings.api_base)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, request: &ChatRequest) -> Result<(u16, String), reqwest::Error> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Delivery {
        debug!("Posting {} messages to {}", request.messages.len(), self.endpoint);
        match self.post(request).await {
            Ok((status, body)) => delivery_from_response(status, &body),
            Err(e) => Delivery::Failed(TransportError::Http(e)),
        }
    }
}
