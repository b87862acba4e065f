pub mod transport;

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientSettings;
use crate::fallback;
use crate::web::models::{ChatRequest, Message, Role};

pub use transport::{delivery_from_response, ChatTransport, Delivery, HttpTransport, TransportError};

// Most recent turns forwarded to the proxy; the local transcript keeps everything
pub const HISTORY_LIMIT: usize = 12;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

// How the persona prompt travels to the proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptStyle {
    None,
    // top-level `system` field, prepended by the proxy
    TopLevel(String),
    // messages[0] with the system role
    Embedded(String),
}

// Idle or pending; every user turn is answered by exactly one assistant turn
#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    messages: Vec<ChatMessage>,
    input: String,
    is_open: bool,
    // text of the user turn awaiting an answer
    pending: Option<String>,
    prompt: PromptStyle,
    timeout: Duration,
}

impl ChatSession {
    pub fn new(prompt: PromptStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            input: String::new(),
            is_open: false,
            pending: None,
            prompt,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_settings(prompt: PromptStyle, settings: &ClientSettings) -> Self {
        Self::new(prompt).with_timeout(settings.client_timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn can_send(&self) -> bool {
        !self.is_pending() && !self.input.trim().is_empty()
    }

    pub fn begin_submit(&mut self, text: &str) -> Option<ChatRequest> {
        if text.trim().is_empty() {
            return None;
        }
        if self.is_pending() {
            debug!("Session {} is pending, ignoring submit", self.id);
            return None;
        }

        self.messages.push(ChatMessage::now(Role::User, text));
        self.input.clear();
        self.pending = Some(text.to_string());

        Some(self.outbound_request())
    }

    pub fn resolve(&mut self, delivery: Delivery) -> Option<&ChatMessage> {
        let user_text = self.pending.take()?;

        let content = match delivery {
            Delivery::Reply(reply) => reply,
            Delivery::NoReply => {
                warn!("Session {}: proxy sent no reply", self.id);
                fallback::NO_RESPONSE.to_string()
            }
            Delivery::Failed(e) => {
                warn!("Session {}: chat request failed, answering offline: {}", self.id, e);
                fallback::respond(&user_text).to_string()
            }
        };

        self.messages.push(ChatMessage::now(Role::Assistant, content));
        self.messages.last()
    }

    // false when nothing was submitted
    pub async fn submit<T>(&mut self, text: &str, transport: &T) -> bool
    where
        T: ChatTransport + ?Sized,
    {
        let Some(request) = self.begin_submit(text) else {
            return false;
        };

        info!("Session {} sending {} messages", self.id, request.messages.len());
        let delivery = match tokio::time::timeout(self.timeout, transport.send(&request)).await {
            Ok(delivery) => delivery,
            Err(_) => Delivery::Failed(TransportError::TimedOut(self.timeout)),
        };

        self.resolve(delivery);
        true
    }

    pub async fn send_input<T>(&mut self, transport: &T) -> bool
    where
        T: ChatTransport + ?Sized,
    {
        let text = self.input.clone();
        self.submit(&text, transport).await
    }

    fn outbound_request(&self) -> ChatRequest {
        let start = self.messages.len().saturating_sub(HISTORY_LIMIT);
        let mut messages: Vec<Message> = self.messages[start..]
            .iter()
            .map(|m| Message::new(m.role, m.content.clone()))
            .collect();

        let system = match &self.prompt {
            PromptStyle::None => None,
            PromptStyle::TopLevel(prompt) => Some(prompt.clone()),
            PromptStyle::Embedded(prompt) => {
                messages.insert(0, Message::new(Role::System, prompt.clone()));
                None
            }
        };

        ChatRequest {
            messages,
            model: None,
            system,
            temperature: None,
        }
    }
}
