//! Chat session behaviour against scripted, hanging, in-process and
//! unreachable transports.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::http::Method;
use async_trait::async_trait;

use nurture_chat::client::{
    delivery_from_response, ChatSession, ChatTransport, Delivery, HttpTransport, PromptStyle,
    TransportError,
};
use nurture_chat::fallback;
use nurture_chat::model::{Completion, CompletionProvider, CompletionRequest, ModelError};
use nurture_chat::web::models::{ChatRequest, Role};
use nurture_chat::web::proxy::{self, ProxyDefaults};

struct ScriptedTransport {
    replies: Mutex<VecDeque<Delivery>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Delivery>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send(&self, request: &ChatRequest) -> Delivery {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Delivery::NoReply)
    }
}

struct HangingTransport;

#[async_trait]
impl ChatTransport for HangingTransport {
    async fn send(&self, _request: &ChatRequest) -> Delivery {
        std::future::pending().await
    }
}

// Runs the real proxy logic in-process over a provider whose network is down
struct OfflineProvider;

#[async_trait]
impl CompletionProvider for OfflineProvider {
    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, ModelError> {
        Err(ModelError::Status {
            status: 502,
            body: "connection reset by peer".into(),
        })
    }
}

struct InProcessTransport {
    provider: Arc<dyn CompletionProvider>,
}

#[async_trait]
impl ChatTransport for InProcessTransport {
    async fn send(&self, request: &ChatRequest) -> Delivery {
        let body = serde_json::to_vec(request).unwrap();
        let defaults = ProxyDefaults {
            model: "llama-3.1-8b-instant".into(),
            temperature: 0.3,
        };
        let reply = proxy::dispatch(self.provider.as_ref(), &defaults, &Method::POST, &body).await;
        let text = reply
            .body
            .map(|b| serde_json::to_string(&b).unwrap())
            .unwrap_or_default();
        delivery_from_response(reply.status.as_u16(), &text)
    }
}

#[tokio::test]
async fn blank_submissions_send_nothing() {
    let transport = ScriptedTransport::new(vec![]);
    let mut session = ChatSession::new(PromptStyle::None);

    for text in ["", "   ", "\n\t "] {
        assert!(!session.submit(text, &transport).await);
    }
    session.set_input("  ");
    assert!(!session.send_input(&transport).await);

    assert!(session.messages().is_empty());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn successful_rounds_alternate_user_and_assistant() {
    let rounds = 4;
    let transport = ScriptedTransport::new(
        (0..rounds)
            .map(|i| Delivery::Reply(format!("reply {i}")))
            .collect(),
    );
    let mut session = ChatSession::new(PromptStyle::TopLevel("Be supportive.".into()));

    for i in 0..rounds {
        assert!(session.submit(&format!("message {i}"), &transport).await);
    }

    let messages = session.messages();
    assert_eq!(messages.len(), 2 * rounds);
    for (i, pair) in messages.chunks(2).enumerate() {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[0].content, format!("message {i}"));
        assert_eq!(pair[1].role, Role::Assistant);
        assert_eq!(pair[1].content, format!("reply {i}"));
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    assert!(!session.is_pending());

    let requests = transport.requests();
    assert_eq!(requests.len(), rounds);
    assert!(requests
        .iter()
        .all(|r| r.system.as_deref() == Some("Be supportive.")));
    // each request carries the history up to and including the new user turn
    assert_eq!(requests[2].messages.len(), 5);
}

#[tokio::test]
async fn failed_delivery_answers_from_fallback() {
    let transport = ScriptedTransport::new(vec![Delivery::Failed(TransportError::Status(500))]);
    let mut session = ChatSession::new(PromptStyle::None);

    session.submit("What should I eat this week?", &transport).await;

    let last = session.messages().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, fallback::respond("What should I eat this week?"));
    assert!(!session.is_pending());
}

#[tokio::test]
async fn hung_request_times_out_into_fallback() {
    let mut session =
        ChatSession::new(PromptStyle::None).with_timeout(Duration::from_millis(50));

    assert!(session.submit("I feel so anxious", &HangingTransport).await);

    let last = session.messages().last().unwrap();
    assert_eq!(last.content, fallback::respond("I feel so anxious"));
    assert!(!session.is_pending());
}

#[tokio::test]
async fn unreachable_proxy_still_gets_sleep_advice() {
    // nothing listens on port 1, so the connection is refused
    let transport = HttpTransport::new("http://127.0.0.1:1");
    let mut session = ChatSession::new(PromptStyle::None).with_timeout(Duration::from_secs(5));

    session.submit("I'm feeling tired", &transport).await;

    let last = session.messages().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert!(!last.content.is_empty());
    assert!(last.content.to_lowercase().contains("sleep"));
    assert!(!last.content.contains("error"));
}

#[tokio::test]
async fn upstream_outage_behind_the_proxy_routes_to_fallback() {
    let transport = InProcessTransport {
        provider: Arc::new(OfflineProvider),
    };
    let mut session = ChatSession::new(PromptStyle::Embedded("You are a wellness guide.".into()));

    session.submit("I'm feeling tired", &transport).await;

    let last = session.messages().last().unwrap();
    assert_eq!(last.content, fallback::RULES[0].reply);
    assert!(!last.content.contains("502"));
}

#[tokio::test]
async fn pending_disables_send_until_resolved() {
    let mut session = ChatSession::new(PromptStyle::None);
    session.open();

    let request = session.begin_submit("A").unwrap();
    assert_eq!(request.messages.len(), 1);

    session.set_input("B");
    assert!(session.is_pending());
    assert!(!session.can_send());
    assert!(session.begin_submit("B").is_none());

    let transport = ScriptedTransport::new(vec![Delivery::Reply("Answer to A".into())]);
    let delivery = transport.send(&request).await;
    session.resolve(delivery);

    assert!(!session.is_pending());
    assert!(session.can_send());
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[1].content, "Answer to A");
}
