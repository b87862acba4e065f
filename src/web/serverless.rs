// Function-style entry point for hosts that invoke the relay once per request

use std::collections::BTreeMap;

use actix_web::http::Method;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::model::CompletionProvider;
use crate::web::proxy::{self, ProxyDefaults, ProxyReply};
use crate::web::ALLOWED_METHODS;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEvent {
    pub http_method: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

// Same policy the actix server applies through actix-cors
pub fn cors_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ("Access-Control-Allow-Methods".to_string(), ALLOWED_METHODS.join(", ")),
        ("Access-Control-Allow-Headers".to_string(), "*".to_string()),
    ])
}

pub async fn invoke(
    provider: &dyn CompletionProvider,
    defaults: &ProxyDefaults,
    event: InvocationEvent,
) -> InvocationResult {
    let reply = match Method::from_bytes(event.http_method.to_ascii_uppercase().as_bytes()) {
        Ok(method) => {
            let body = event.body.unwrap_or_default();
            proxy::dispatch(provider, defaults, &method, body.as_bytes()).await
        }
        Err(_) => {
            warn!("Unparseable method {:?} in invocation", event.http_method);
            ProxyReply::method_not_allowed()
        }
    };

    let mut headers = cors_headers();
    let body = match reply.body {
        Some(body) => {
            headers.insert("Content-Type".into(), "application/json".into());
            serde_json::to_string(&body).unwrap_or_default()
        }
        None => String::new(),
    };

    InvocationResult {
        status_code: reply.status.as_u16(),
        headers,
        body,
    }
}
