pub mod client;
pub mod config;
pub mod fallback;
pub mod model;
pub mod web;

use std::sync::Arc;

use model::CompletionProvider;
use web::proxy::ProxyDefaults;

// State shared by every request handler
pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
    pub defaults: ProxyDefaults,
}

impl AppState {
    pub fn new(provider: Arc<dyn CompletionProvider>, defaults: ProxyDefaults) -> Self {
        Self { provider, defaults }
    }
}
