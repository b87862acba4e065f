pub mod handlers;
pub mod models;
pub mod proxy;
pub mod routes;
pub mod serverless;

use actix_cors::Cors;

// Any origin may call the relay; the widget can be served from another host
pub const ALLOWED_METHODS: [&str; 2] = ["POST", "OPTIONS"];

pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods(ALLOWED_METHODS)
        .allow_any_header()
}
