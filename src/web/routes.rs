use actix_web::web;
use crate::web::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // every method reaches the handler so it can answer preflight and 405 itself
            .route("/chat", web::route().to(handlers::chat))
    )
    .route("/health", web::get().to(handlers::health_check));
}
