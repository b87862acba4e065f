use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

use crate::web::proxy;
use crate::AppState;

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Chat API endpoint, a thin adapter over the shared proxy logic
pub async fn chat(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let reply = proxy::dispatch(data.provider.as_ref(), &data.defaults, req.method(), &body).await;

    let mut response = HttpResponse::build(reply.status);
    match reply.body {
        Some(body) => response.json(body),
        None => response.finish(),
    }
}
