use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::gateway::{GatewayResponse, ImageGateway};

pub const GENERATE_PATH: &str = "/api/generate";

/// Reference images arrive base64-encoded inside the JSON body.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Mounts the gateway routes. Expects `web::Data<ImageGateway>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
        .route("/health", web::get().to(health))
        .route(GENERATE_PATH, web::route().to(generate));
}

/// Every method is routed here so that non-POST requests get the gateway's own 405 body.
pub async fn generate(
    req: HttpRequest,
    body: web::Bytes,
    gateway: web::Data<ImageGateway>,
) -> HttpResponse {
    let response = gateway.handle(req.method().as_str(), &body).await;
    into_http_response(response)
}

pub async fn health(gateway: web::Data<ImageGateway>) -> HttpResponse {
    let provider = gateway.provider();
    let configured = provider.check_configuration().is_ok();
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "provider": provider.name(),
        "configured": configured,
    }))
}

pub fn into_http_response(response: GatewayResponse) -> HttpResponse {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(response.body)
}
