use actix_cors::Cors;
use actix_web::http::{header, Method};

use crate::settings::AppConfig;

/// CORS layer for the form endpoints. A `*` entry allows any origin.
///
/// Preflights fall through to the per-resource OPTIONS route, which answers
/// 200 with the allowed methods and headers; this layer adds the origin headers.
pub fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .disable_preflight()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers(vec![
            header::RETRY_AFTER,
            header::HeaderName::from_static("x-ratelimit-remaining"),
        ])
        .max_age(3600);

    for origin in config.cors_origins() {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            tracing::info!("Adding allowed origin: {}", origin);
            cors = cors.allowed_origin(&origin);
        }
    }

    cors
}
