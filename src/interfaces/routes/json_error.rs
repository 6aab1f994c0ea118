use actix_web::web;

use crate::handlers::json_error::JsonError;

/// Request bodies above this size are rejected before deserialization.
const JSON_LIMIT_BYTES: usize = 16 * 1024;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT_BYTES)
            .error_handler(|err, _req| JsonError::from(err).into()),
    );
}
