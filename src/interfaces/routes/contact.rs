use actix_web::{http::Method, web};

use crate::{
    handlers::{contact, system},
    middlewares::rate_limit::RateLimit,
};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/contact")
            .wrap(RateLimit)
            .route(web::post().to(contact::submit_contact))
            .route(web::method(Method::OPTIONS).to(system::preflight))
            .default_service(web::to(system::method_not_allowed)),
    );
}
