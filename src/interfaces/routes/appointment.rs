use actix_web::{http::Method, web};

use crate::{
    handlers::{appointment, system},
    middlewares::rate_limit::RateLimit,
};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/appointment")
            .service(
                web::resource("/verify")
                    .wrap(RateLimit)
                    .route(web::post().to(appointment::issue_verification))
                    .route(web::method(Method::OPTIONS).to(system::preflight))
                    .default_service(web::to(system::method_not_allowed)),
            )
            .service(
                web::resource("/verify/confirm")
                    .route(web::post().to(appointment::confirm_verification))
                    .route(web::method(Method::OPTIONS).to(system::preflight))
                    .default_service(web::to(system::method_not_allowed)),
            )
            .service(
                web::resource("/book")
                    .route(web::post().to(appointment::book_appointment))
                    .route(web::method(Method::OPTIONS).to(system::preflight))
                    .default_service(web::to(system::method_not_allowed)),
            ),
    );
}
