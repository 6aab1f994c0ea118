use actix_web::web;

use crate::handlers::system::health_check;

mod appointment;
mod contact;
mod json_error;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check);

    cfg.service(
        web::scope("/api")
            .configure(appointment::config_routes)
            .configure(contact::config_routes)
    );

    cfg.configure(json_error::config_routes);
}
