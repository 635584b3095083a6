pub mod health_handler;
pub mod quiz_handler;

use actix_web::web;

pub use health_handler::{health_check, service_info};
pub use quiz_handler::trigger_quiz;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(service_info)
        .service(trigger_quiz);
}
