use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::{
    app_state::AppState,
    models::dto::{HealthResponse, ServiceInfoResponse},
};

const SERVICE_NAME: &str = "Data Science Quiz Solver";

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        email: state.config.student_email.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[get("/")]
pub async fn service_info(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ServiceInfoResponse {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        student: state.config.student_email.clone(),
        endpoints: json!({
            "POST /": "Submit quiz request",
            "GET /health": "Health check"
        }),
    })
}
