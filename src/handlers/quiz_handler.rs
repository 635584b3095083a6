use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    middleware::get_request_id,
    models::dto::{QuizAcceptedResponse, QuizTriggerRequest},
};

/// Accepts a quiz trigger and solves the chain in the background. The body
/// is taken raw so malformed JSON maps to our own 400 response.
#[post("/")]
pub async fn trigger_quiz(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let received_at = Utc::now();
    log::info!("New quiz request received at {}", received_at.to_rfc3339());

    let request: QuizTriggerRequest = serde_json::from_slice(&body).inspect_err(|e| {
        log::error!("Invalid quiz request payload: {}", e);
    })?;

    let credentials = state.config.credentials();
    if !credentials.secret_matches(&request.secret) {
        log::error!("Invalid secret provided for {}", request.email);
        return Err(AppError::Forbidden("Invalid secret".to_string()));
    }
    log::info!("Secret validated for {}", request.email);

    request.validate().inspect_err(|e| {
        log::error!("Quiz request failed validation: {}", e);
    })?;

    if request.email != credentials.email {
        log::warn!(
            "Email mismatch: received '{}', expected '{}'",
            request.email,
            credentials.email
        );
    }

    let chain_id = get_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());
    let controller = state.sequence_controller(chain_id.clone());
    let quiz_url = request.url.clone();
    tokio::spawn(async move {
        log::info!("[{}] Background quiz solving started", chain_id);
        controller.solve_sequence(&quiz_url, received_at).await;
        log::info!("[{}] Background quiz solving finished", chain_id);
    });

    log::info!("Quiz solving started in background for {}", request.url);
    Ok(HttpResponse::Ok().json(QuizAcceptedResponse::new(request.email, request.url)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::idle_state;
    use crate::middleware::{RequestIdMiddleware, REQUEST_ID_HEADER};
    use crate::test_utils::test_helpers::{assert_error_status, assert_success_status};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    macro_rules! quiz_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(idle_state()))
                    .wrap(RequestIdMiddleware)
                    .service(trigger_quiz),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn accepts_valid_trigger() {
        let app = quiz_app!();
        let req = test::TestRequest::post()
            .uri("/")
            .set_json(json!({
                "email": "student@example.com",
                "secret": "test-secret",
                "url": "https://quiz.example/q1"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_success_status(resp.status());
        assert!(resp.headers().contains_key(REQUEST_ID_HEADER));

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "accepted");
        assert_eq!(body["message"], "Quiz solving process initiated");
        assert_eq!(body["email"], "student@example.com");
        assert_eq!(body["url"], "https://quiz.example/q1");
    }

    #[actix_web::test]
    async fn email_mismatch_is_only_logged() {
        let app = quiz_app!();
        let req = test::TestRequest::post()
            .uri("/")
            .set_json(json!({
                "email": "someone-else@example.com",
                "secret": "test-secret",
                "url": "https://quiz.example/q1"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn unformatted_email_with_valid_secret_is_accepted() {
        let app = quiz_app!();
        let req = test::TestRequest::post()
            .uri("/")
            .set_json(json!({
                "email": "24f1001827",
                "secret": "test-secret",
                "url": "https://quiz.example/q1"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["email"], "24f1001827");
    }

    #[actix_web::test]
    async fn wrong_secret_is_forbidden_before_format_checks() {
        let app = quiz_app!();
        let req = test::TestRequest::post()
            .uri("/")
            .set_json(json!({
                "email": "nope",
                "secret": "wrong",
                "url": "not a url"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn wrong_secret_is_forbidden() {
        let app = quiz_app!();
        let req = test::TestRequest::post()
            .uri("/")
            .set_json(json!({
                "email": "student@example.com",
                "secret": "guess",
                "url": "https://quiz.example/q1"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 403);
    }

    #[actix_web::test]
    async fn malformed_json_is_bad_request() {
        let app = quiz_app!();
        let req = test::TestRequest::post()
            .uri("/")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn missing_fields_are_bad_request() {
        let app = quiz_app!();
        let req = test::TestRequest::post()
            .uri("/")
            .set_json(json!({ "email": "student@example.com" }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn invalid_url_is_bad_request() {
        let app = quiz_app!();
        let req = test::TestRequest::post()
            .uri("/")
            .set_json(json!({
                "email": "student@example.com",
                "secret": "test-secret",
                "url": "not a url"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_error_status(resp.status());
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
