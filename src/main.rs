use actix_web::{middleware::Logger, web, App, HttpServer};

use quiz_solver::{
    app_state::AppState, config::Config, handlers, logging, middleware::RequestIdMiddleware,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    if let Some(path) = logging::init(&config.log_dir) {
        log::info!("Logging to {}", path.display());
    }

    if let Err(e) = config.validate() {
        log::error!("{}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }

    let host = config.web_server_host.clone();
    let port = config.web_server_port;

    log::info!("Starting Data Science Quiz Solver");
    log::info!("Student email: {}", config.student_email);
    log::info!("Model: {}", config.llm_model);
    log::info!(
        "Per-question timeout: {}s, skip threshold: {}s",
        config.quiz_timeout_seconds,
        config.skip_threshold_seconds
    );

    let state = AppState::new(config)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(RequestIdMiddleware)
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
