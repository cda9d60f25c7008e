use crate::error::AppError;
use crate::handlers;
use crate::metrics::serve_metrics;
use actix_web::web;

/// Register every route of the service. Shared by `main` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| AppError::InvalidArgument(err.to_string()).into());

    cfg.app_data(json_config)
        .route("/health", web::get().to(handlers::health))
        .route("/ready", web::get().to(handlers::ready))
        .route("/metrics", web::get().to(serve_metrics))
        .service(
            web::scope("/api/matches")
                .route("/suggestions", web::get().to(handlers::get_suggestions))
                .route("/swipe", web::post().to(handlers::swipe))
                .route("/matches", web::get().to(handlers::get_matches))
                .route("/match/{id}", web::delete().to(handlers::unmatch)),
        );
}
