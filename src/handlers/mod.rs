pub mod auth_handlers;
pub mod event_handlers;
pub mod export_handlers;
pub mod registration_handlers;
pub mod stats_handlers;

use actix_web::{HttpResponse, middleware::from_fn, web};

use crate::auth::middleware::{require_admin, require_json_content_type};
use crate::errors::AppError;

/// Register every route. The caller supplies the session middleware and the
/// `PgPool`, `AdminGuard` and `LoginRateLimiter` app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::validation(format!("Invalid JSON body: {err}")).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::validation(format!("Invalid query string: {err}")).into()),
    )
    .route("/health", web::get().to(health))
    // Public
    .route("/events", web::get().to(event_handlers::list_open))
    .route("/events/{id}/form", web::get().to(event_handlers::form))
    .route("/register", web::post().to(registration_handlers::register))
    .route("/stats", web::get().to(stats_handlers::stats))
    // Admin: login is the only route outside the guard
    .service(
        web::scope("/admin")
            .route("/login", web::post().to(auth_handlers::login))
            .service(
                web::scope("")
                    .wrap(from_fn(require_json_content_type))
                    .wrap(from_fn(require_admin))
                    .route("/logout", web::post().to(auth_handlers::logout))
                    .route("/events", web::get().to(event_handlers::list_all))
                    .route("/events", web::post().to(event_handlers::create))
                    .route("/events/{id}", web::get().to(event_handlers::read))
                    .route("/events/{id}", web::put().to(event_handlers::update))
                    .route("/events/{id}", web::delete().to(event_handlers::delete))
                    .route("/registrations", web::get().to(registration_handlers::list))
                    .route("/registrations/{id}", web::get().to(registration_handlers::read))
                    .route("/registrations/{id}", web::delete().to(registration_handlers::delete))
                    .route("/export", web::get().to(export_handlers::export))
                    .route("/stats", web::get().to(stats_handlers::stats)),
            ),
    );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
