use actix_session::{SessionMiddleware, config::PersistentSession, storage::CookieSessionStore};
use actix_web::{App, HttpResponse, HttpServer, cookie::Key, middleware, web};

use std::time::Duration;

use regdesk::auth::guard::AdminGuard;
use regdesk::auth::rate_limit::{self, LoginRateLimiter};
use regdesk::config::AppConfig;
use regdesk::errors::ApiErrorResponse;
use regdesk::{db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Configuration error: {e}");
        std::io::Error::other(e)
    })?;

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| {
            log::error!("Failed to connect to database: {e}");
            std::io::Error::other(e)
        })?;
    db::run_migrations(&pool).await.map_err(std::io::Error::other)?;

    // Session signing key: SESSION_KEY keeps sessions valid across restarts
    let secret_key = match &config.session_key {
        Some(bytes) => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(bytes.as_slice())
        }
        None => {
            log::warn!("No usable SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    let guard = web::Data::new(AdminGuard::from_config(&config));
    let limiter = LoginRateLimiter::default();
    rate_limit::spawn_sweeper(limiter.clone(), Duration::from_secs(300));
    let limiter = web::Data::new(limiter);
    let pool = web::Data::new(pool);
    let session_ttl = guard.session_ttl();
    let cookie_secure = config.cookie_secure;

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
            .cookie_name("regdesk_session".to_string())
            .cookie_secure(cookie_secure)
            .cookie_http_only(true)
            .session_lifecycle(
                PersistentSession::default()
                    .session_ttl(actix_web::cookie::time::Duration::seconds(session_ttl.num_seconds())),
            )
            .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(pool.clone())
            .app_data(guard.clone())
            .app_data(limiter.clone())
            .configure(handlers::configure)
            .default_service(web::to(|| async {
                HttpResponse::NotFound().json(ApiErrorResponse {
                    error: "Not Found".to_string(),
                    details: vec![],
                })
            }))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
