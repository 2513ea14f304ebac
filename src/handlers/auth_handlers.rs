use std::net::{IpAddr, Ipv4Addr};

use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::{guard::AdminGuard, rate_limit::LoginRateLimiter, session};
use crate::errors::AppError;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn client_ip(req: &HttpRequest) -> IpAddr {
    req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// POST /admin/login
pub async fn login(
    req: HttpRequest,
    session: Session,
    guard: web::Data<AdminGuard>,
    limiter: web::Data<LoginRateLimiter>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    // Rate-limit check before spending an argon2 round
    let ip = client_ip(&req);
    if limiter.is_blocked(ip) {
        log::warn!("Admin login from {ip} blocked by rate limiter");
        return Err(AppError::RateLimited);
    }

    match guard.verify(&body.username, &body.password) {
        Ok(()) => {
            limiter.clear(ip);
            session::start(&session, &body.username, Utc::now())?;
            log::info!("Admin '{}' logged in from {ip}", body.username);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "username": body.username,
                "session_ttl_minutes": guard.session_ttl().num_minutes(),
            })))
        }
        Err(err @ AppError::Auth(_)) => {
            limiter.record_failure(ip);
            log::warn!("Failed admin login for '{}' from {ip}", body.username);
            Err(err)
        }
        Err(err) => Err(err),
    }
}

/// POST /admin/logout
pub async fn logout(session: Session) -> HttpResponse {
    session::end(&session);
    HttpResponse::NoContent().finish()
}
