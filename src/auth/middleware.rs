use actix_session::SessionExt;
use actix_web::{
    Error, ResponseError, web,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
    middleware::Next,
};
use chrono::Utc;

use crate::auth::{guard::AdminGuard, session};
use crate::errors::AppError;

/// Rejects requests without a live admin session with 401.
/// Expired sessions are purged.
pub async fn require_admin(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let Some(guard) = req.app_data::<web::Data<AdminGuard>>().cloned() else {
        let err = AppError::Session("admin guard not configured".to_string());
        return Ok(req.into_response(err.error_response()).map_into_right_body());
    };

    let session = req.get_session();
    if session::active_admin(&session, guard.session_ttl(), Utc::now()).is_none() {
        session::end(&session);
        let err = AppError::Auth("Admin login required".to_string());
        return Ok(req.into_response(err.error_response()).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// CSRF guard for cookie-authenticated mutations: browsers cannot send a
/// cross-origin `application/json` body without a preflight.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method();
    if method == Method::POST || method == Method::PUT || method == Method::DELETE {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let err = AppError::validation("Content-Type must be application/json for mutation requests");
            return Ok(req.into_response(err.error_response()).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}
