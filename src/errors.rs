use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Validation(Vec<String>),
    NotFound(String),
    Auth(String),
    RateLimited,
    Conflict(String),
    /// A registration points at an event that no longer exists.
    DanglingEvent { registration_id: i64, event_id: i64 },
    Store(sqlx::Error),
    Session(String),
    Hash(String),
    Export(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(vec![msg.into()])
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join("; ")),
            AppError::NotFound(what) => write!(f, "{what} not found"),
            AppError::Auth(e) => write!(f, "Authentication failed: {e}"),
            AppError::RateLimited => write!(f, "Too many failed login attempts"),
            AppError::Conflict(e) => write!(f, "Conflict: {e}"),
            AppError::DanglingEvent { registration_id, event_id } => write!(
                f,
                "Registration {registration_id} references missing event {event_id}"
            ),
            AppError::Store(e) => write!(f, "Database error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Export(e) => write!(f, "Export error: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

/// JSON error body returned by every endpoint.
#[derive(Serialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(e) if is_unavailable(e) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            AppError::Validation(errors) => ApiErrorResponse {
                error: "Validation failed".to_string(),
                details: errors.clone(),
            },
            AppError::NotFound(_)
            | AppError::Auth(_)
            | AppError::RateLimited
            | AppError::Conflict(_) => ApiErrorResponse {
                error: self.to_string(),
                details: vec![],
            },
            _ => {
                log::error!("{self}");
                let error = if status == StatusCode::SERVICE_UNAVAILABLE {
                    "Service Unavailable"
                } else {
                    "Internal Server Error"
                };
                ApiErrorResponse { error: error.to_string(), details: vec![] }
            }
        };
        HttpResponse::build(status).json(body)
    }
}

/// Connectivity failures, as opposed to query or constraint errors.
fn is_unavailable(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    )
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Store(e)
    }
}

impl From<actix_session::SessionInsertError> for AppError {
    fn from(e: actix_session::SessionInsertError) -> Self {
        AppError::Session(e.to_string())
    }
}

impl From<actix_session::SessionGetError> for AppError {
    fn from(e: actix_session::SessionGetError) -> Self {
        AppError::Session(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        AppError::Export(e.to_string())
    }
}
