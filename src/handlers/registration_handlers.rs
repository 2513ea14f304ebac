use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::form::RegistrationSubmission;
use crate::models::registration::{self, RegistrationQuery};

/// POST /register
pub async fn register(
    pool: web::Data<PgPool>,
    body: web::Json<RegistrationSubmission>,
) -> Result<HttpResponse, AppError> {
    let created = registration::create(&pool, &body).await?;
    Ok(HttpResponse::Created().json(created))
}

/// GET /admin/registrations?event_id=&q=&page=&per_page=
pub async fn list(
    pool: web::Data<PgPool>,
    query: web::Query<RegistrationQuery>,
) -> Result<HttpResponse, AppError> {
    let page = registration::search(&pool, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /admin/registrations/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = registration::get(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(found))
}

/// DELETE /admin/registrations/{id}
pub async fn delete(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    registration::delete(&pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
