use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::registration;

/// GET /stats and GET /admin/stats
pub async fn stats(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let stats = registration::stats(&pool).await?;
    Ok(HttpResponse::Ok().json(stats))
}
