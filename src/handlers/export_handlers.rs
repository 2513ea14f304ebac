use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::export::{self, ExportFormat};
use crate::models::event;

#[derive(Deserialize)]
pub struct ExportQuery {
    pub event_id: Option<i64>,
    pub format: Option<String>,
}

/// GET /admin/export?event_id=&format=xlsx|csv
pub async fn export(
    pool: web::Data<PgPool>,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse, AppError> {
    // An unknown event is a 404, not an empty sheet
    if let Some(id) = query.event_id {
        event::get(&pool, id).await?;
    }

    let format = ExportFormat::parse(query.format.as_deref());
    let file = export::export(&pool, query.event_id, format).await?;

    let today = Utc::now().format("%Y-%m-%d");
    let filename = match query.event_id {
        Some(id) => format!("registrations-event-{id}-{today}.{}", format.extension()),
        None => format!("registrations-{today}.{}", format.extension()),
    };

    Ok(HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header(("Content-Disposition", format!("attachment; filename=\"{filename}\"")))
        .insert_header(("X-Row-Count", file.row_count.to_string()))
        .body(file.bytes))
}
