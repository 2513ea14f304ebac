use actix_web::{HttpResponse, web};
use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::form::FormDescriptor;
use crate::models::event::{self, Event, EventPatch, NewEvent};
use crate::models::registration;

#[derive(Serialize)]
pub struct EventForm {
    pub event: Event,
    pub form: FormDescriptor,
}

#[derive(Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub registration_count: i64,
}

/// GET /events
/// Events currently open for registration.
pub async fn list_open(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let events = event::list_active(&pool).await?;
    Ok(HttpResponse::Ok().json(events))
}

/// GET /events/{id}/form
/// Inactive events are reported as missing.
pub async fn form(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let event = event::find_by_id(&pool, id)
        .await?
        .filter(|e| e.active)
        .ok_or_else(|| AppError::NotFound(format!("Event {id}")))?;

    let form = FormDescriptor::for_event(&event);
    Ok(HttpResponse::Ok().json(EventForm { event, form }))
}

/// GET /admin/events
pub async fn list_all(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let events = event::list(&pool).await?;
    Ok(HttpResponse::Ok().json(events))
}

/// POST /admin/events
pub async fn create(
    pool: web::Data<PgPool>,
    body: web::Json<NewEvent>,
) -> Result<HttpResponse, AppError> {
    let id = event::create(&pool, &body).await?;
    let created = event::get(&pool, id).await?;
    Ok(HttpResponse::Created()
        .insert_header(("Location", format!("/admin/events/{id}")))
        .json(created))
}

/// GET /admin/events/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let event = event::get(&pool, id).await?;
    let registration_count = registration::count_for_event(&pool, id).await?;
    Ok(HttpResponse::Ok().json(EventDetail { event, registration_count }))
}

/// PUT /admin/events/{id}
pub async fn update(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    body: web::Json<EventPatch>,
) -> Result<HttpResponse, AppError> {
    let updated = event::update(&pool, path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /admin/events/{id}
pub async fn delete(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    event::delete(&pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
