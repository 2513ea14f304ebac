use sqlx::PgPool;

use crate::errors::AppError;
use super::types::*;

pub(crate) const EVENT_COLUMNS: &str = "id, name, team_name_required, min_members, max_members, active, created_at, updated_at";

/// Turn a unique-index hit on `lower(name)` into a validation error.
fn map_name_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::validation("Event name already exists");
        }
    }
    AppError::Store(e)
}

pub async fn create(pool: &PgPool, new: &NewEvent) -> Result<i64, AppError> {
    let name = new.name.trim();
    let errors = validate_event(name, new.min_members, new.max_members);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO events (name, team_name_required, min_members, max_members, active) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(name)
    .bind(new.team_name_required)
    .bind(new.min_members)
    .bind(new.max_members)
    .bind(new.active)
    .fetch_one(pool)
    .await
    .map_err(map_name_conflict)?;

    log::info!(
        "Created event {id} '{name}' (members {}..={}, team name {})",
        new.min_members,
        new.max_members,
        if new.team_name_required { "required" } else { "not required" }
    );
    Ok(id)
}

/// All events, oldest first.
pub async fn list(pool: &PgPool) -> Result<Vec<Event>, AppError> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at, id");
    let events = sqlx::query_as::<_, Event>(&sql).fetch_all(pool).await?;
    Ok(events)
}

/// Events open for registration, oldest first.
pub async fn list_active(pool: &PgPool) -> Result<Vec<Event>, AppError> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE active ORDER BY created_at, id");
    let events = sqlx::query_as::<_, Event>(&sql).fetch_all(pool).await?;
    Ok(events)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Event>, AppError> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
    let event = sqlx::query_as::<_, Event>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(event)
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Event, AppError> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {id}")))
}

/// Apply a partial update and re-validate the merged event.
/// The row is locked for the read-modify-write.
pub async fn update(pool: &PgPool, id: i64, patch: &EventPatch) -> Result<Event, AppError> {
    let mut tx = pool.begin().await?;

    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE");
    let current = sqlx::query_as::<_, Event>(&sql)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {id}")))?;

    if patch.is_empty() {
        return Ok(current);
    }

    let merged = patch.apply(&current);
    let errors = validate_event(&merged.name, merged.min_members, merged.max_members);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let sql = format!(
        "UPDATE events SET name = $1, team_name_required = $2, min_members = $3, \
         max_members = $4, active = $5, updated_at = now() \
         WHERE id = $6 RETURNING {EVENT_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, Event>(&sql)
        .bind(&merged.name)
        .bind(merged.team_name_required)
        .bind(merged.min_members)
        .bind(merged.max_members)
        .bind(merged.active)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_name_conflict)?;

    tx.commit().await?;
    log::info!("Updated event {id} '{}'", updated.name);
    Ok(updated)
}

/// Delete an event. Refused while registrations still reference it.
pub async fn delete(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_foreign_key_violation() {
                    return AppError::Conflict(format!(
                        "Event {id} still has registrations; delete them first"
                    ));
                }
            }
            AppError::Store(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Event {id}")));
    }
    log::info!("Deleted event {id}");
    Ok(())
}
