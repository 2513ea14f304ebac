use chrono::{DateTime, NaiveTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::errors::AppError;
use crate::form::{FormDescriptor, RegistrationSubmission};
use crate::models::event::Event;
use crate::models::event::queries::EVENT_COLUMNS;
use crate::validate::has_control_chars;
use super::types::*;

const REGISTRATION_COLUMNS: &str = "r.id, r.event_id, r.team_name, r.team_lead, r.members, r.created_at";

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    event_id: i64,
    team_name: Option<String>,
    team_lead: Json<TeamLead>,
    members: Json<Vec<Member>>,
    created_at: DateTime<Utc>,
}

impl From<Row> for Registration {
    fn from(row: Row) -> Self {
        Registration {
            id: row.id,
            event_id: row.event_id,
            team_name: row.team_name,
            team_lead: row.team_lead.0,
            members: row.members.0,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct JoinedRow {
    #[sqlx(flatten)]
    row: Row,
    event_name: Option<String>,
}

impl TryFrom<JoinedRow> for RegistrationWithEvent {
    type Error = AppError;

    fn try_from(joined: JoinedRow) -> Result<Self, AppError> {
        let Some(event_name) = joined.event_name else {
            return Err(AppError::DanglingEvent {
                registration_id: joined.row.id,
                event_id: joined.row.event_id,
            });
        };
        Ok(RegistrationWithEvent { registration: joined.row.into(), event_name })
    }
}

/// Validate a submission against the event's current constraints and store it.
/// The event row is share-locked so its constraints cannot change mid-insert.
pub async fn create(pool: &PgPool, submission: &RegistrationSubmission) -> Result<Registration, AppError> {
    let mut tx = pool.begin().await?;

    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR SHARE");
    let event = sqlx::query_as::<_, Event>(&sql)
        .bind(submission.event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {}", submission.event_id)))?;

    if !event.active {
        return Err(AppError::validation(format!(
            "Event '{}' is not open for registration",
            event.name
        )));
    }

    let normalized = FormDescriptor::for_event(&event)
        .normalize(submission)
        .map_err(AppError::Validation)?;

    let sql = format!(
        "INSERT INTO registrations AS r (event_id, team_name, team_lead, members) \
         VALUES ($1, $2, $3, $4) RETURNING {REGISTRATION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(event.id)
        .bind(&normalized.team_name)
        .bind(Json(&normalized.team_lead))
        .bind(Json(&normalized.members))
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    let registration = Registration::from(row);
    log::info!(
        "Registration {} for event {} '{}' ({} members)",
        registration.id,
        event.id,
        event.name,
        registration.members.len()
    );
    Ok(registration)
}

/// Registrations in creation order, optionally for one event.
pub async fn list(pool: &PgPool, event_id: Option<i64>) -> Result<Vec<Registration>, AppError> {
    let sql = format!(
        "SELECT {REGISTRATION_COLUMNS} FROM registrations r \
         WHERE ($1::BIGINT IS NULL OR r.event_id = $1) \
         ORDER BY r.created_at, r.id"
    );
    let rows = sqlx::query_as::<_, Row>(&sql)
        .bind(event_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Registration::from).collect())
}

pub async fn get(pool: &PgPool, id: i64) -> Result<RegistrationWithEvent, AppError> {
    let sql = format!(
        "SELECT {REGISTRATION_COLUMNS}, e.name AS event_name \
         FROM registrations r LEFT JOIN events e ON e.id = r.event_id \
         WHERE r.id = $1"
    );
    let row = sqlx::query_as::<_, JoinedRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Registration {id}")))?;
    row.try_into()
}

/// Admin listing: newest first, text search over team and member fields.
pub async fn search(pool: &PgPool, query: &RegistrationQuery) -> Result<RegistrationPage, AppError> {
    const FILTER: &str = "($1::BIGINT IS NULL OR r.event_id = $1) \
         AND ($2::TEXT IS NULL \
              OR r.team_name ILIKE $2 \
              OR r.team_lead->>'name' ILIKE $2 \
              OR r.team_lead->>'email' ILIKE $2 \
              OR EXISTS (SELECT 1 FROM jsonb_array_elements(r.members) m \
                         WHERE m->>'name' ILIKE $2 \
                            OR m->>'email' ILIKE $2 \
                            OR m->>'reg_no' ILIKE $2))";

    if query.q.as_deref().is_some_and(has_control_chars) {
        return Err(AppError::validation("Search text contains invalid characters"));
    }
    let pattern = query.search_pattern();
    let page = query.page();
    let per_page = query.per_page();

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM registrations r WHERE {FILTER}"
    ))
    .bind(query.event_id)
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let sql = format!(
        "SELECT {REGISTRATION_COLUMNS}, e.name AS event_name \
         FROM registrations r LEFT JOIN events e ON e.id = r.event_id \
         WHERE {FILTER} \
         ORDER BY r.created_at DESC, r.id DESC \
         LIMIT $3 OFFSET $4"
    );
    let rows = sqlx::query_as::<_, JoinedRow>(&sql)
        .bind(query.event_id)
        .bind(&pattern)
        .bind(per_page)
        .bind(query.offset())
        .fetch_all(pool)
        .await?;

    let items = rows
        .into_iter()
        .map(RegistrationWithEvent::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RegistrationPage {
        items,
        page,
        per_page,
        total,
        total_pages: RegistrationPage::total_pages(total, per_page),
    })
}

/// Rows for the spreadsheet export, oldest first. A registration whose event
/// has disappeared fails the whole export.
pub async fn list_for_export(pool: &PgPool, event_id: Option<i64>) -> Result<Vec<RegistrationWithEvent>, AppError> {
    let sql = format!(
        "SELECT {REGISTRATION_COLUMNS}, e.name AS event_name \
         FROM registrations r LEFT JOIN events e ON e.id = r.event_id \
         WHERE ($1::BIGINT IS NULL OR r.event_id = $1) \
         ORDER BY r.created_at, r.id"
    );
    let rows = sqlx::query_as::<_, JoinedRow>(&sql)
        .bind(event_id)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(RegistrationWithEvent::try_from).collect()
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Registration {id}")));
    }
    log::info!("Deleted registration {id}");
    Ok(())
}

pub async fn count_for_event(pool: &PgPool, event_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Total registrations and those created since midnight UTC.
pub async fn stats(pool: &PgPool) -> Result<RegistrationStats, AppError> {
    let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    let (total, today): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE created_at >= $1) FROM registrations",
    )
    .bind(midnight)
    .fetch_one(pool)
    .await?;
    Ok(RegistrationStats { total, today })
}
