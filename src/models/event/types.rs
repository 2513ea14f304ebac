use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate::validate_text;

pub const NAME_MAX_LEN: usize = 120;
/// Upper bound on `max_members`, keeps generated forms a sane size.
pub const MEMBERS_LIMIT: i32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub team_name_required: bool,
    pub min_members: i32,
    pub max_members: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating an event.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub name: String,
    #[serde(default)]
    pub team_name_required: bool,
    pub min_members: i32,
    pub max_members: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub name: Option<String>,
    pub team_name_required: Option<bool>,
    pub min_members: Option<i32>,
    pub max_members: Option<i32>,
    pub active: Option<bool>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.team_name_required.is_none()
            && self.min_members.is_none()
            && self.max_members.is_none()
            && self.active.is_none()
    }

    /// Merge onto `current`. The result still needs `validate_event`.
    pub fn apply(&self, current: &Event) -> Event {
        Event {
            name: self
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| current.name.clone()),
            team_name_required: self.team_name_required.unwrap_or(current.team_name_required),
            min_members: self.min_members.unwrap_or(current.min_members),
            max_members: self.max_members.unwrap_or(current.max_members),
            active: self.active.unwrap_or(current.active),
            ..current.clone()
        }
    }
}

/// Every rule violation for an event definition; empty when valid.
pub fn validate_event(name: &str, min_members: i32, max_members: i32) -> Vec<String> {
    let mut errors = Vec::new();
    let name = name.trim();
    if name.is_empty() {
        errors.push("Event name is required".to_string());
    } else if let Some(e) = validate_text(name, "Event name", NAME_MAX_LEN) {
        errors.push(e);
    }
    if min_members < 0 {
        errors.push("Minimum members must not be negative".to_string());
    }
    if max_members < 0 {
        errors.push("Maximum members must not be negative".to_string());
    }
    if min_members > max_members {
        errors.push(format!(
            "Minimum members ({min_members}) must not exceed maximum members ({max_members})"
        ));
    }
    if max_members > MEMBERS_LIMIT {
        errors.push(format!("Maximum members must be at most {MEMBERS_LIMIT}"));
    }
    errors
}
