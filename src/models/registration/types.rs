use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One person on a registration. Stored inside the `members` JSONB column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_no: Option<String>,
}

/// Contact person for a registration, required on every submission.
/// Stored in the `team_lead` JSONB column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLead {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_no: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub team_lead: TeamLead,
    pub members: Vec<Member>,
    pub created_at: DateTime<Utc>,
}

/// Registration joined with the name of its event, for admin views and export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationWithEvent {
    #[serde(flatten)]
    pub registration: Registration,
    pub event_name: String,
}

/// Admin listing parameters (`GET /admin/registrations`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationQuery {
    pub event_id: Option<i64>,
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MIN_PER_PAGE: i64 = 5;
pub const MAX_PER_PAGE: i64 = 100;

impl RegistrationQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(MIN_PER_PAGE, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }

    /// `ILIKE` pattern for the search text, `None` when there is nothing to search.
    pub fn search_pattern(&self) -> Option<String> {
        let q = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())?;
        Some(format!("%{}%", escape_like(q)))
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationPage {
    pub items: Vec<RegistrationWithEvent>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl RegistrationPage {
    pub fn total_pages(total: i64, per_page: i64) -> i64 {
        if per_page <= 0 {
            return 1;
        }
        ((total + per_page - 1) / per_page).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationStats {
    pub total: i64,
    pub today: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let q = RegistrationQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(q.offset(), 0);

        let q = RegistrationQuery { page: Some(0), per_page: Some(1), ..Default::default() };
        assert_eq!(q.page(), 1);
        assert_eq!(q.per_page(), MIN_PER_PAGE);

        let q = RegistrationQuery { page: Some(3), per_page: Some(500), ..Default::default() };
        assert_eq!(q.per_page(), MAX_PER_PAGE);
        assert_eq!(q.offset(), 200);
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let q = RegistrationQuery { q: Some(" 50%_off\\ ".into()), ..Default::default() };
        assert_eq!(q.search_pattern().as_deref(), Some("%50\\%\\_off\\\\%"));

        let blank = RegistrationQuery { q: Some("   ".into()), ..Default::default() };
        assert!(blank.search_pattern().is_none());
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(RegistrationPage::total_pages(0, 10), 1);
        assert_eq!(RegistrationPage::total_pages(10, 10), 1);
        assert_eq!(RegistrationPage::total_pages(11, 10), 2);
    }

    #[test]
    fn member_json_omits_empty_contact_fields() {
        let m = Member { name: "Alice".into(), email: None, reg_no: None };
        assert_eq!(serde_json::to_string(&m).unwrap(), r#"{"name":"Alice"}"#);
        let back: Member = serde_json::from_str(r#"{"name":"Bob","email":"b@x.io"}"#).unwrap();
        assert_eq!(back.email.as_deref(), Some("b@x.io"));
        assert!(back.reg_no.is_none());
    }

    #[test]
    fn team_lead_json_omits_empty_optionals() {
        let lead = TeamLead {
            name: "Dana".into(),
            email: "dana@example.com".into(),
            phone: None,
            reg_no: Some("21BCE0042".into()),
        };
        assert_eq!(
            serde_json::to_string(&lead).unwrap(),
            r#"{"name":"Dana","email":"dana@example.com","reg_no":"21BCE0042"}"#
        );
    }
}
