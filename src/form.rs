//! Registration form shape for an event, and normalization of submissions
//! against that shape.
//!
//! The descriptor is the single place that decides which fields a form
//! shows; handlers and the registration store both go through it.

use serde::{Deserialize, Serialize};

use crate::models::event::Event;
use crate::models::registration::{Member, TeamLead};
use crate::validate::{validate_email, validate_text};

pub const TEAM_NAME_MAX_LEN: usize = 120;
pub const PERSON_NAME_MAX_LEN: usize = 120;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PHONE_MAX_LEN: usize = 30;
pub const REG_NO_MAX_LEN: usize = 50;

const REQUIRED_CONTACT: &[&str] = &["name", "email"];
const NO_REQUIRED_FIELDS: &[&str] = &[];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberField {
    /// 1-based position on the form.
    pub index: u32,
    pub required: bool,
    /// Inputs that must be filled for this member; empty for optional slots.
    pub required_fields: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormDescriptor {
    pub show_team_name: bool,
    pub team_lead_required_fields: &'static [&'static str],
    /// Inclusive `(min, max)` number of members.
    pub member_field_count_range: (u32, u32),
    pub member_fields: Vec<MemberField>,
}

/// Raw member row as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub reg_no: Option<String>,
}

impl MemberInput {
    pub fn named(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    pub fn with_email(name: &str, email: &str) -> Self {
        Self { name: name.to_string(), email: Some(email.to_string()), reg_no: None }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamLeadInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub reg_no: Option<String>,
}

/// Body of `POST /register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationSubmission {
    pub event_id: i64,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub team_lead: Option<TeamLeadInput>,
    #[serde(default)]
    pub members: Vec<MemberInput>,
}

/// A submission that satisfies its event's form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSubmission {
    pub team_name: Option<String>,
    pub team_lead: TeamLead,
    pub members: Vec<Member>,
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn normalize_team_lead(input: Option<&TeamLeadInput>, errors: &mut Vec<String>) -> Option<TeamLead> {
    let input = input.cloned().unwrap_or_default();
    let name = input.name.trim();
    let email = trimmed(input.email.as_deref());
    let phone = trimmed(input.phone.as_deref());
    let reg_no = trimmed(input.reg_no.as_deref());

    let Some(email) = email.filter(|_| !name.is_empty()) else {
        errors.push("Team lead name and email are required".to_string());
        return None;
    };

    let before = errors.len();
    errors.extend(validate_text(name, "Team lead name", PERSON_NAME_MAX_LEN));
    errors.extend(validate_email(&email, "Team lead email", EMAIL_MAX_LEN));
    if let Some(phone) = &phone {
        errors.extend(validate_text(phone, "Team lead phone", PHONE_MAX_LEN));
    }
    if let Some(reg_no) = &reg_no {
        errors.extend(validate_text(reg_no, "Team lead registration number", REG_NO_MAX_LEN));
    }

    (errors.len() == before).then(|| TeamLead { name: name.to_string(), email, phone, reg_no })
}

impl FormDescriptor {
    pub fn for_event(event: &Event) -> Self {
        let min = u32::try_from(event.min_members).unwrap_or(0);
        let max = u32::try_from(event.max_members).unwrap_or(0).max(min);
        let member_fields = (1..=max)
            .map(|index| {
                let required = index <= min;
                MemberField {
                    index,
                    required,
                    required_fields: if required { REQUIRED_CONTACT } else { NO_REQUIRED_FIELDS },
                }
            })
            .collect();
        Self {
            show_team_name: event.team_name_required,
            team_lead_required_fields: REQUIRED_CONTACT,
            member_field_count_range: (min, max),
            member_fields,
        }
    }

    /// Trim and check a submission. Blank member rows are dropped, and a team
    /// name is discarded when the form does not show one. The first `min`
    /// members need an email as well as a name. All problems are reported
    /// together.
    pub fn normalize(&self, submission: &RegistrationSubmission) -> Result<NormalizedSubmission, Vec<String>> {
        let mut errors = Vec::new();
        let (min, max) = self.member_field_count_range;

        let team_name = if self.show_team_name {
            let name = trimmed(submission.team_name.as_deref());
            match &name {
                None => errors.push("Team name is required for this event".to_string()),
                Some(n) => errors.extend(validate_text(n, "Team name", TEAM_NAME_MAX_LEN)),
            }
            name
        } else {
            None
        };

        let team_lead = normalize_team_lead(submission.team_lead.as_ref(), &mut errors);

        let mut members = Vec::new();
        for (i, input) in submission.members.iter().enumerate() {
            let position = i + 1;
            let name = input.name.trim();
            let email = trimmed(input.email.as_deref());
            let reg_no = trimmed(input.reg_no.as_deref());

            if name.is_empty() && email.is_none() && reg_no.is_none() {
                continue;
            }
            if name.is_empty() {
                errors.push(format!("Member {position} name is required"));
            } else {
                errors.extend(validate_text(name, &format!("Member {position} name"), PERSON_NAME_MAX_LEN));
            }
            match &email {
                Some(email) => {
                    errors.extend(validate_email(email, &format!("Member {position} email"), EMAIL_MAX_LEN));
                }
                None if members.len() < min as usize => {
                    errors.push(format!("Member {position} email is required"));
                }
                None => {}
            }
            if let Some(reg_no) = &reg_no {
                errors.extend(validate_text(
                    reg_no,
                    &format!("Member {position} registration number"),
                    REG_NO_MAX_LEN,
                ));
            }
            members.push(Member { name: name.to_string(), email, reg_no });
        }

        let count = members.len();
        if count < min as usize || count > max as usize {
            let expected = if min == max {
                format!("exactly {min}")
            } else {
                format!("between {min} and {max}")
            };
            errors.push(format!("This event requires {expected} members, got {count}"));
        }

        match team_lead {
            Some(team_lead) if errors.is_empty() => Ok(NormalizedSubmission { team_name, team_lead, members }),
            _ => Err(errors),
        }
    }
}
