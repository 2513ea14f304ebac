//! Field checks shared by event definitions and registration submissions.
//! The `validate_*` functions return `Some(message)` on failure.

pub fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

/// Control characters (NUL included) are never stored; Postgres refuses NUL
/// in both TEXT and JSONB.
pub fn has_control_chars(value: &str) -> bool {
    value.chars().any(char::is_control)
}

/// A non-empty local part, an '@', and a dotted domain.
pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Length and character checks for a free-text field.
pub fn validate_text(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    if has_control_chars(value) {
        return Some(format!("{field_name} contains invalid characters"));
    }
    if too_long(value, max_len) {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

pub fn validate_email(email: &str, field_name: &str, max_len: usize) -> Option<String> {
    if has_control_chars(email) || too_long(email, max_len) || !is_plausible_email(email) {
        return Some(format!("{field_name} is not a valid address"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_chars_rejected() {
        assert!(has_control_chars("Al\u{0}ice"));
        assert!(has_control_chars("line\nbreak"));
        assert!(has_control_chars("tab\there"));
        assert!(!has_control_chars("Zoë O'Brien"));
    }

    #[test]
    fn text_messages() {
        assert_eq!(
            validate_text("Bad\u{0}Name", "Team name", 10),
            Some("Team name contains invalid characters".to_string())
        );
        assert_eq!(
            validate_text("abcdefghijk", "Team name", 10),
            Some("Team name must be at most 10 characters".to_string())
        );
        assert_eq!(validate_text("Crabs", "Team name", 10), None);
    }

    #[test]
    fn plausible_emails() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a@bco"));
        assert!(!is_plausible_email("a@.co"));
        assert!(validate_email("a\u{0}@b.co", "Email", 254).is_some());
        assert!(validate_email("a@b.co", "Email", 254).is_none());
    }
}
