use chrono::Duration;

use crate::auth::password;
use crate::config::{AdminCredentials, AppConfig};
use crate::errors::AppError;

/// Checks admin credentials against the configured pair.
#[derive(Debug, Clone)]
pub struct AdminGuard {
    credentials: AdminCredentials,
    session_ttl: Duration,
}

impl AdminGuard {
    pub fn new(credentials: AdminCredentials, session_ttl: Duration) -> Self {
        Self { credentials, session_ttl }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.admin.clone(), Duration::minutes(config.session_ttl_minutes))
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// The password is verified even when the username is wrong, so both
    /// failure paths cost the same argon2 round.
    pub fn verify(&self, username: &str, password: &str) -> Result<(), AppError> {
        let user_ok = password::constant_time_eq(username, &self.credentials.username);
        let pass_ok = password::verify_password(password, &self.credentials.password_hash)
            .map_err(AppError::Hash)?;
        if user_ok && pass_ok {
            Ok(())
        } else {
            Err(AppError::Auth("Invalid username or password".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> AdminGuard {
        AdminGuard::new(
            AdminCredentials {
                username: "admin".to_string(),
                password_hash: password::hash_password("letmein!").unwrap(),
            },
            Duration::minutes(60),
        )
    }

    #[test]
    fn accepts_configured_pair() {
        assert!(guard().verify("admin", "letmein!").is_ok());
    }

    #[test]
    fn rejects_wrong_password() {
        assert!(matches!(guard().verify("admin", "nope"), Err(AppError::Auth(_))));
    }

    #[test]
    fn rejects_wrong_username() {
        assert!(matches!(guard().verify("root", "letmein!"), Err(AppError::Auth(_))));
    }

    #[test]
    fn ttl_from_config() {
        assert_eq!(guard().session_ttl(), Duration::minutes(60));
    }
}
