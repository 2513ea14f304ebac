use actix_session::Session;
use chrono::{DateTime, Duration, Utc};

use crate::errors::AppError;

const ADMIN_KEY: &str = "admin";
const LOGIN_AT_KEY: &str = "login_at";

/// Record a successful admin login. Any prior session state is discarded.
pub fn start(session: &Session, username: &str, now: DateTime<Utc>) -> Result<(), AppError> {
    session.renew();
    session.insert(ADMIN_KEY, username)?;
    session.insert(LOGIN_AT_KEY, now.timestamp())?;
    Ok(())
}

pub fn end(session: &Session) {
    session.purge();
}

/// Admin username if the session is logged in and younger than `ttl`.
pub fn active_admin(session: &Session, ttl: Duration, now: DateTime<Utc>) -> Option<String> {
    let username = session.get::<String>(ADMIN_KEY).unwrap_or(None)?;
    let login_at = session.get::<i64>(LOGIN_AT_KEY).unwrap_or(None)?;
    let login_at = DateTime::<Utc>::from_timestamp(login_at, 0)?;
    if is_expired(login_at, ttl, now) {
        return None;
    }
    Some(username)
}

pub fn is_expired(login_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    login_at > now || now - login_at >= ttl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_window() {
        let login = Utc::now();
        let ttl = Duration::minutes(30);
        assert!(!is_expired(login, ttl, login));
        assert!(!is_expired(login, ttl, login + Duration::minutes(29)));
        assert!(is_expired(login, ttl, login + Duration::minutes(30)));
    }

    #[test]
    fn login_in_the_future_is_rejected() {
        let now = Utc::now();
        assert!(is_expired(now + Duration::minutes(5), Duration::minutes(30), now));
    }
}
