//! Process configuration, read once from the environment at startup.

use std::collections::HashMap;
use std::fmt;

use crate::auth::password;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_SESSION_TTL_MINUTES: i64 = 480;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const MIN_SESSION_KEY_LEN: usize = 64;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing required setting {key}"),
            ConfigError::Invalid { key, reason } => write!(f, "invalid {key}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Admin credentials. The password is only ever held as an argon2 hash.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password_hash: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: String,
    pub admin: AdminCredentials,
    /// `None` when unset or too short; the server then generates a random key.
    pub session_key: Option<Vec<u8>>,
    pub session_ttl_minutes: i64,
    pub cookie_secure: bool,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let database_url = get("DATABASE_URL")
            .ok_or(ConfigError::Missing("DATABASE_URL"))?
            .to_string();

        let username = get("ADMIN_USERNAME")
            .unwrap_or(DEFAULT_ADMIN_USERNAME)
            .to_string();

        let password_hash = match (get("ADMIN_PASSWORD_HASH"), get("ADMIN_PASSWORD")) {
            (Some(hash), _) => {
                argon2::PasswordHash::new(hash).map_err(|e| ConfigError::Invalid {
                    key: "ADMIN_PASSWORD_HASH",
                    reason: e.to_string(),
                })?;
                hash.to_string()
            }
            (None, Some(plain)) => password::hash_password(plain).map_err(|e| {
                ConfigError::Invalid { key: "ADMIN_PASSWORD", reason: e }
            })?,
            (None, None) => return Err(ConfigError::Missing("ADMIN_PASSWORD or ADMIN_PASSWORD_HASH")),
        };

        let session_key = match vars.get("SESSION_KEY") {
            Some(val) if val.len() >= MIN_SESSION_KEY_LEN => Some(val.as_bytes().to_vec()),
            Some(val) => {
                log::warn!(
                    "SESSION_KEY too short ({} bytes, need {MIN_SESSION_KEY_LEN}+), ignoring it",
                    val.len()
                );
                None
            }
            None => None,
        };

        let session_ttl_minutes = parse_or(get("SESSION_TTL_MINUTES"), "SESSION_TTL_MINUTES", DEFAULT_SESSION_TTL_MINUTES)?;
        if session_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_MINUTES",
                reason: "must be positive".to_string(),
            });
        }

        let db_max_connections = parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;

        let cookie_secure = match get("COOKIE_SECURE") {
            None => false,
            Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        };

        Ok(Self {
            database_url,
            db_max_connections,
            bind_addr: get("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR).to_string(),
            admin: AdminCredentials { username, password_hash },
            session_key,
            session_ttl_minutes,
            cookie_secure,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<&str>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}
