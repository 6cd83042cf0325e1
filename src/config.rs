use std::net::IpAddr;
use std::time::Duration;

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When absent the server runs against an
    /// in-memory record source.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password_hash: String,
    pub host: IpAddr,
    pub port: u16,
    pub session_ttl_minutes: i64,
    pub view_ttl: Duration,
    pub secure_cookies: bool,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source. `from_env` passes the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let env_required = |key: &str| {
            lookup(key).ok_or_else(|| format!("Missing required environment variable: {key}"))
        };
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        let jwt_secret = env_required("ADMIN_JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            return Err("ADMIN_JWT_SECRET must be at least 32 characters".to_string());
        }

        let admin_username = env_or("ADMIN_USERNAME", "admin");
        let admin_password_hash = env_required("ADMIN_PASSWORD_HASH")?;

        let host: IpAddr = env_or("ADMIN_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid ADMIN_HOST: {e}"))?;

        let port: u16 = env_or("ADMIN_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid ADMIN_PORT: {e}"))?;

        let session_ttl_minutes: i64 = env_or("ADMIN_SESSION_TTL_MINUTES", "480")
            .parse()
            .map_err(|e| format!("Invalid ADMIN_SESSION_TTL_MINUTES: {e}"))?;
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&session_ttl_minutes) {
            return Err(format!(
                "ADMIN_SESSION_TTL_MINUTES must be between 1 and {MAX_SESSION_TTL_MINUTES}"
            ));
        }

        let view_ttl_secs: u64 = env_or("ADMIN_VIEW_TTL_SECS", "1800")
            .parse()
            .map_err(|e| format!("Invalid ADMIN_VIEW_TTL_SECS: {e}"))?;

        let secure_cookies = match env_or("ADMIN_SECURE_COOKIES", "true").as_str() {
            "false" | "0" | "no" => false,
            _ => true,
        };

        let log_level = env_or("ADMIN_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            admin_username,
            admin_password_hash,
            host,
            port,
            session_ttl_minutes,
            view_ttl: Duration::from_secs(view_ttl_secs),
            secure_cookies,
            log_level,
        })
    }
}
