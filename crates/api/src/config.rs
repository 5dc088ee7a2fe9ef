//! Application configuration loaded from environment variables.

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `DATABASE_URL` — Postgres connection string; when unset the server
///   runs on the in-memory store
/// - `STAFF_USERNAME` — staff login name (default: `"admin"`)
/// - `STAFF_PASSWORD_HASH` — argon2 PHC hash of the staff password;
///   takes precedence over `STAFF_PASSWORD`
/// - `STAFF_PASSWORD` — plaintext staff password, hashed at startup
///   (default: `"admin"`, for development only)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub staff_username: String,
    pub staff_password: String,
    pub staff_password_hash: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: std::env::var("DATABASE_URL").ok(),
            staff_username: std::env::var("STAFF_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            staff_password: std::env::var("STAFF_PASSWORD").unwrap_or_else(|_| "admin".to_string()),
            staff_password_hash: std::env::var("STAFF_PASSWORD_HASH").ok(),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            staff_username: "admin".to_string(),
            staff_password: "admin".to_string(),
            staff_password_hash: None,
            log_level: "info".to_string(),
        }
    }
}
