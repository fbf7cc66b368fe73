use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder session secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["secret", "change-me", "dev-secret-change-me"];

const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5500,http://127.0.0.1:5500,http://localhost:3000";

/// Server configuration loaded from environment variables.
///
/// | Env Var                    | Default                              |
/// |----------------------------|--------------------------------------|
/// | `LOSTFOUND_HOST`           | `0.0.0.0`                            |
/// | `LOSTFOUND_PORT`           | `8080`                               |
/// | `LOSTFOUND_DB_PATH`        | `lostfound.db`                       |
/// | `LOSTFOUND_SESSION_SECRET` | required                             |
/// | `LOSTFOUND_COOKIE_SECURE`  | `true`                               |
/// | `LOSTFOUND_CORS_ORIGINS`   | local frontend dev origins           |
/// | `LOSTFOUND_ADMIN_USERNAME` | unset                                |
/// | `LOSTFOUND_ADMIN_PASSWORD` | unset                                |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
    /// Account to create or promote to admin at startup.
    pub admin: Option<(String, String)>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let host = var_or("LOSTFOUND_HOST", "0.0.0.0");
        let port: u16 = var_or("LOSTFOUND_PORT", "8080")
            .parse()
            .context("LOSTFOUND_PORT must be a valid port number")?;
        let db_path = PathBuf::from(var_or("LOSTFOUND_DB_PATH", "lostfound.db"));

        let session_secret = std::env::var("LOSTFOUND_SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("LOSTFOUND_SESSION_SECRET is unset or still a placeholder");
        }

        let cookie_secure = parse_bool(&var_or("LOSTFOUND_COOKIE_SECURE", "true"))
            .context("LOSTFOUND_COOKIE_SECURE must be true or false")?;

        let cors_origins = split_origins(&var_or("LOSTFOUND_CORS_ORIGINS", DEFAULT_CORS_ORIGINS));

        let admin = match (
            std::env::var("LOSTFOUND_ADMIN_USERNAME"),
            std::env::var("LOSTFOUND_ADMIN_PASSWORD"),
        ) {
            (Ok(user), Ok(pass)) if !user.trim().is_empty() && !pass.is_empty() => {
                Some((user, pass))
            }
            _ => None,
        };

        Ok(Self {
            host,
            port,
            db_path,
            session_secret,
            cookie_secure,
            cors_origins,
            admin,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
