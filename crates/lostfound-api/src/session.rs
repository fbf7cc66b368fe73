use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use time::{Duration, OffsetDateTime};

use lostfound_types::api::Claims;
use lostfound_types::models::UserId;

use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "lostfound_session";
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HMAC secret used to sign session tokens.
    pub secret: String,
    /// Mark the cookie `Secure`. Only turned off for plain-HTTP local setups.
    pub secure_cookie: bool,
}

/// Issues and checks session cookies. The cookie value is an HS256-signed
/// token carrying the user id and an admin snapshot; nothing is kept
/// server-side.
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    secure_cookie: bool,
}

impl SessionManager {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            secure_cookie: config.secure_cookie,
        }
    }

    /// Build the cookie for a fresh 24h session.
    pub fn create_session(
        &self,
        user_id: UserId,
        is_admin: bool,
    ) -> Result<Cookie<'static>, ApiError> {
        let claims = Claims {
            sub: user_id,
            is_admin,
            exp: (chrono::Utc::now() + chrono::Duration::hours(SESSION_TTL_HOURS)).timestamp()
                as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            ApiError::Storage {
                context: "Failed to save session",
                cause: e.into(),
            }
        })?;

        Ok(self.cookie(token, Duration::hours(SESSION_TTL_HOURS)))
    }

    /// Resolve a cookie value to its claims. Missing, tampered and expired
    /// tokens are all `Unauthenticated`.
    pub fn resolve_session(&self, token: Option<&str>) -> Result<Claims, ApiError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthenticated)?;

        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ApiError::Unauthenticated)
    }

    /// Cookie that overwrites the session with an already-expired one.
    /// Safe to send whether or not a session exists.
    pub fn destroy_session(&self) -> Cookie<'static> {
        let mut cookie = self.cookie(String::new(), Duration::ZERO);
        cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
        cookie
    }

    fn cookie(&self, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::None)
            .max_age(max_age)
            .build()
    }
}
