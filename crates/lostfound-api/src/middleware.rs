use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::warn;

use lostfound_types::models::UserId;

use crate::credentials::CredentialStore;
use crate::error::ApiError;
use crate::session::SESSION_COOKIE;
use crate::{AppState, blocking};

/// Identity attached to every request that passed [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: UserId,
    pub is_admin: bool,
}

/// Resolve the session cookie and confirm the user still exists.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned());
    let claims = state.sessions.resolve_session(token.as_deref())?;

    let credentials = state.credentials.clone();
    let user = blocking(move || credentials.find_user(claims.sub))
        .await
        .map_err(|e| {
            warn!("Session user lookup failed: {}", e);
            ApiError::Unauthenticated
        })?
        .ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(AuthUser {
        user_id: user.id,
        is_admin: user.is_admin,
    });
    Ok(next.run(req).await)
}

/// Admin gate for mutating operations. Reads the live flag, never the
/// session snapshot, so revocation applies on the next request.
pub fn require_admin(
    credentials: &CredentialStore,
    caller: UserId,
    action: &str,
) -> Result<(), ApiError> {
    match credentials.is_admin(caller) {
        Ok(true) => Ok(()),
        Ok(false) | Err(ApiError::UserNotFound) => {
            warn!("User {} denied: {}", caller, action);
            Err(ApiError::Forbidden(format!("Only administrators can {action}")))
        }
        Err(e) => Err(e),
    }
}
