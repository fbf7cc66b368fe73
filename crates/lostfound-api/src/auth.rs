use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use tracing::info;

use lostfound_types::api::{
    LoginRequest, MeResponse, MessageResponse, SessionResponse, SignupRequest, UserSummary,
};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::{AppState, blocking};

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = state.credentials.clone();
    let user = blocking(move || credentials.create_user(&req.username, &req.password)).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserSummary {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = state.credentials.clone();
    let user =
        blocking(move || credentials.verify_credentials(&req.username, &req.password)).await?;

    let cookie = state.sessions.create_session(user.id, user.is_admin)?;
    info!("User '{}' logged in", user.username);

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            message: "Logged in successfully".into(),
            is_admin: user.is_admin,
        }),
    ))
}

/// POST /guest-login
pub async fn guest_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = state.credentials.clone();
    let user = blocking(move || credentials.get_or_create_guest()).await?;

    let cookie = state.sessions.create_session(user.id, user.is_admin)?;
    info!("Guest user {} logged in", user.id);

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            message: "Logged in as guest successfully".into(),
            is_admin: user.is_admin,
        }),
    ))
}

/// GET /me
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = state.credentials.clone();
    let user = blocking(move || credentials.find_user(auth.user_id))
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        is_admin: user.is_admin,
        created_at: user.created_at,
    }))
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    jar: CookieJar,
) -> impl IntoResponse {
    info!("User {} logged out", auth.user_id);
    (
        jar.add(state.sessions.destroy_session()),
        Json(MessageResponse::new("Logged out")),
    )
}
