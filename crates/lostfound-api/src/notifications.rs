use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;

use lostfound_types::api::NotificationView;

use crate::error::ApiError;
use crate::formatter::format_notification;
use crate::middleware::AuthUser;
use crate::{AppState, blocking};

/// GET /notifications: the whole stream, newest first, formatted for
/// display. Polling only.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let rows = blocking(move || {
        db.list_notifications()
            .map_err(ApiError::storage("Failed to fetch notifications"))
    })
    .await?;

    let now = Utc::now();
    let views: Vec<NotificationView> = rows
        .into_iter()
        .map(|row| {
            let (notification, post_title) = row.into_parts();
            format_notification(notification, post_title, now)
        })
        .collect();

    Ok(Json(views))
}
