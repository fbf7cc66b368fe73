use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ItemType, NotificationKind, Post, PostId, Status, UserId};

// -- Session Claims --

/// Payload of the signed session cookie. `is_admin` is a snapshot taken at
/// login; admin-only operations re-read the live flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub is_admin: bool,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// -- Posts --

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub description: String,
    pub room: String,
    pub image_url: String,
    #[serde(alias = "itemType")]
    pub item_type: ItemType,
}

/// Partial update: absent or empty fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkDoneRequest {
    pub claimer_name: String,
    #[serde(default)]
    pub proof_image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostEnvelope {
    pub message: String,
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct StatusEnvelope {
    pub message: String,
    pub status: Status,
}

/// Row of `GET /posts`: the post flattened with its status code and the
/// author's username.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: PostId,
    pub username: String,
    pub title: String,
    pub description: String,
    pub room: String,
    pub image_url: String,
    pub item_type: ItemType,
    pub created_at: DateTime<Utc>,
    pub status: i64,
}

// -- Notifications --

/// Read-time display view of a notification. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: i64,
    pub post_id: Option<PostId>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub time: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(rename = "iconColor")]
    pub icon_color: &'static str,
    pub post_title: String,
}
