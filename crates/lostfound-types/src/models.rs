use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type PostId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Whether a report is about something lost or something found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ItemType {
    Lost,
    Found,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lost" => Ok(Self::Lost),
            "found" => Ok(Self::Found),
            other => Err(format!("unknown item type '{other}', expected 'lost' or 'found'")),
        }
    }
}

impl TryFrom<String> for ItemType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a post. Persisted as the integer status code
/// (`1` open, `0` resolved); the only transition is open -> resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostState {
    Open,
    Resolved,
}

impl PostState {
    pub const OPEN_CODE: i64 = 1;
    pub const RESOLVED_CODE: i64 = 0;

    pub fn code(self) -> i64 {
        match self {
            Self::Open => Self::OPEN_CODE,
            Self::Resolved => Self::RESOLVED_CODE,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            Self::OPEN_CODE => Some(Self::Open),
            Self::RESOLVED_CODE => Some(Self::Resolved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: i64,
    pub post_id: PostId,
    pub status: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_image: Option<String>,
    pub updated_by: UserId,
    pub updated_at: DateTime<Utc>,
}

impl Status {
    pub fn state(&self) -> Option<PostState> {
        PostState::from_code(self.status)
    }
}

/// A reported item together with its lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: Option<UserId>,
    pub title: String,
    pub description: String,
    pub room: String,
    pub image_url: String,
    pub item_type: ItemType,
    pub created_at: DateTime<Utc>,
    pub status: Status,
}

/// Display category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewPost,
    Claim,
    Update,
    Info,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewPost => "new_post",
            Self::Claim => "claim",
            Self::Update => "update",
            Self::Info => "info",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new_post" => Some(Self::NewPost),
            "claim" => Some(Self::Claim),
            "update" => Some(Self::Update),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

/// Persisted notification event. `post_id` becomes `None` once the
/// referenced post is deleted; `kind` is `None` for rows written before
/// categories were stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub post_id: Option<PostId>,
    pub kind: Option<NotificationKind>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
