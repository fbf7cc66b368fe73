//! Database row types. These map directly to SQLite rows.
//! Distinct from lostfound-types models to keep the DB layer independent;
//! the `into_*` conversions are the only place the two meet.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use lostfound_types::models::{
    ItemType, Notification, NotificationKind, Post, PostId, Status, User, UserId,
};

pub struct UserRow {
    pub id: UserId,
    pub username: String,
    pub password: String,
    pub is_admin: bool,
    pub created_at: String,
}

pub struct StatusRow {
    pub id: i64,
    pub post_id: PostId,
    pub status: i64,
    pub claimer_name: Option<String>,
    pub proof_image: Option<String>,
    pub updated_by: UserId,
    pub updated_at: String,
}

pub struct PostRow {
    pub id: PostId,
    pub author_id: Option<UserId>,
    pub title: String,
    pub description: String,
    pub room: String,
    pub image_url: String,
    pub item_type: String,
    pub created_at: String,
}

/// A post joined with its status and author, as listed by `GET /posts`.
pub struct PostListRow {
    pub post: PostRow,
    pub author_username: Option<String>,
    pub status: i64,
}

pub struct NotificationRow {
    pub id: i64,
    pub post_id: Option<PostId>,
    pub kind: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
    /// Title of the referenced post, if it still exists.
    pub post_title: Option<String>,
}

/// Column values for a new post.
pub struct NewPost<'a> {
    pub author_id: UserId,
    pub title: &'a str,
    pub description: &'a str,
    pub room: &'a str,
    pub image_url: &'a str,
    pub item_type: ItemType,
}

/// Partial post update; `None` leaves the column untouched.
#[derive(Default)]
pub struct PostChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub room: Option<&'a str>,
    pub image_url: Option<&'a str>,
}

impl PostChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.room.is_none()
            && self.image_url.is_none()
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Accept RFC 3339 too, and fall back to the epoch on corrupt values.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            is_admin: self.is_admin,
            created_at: parse_timestamp(&self.created_at),
        }
    }
}

impl StatusRow {
    pub fn into_status(self) -> Status {
        Status {
            id: self.id,
            post_id: self.post_id,
            status: self.status,
            claimer_name: self.claimer_name,
            proof_image: self.proof_image,
            updated_by: self.updated_by,
            updated_at: parse_timestamp(&self.updated_at),
        }
    }
}

impl PostRow {
    pub fn item_type(&self) -> Result<ItemType> {
        self.item_type
            .parse()
            .map_err(|e| anyhow!("post {}: {}", self.id, e))
    }

    pub fn into_post(self, status: StatusRow) -> Result<Post> {
        let item_type = self.item_type()?;
        Ok(Post {
            id: self.id,
            author_id: self.author_id,
            title: self.title,
            description: self.description,
            room: self.room,
            image_url: self.image_url,
            item_type,
            created_at: parse_timestamp(&self.created_at),
            status: status.into_status(),
        })
    }
}

impl NotificationRow {
    /// Split into the persisted notification and the joined post title.
    pub fn into_parts(self) -> (Notification, Option<String>) {
        let kind = self.kind.as_deref().and_then(|k| {
            let parsed = NotificationKind::parse(k);
            if parsed.is_none() {
                warn!("Unknown notification kind '{}' on notification {}", k, self.id);
            }
            parsed
        });

        let notification = Notification {
            id: self.id,
            post_id: self.post_id,
            kind,
            message: self.message,
            is_read: self.is_read,
            created_at: parse_timestamp(&self.created_at),
        };
        (notification, self.post_title)
    }
}
