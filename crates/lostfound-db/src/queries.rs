use crate::Database;
use crate::models::{
    NewPost, NotificationRow, PostChanges, PostListRow, PostRow, StatusRow, UserRow,
};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

use lostfound_types::models::{NotificationKind, PostId, PostState, UserId};

const USER_COLUMNS: &str = "id, username, password, is_admin, created_at";
const POST_COLUMNS: &str =
    "id, author_id, title, description, room, image_url, item_type, created_at";
const STATUS_COLUMNS: &str =
    "id, post_id, status, claimer_name, proof_image, updated_by, updated_at";

impl Database {
    // -- Users --

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| find_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: UserId) -> Result<Option<UserRow>> {
        self.with_conn(|conn| find_user_by_id(conn, id))
    }

    /// Returns `false` if no user has that id.
    pub fn set_admin(&self, id: UserId, is_admin: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET is_admin = ?2 WHERE id = ?1",
                params![id, is_admin],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Posts --

    pub fn get_post(&self, id: PostId) -> Result<Option<(PostRow, Option<StatusRow>)>> {
        self.with_conn(|conn| {
            let Some(post) = find_post(conn, id)? else {
                return Ok(None);
            };
            let status = find_status_by_post(conn, id)?;
            Ok(Some((post, status)))
        })
    }

    pub fn list_posts(&self) -> Result<Vec<PostListRow>> {
        self.with_conn(query_post_list)
    }

    pub fn distinct_rooms(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT room FROM posts")?;
            let rooms = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(rooms)
        })
    }

    // -- Notifications --

    pub fn list_notifications(&self) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| query_notifications(conn, None))
    }

    pub fn notifications_for_post(&self, post_id: PostId) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| query_notifications(conn, Some(post_id)))
    }
}

// -- Users --

/// Insert a user. Returns `None` when the username is already taken; the
/// UNIQUE constraint on `users.username` is the arbiter, not a prior read.
pub fn insert_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<Option<UserRow>> {
    let inserted = conn.execute(
        "INSERT INTO users (username, password, is_admin) VALUES (?1, ?2, ?3)",
        params![username, password_hash, is_admin],
    );

    match inserted {
        Ok(_) => find_user_by_id(conn, conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
    ))?;
    let row = stmt.query_row([username], map_user).optional()?;
    Ok(row)
}

pub fn find_user_by_id(conn: &Connection, id: UserId) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
    let row = stmt.query_row([id], map_user).optional()?;
    Ok(row)
}

// -- Posts --

pub fn insert_post(conn: &Connection, post: &NewPost<'_>) -> Result<PostId> {
    conn.execute(
        "INSERT INTO posts (author_id, title, description, room, image_url, item_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            post.author_id,
            post.title,
            post.description,
            post.room,
            post.image_url,
            post.item_type.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_post(conn: &Connection, id: PostId) -> Result<Option<PostRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"))?;
    let row = stmt.query_row([id], |row| map_post(row, 0)).optional()?;
    Ok(row)
}

/// Apply the non-`None` fields. Returns `false` if the post does not exist.
pub fn update_post(conn: &Connection, id: PostId, changes: &PostChanges<'_>) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE posts SET
             title       = COALESCE(?2, title),
             description = COALESCE(?3, description),
             room        = COALESCE(?4, room),
             image_url   = COALESCE(?5, image_url)
         WHERE id = ?1",
        params![
            id,
            changes.title,
            changes.description,
            changes.room,
            changes.image_url,
        ],
    )?;
    Ok(changed > 0)
}

/// Delete the post row. Its status goes with it (cascade); notifications
/// stay, with `post_id` cleared.
pub fn delete_post(conn: &Connection, id: PostId) -> Result<bool> {
    let changed = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
    Ok(changed > 0)
}

fn query_post_list(conn: &Connection) -> Result<Vec<PostListRow>> {
    // Single query for post + status code + author name (no N+1)
    let mut stmt = conn.prepare(
        "SELECT p.id, p.author_id, p.title, p.description, p.room, p.image_url, p.item_type,
                p.created_at, u.username, s.status
         FROM posts p
         JOIN statuses s ON s.post_id = p.id
         LEFT JOIN users u ON u.id = p.author_id
         ORDER BY p.id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(PostListRow {
                post: map_post(row, 0)?,
                author_username: row.get(8)?,
                status: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

// -- Statuses --

pub fn insert_status(conn: &Connection, post_id: PostId, updated_by: UserId) -> Result<i64> {
    conn.execute(
        "INSERT INTO statuses (post_id, status, updated_by) VALUES (?1, ?2, ?3)",
        params![post_id, PostState::Open.code(), updated_by],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_status_by_post(conn: &Connection, post_id: PostId) -> Result<Option<StatusRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STATUS_COLUMNS} FROM statuses WHERE post_id = ?1"
    ))?;
    let row = stmt.query_row([post_id], map_status).optional()?;
    Ok(row)
}

/// Move an open status to resolved. Only rows still open are touched, so
/// the returned count is 0 for a missing or already-resolved status.
pub fn resolve_status(
    conn: &Connection,
    post_id: PostId,
    claimer_name: &str,
    proof_image: Option<&str>,
    updated_by: UserId,
) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE statuses SET
             status       = ?2,
             claimer_name = ?3,
             proof_image  = ?4,
             updated_by   = ?5,
             updated_at   = datetime('now')
         WHERE post_id = ?1 AND status = ?6",
        params![
            post_id,
            PostState::Resolved.code(),
            claimer_name,
            proof_image,
            updated_by,
            PostState::Open.code(),
        ],
    )?;
    Ok(changed)
}

// -- Notifications --

pub fn insert_notification(
    conn: &Connection,
    post_id: PostId,
    kind: NotificationKind,
    message: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO notifications (post_id, kind, message) VALUES (?1, ?2, ?3)",
        params![post_id, kind.as_str(), message],
    )?;
    Ok(conn.last_insert_rowid())
}

fn query_notifications(conn: &Connection, post_id: Option<PostId>) -> Result<Vec<NotificationRow>> {
    let mut stmt = conn.prepare(
        "SELECT n.id, n.post_id, n.kind, n.message, n.is_read, n.created_at, p.title
         FROM notifications n
         LEFT JOIN posts p ON p.id = n.post_id
         WHERE ?1 IS NULL OR n.post_id = ?1
         ORDER BY n.created_at DESC, n.id DESC",
    )?;

    let rows = stmt
        .query_map([post_id], |row| {
            Ok(NotificationRow {
                id: row.get(0)?,
                post_id: row.get(1)?,
                kind: row.get(2)?,
                message: row.get(3)?,
                is_read: row.get(4)?,
                created_at: row.get(5)?,
                post_title: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

// -- Row mapping --

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        is_admin: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_post(row: &Row<'_>, offset: usize) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(offset)?,
        author_id: row.get(offset + 1)?,
        title: row.get(offset + 2)?,
        description: row.get(offset + 3)?,
        room: row.get(offset + 4)?,
        image_url: row.get(offset + 5)?,
        item_type: row.get(offset + 6)?,
        created_at: row.get(offset + 7)?,
    })
}

fn map_status(row: &Row<'_>) -> rusqlite::Result<StatusRow> {
    Ok(StatusRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        status: row.get(2)?,
        claimer_name: row.get(3)?,
        proof_image: row.get(4)?,
        updated_by: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
