use std::sync::Arc;

use anyhow::anyhow;
use tracing::info;

use lostfound_db::models::{NewPost, PostChanges};
use lostfound_db::{Database, queries};
use lostfound_types::api::{CreatePostRequest, PostSummary, UpdatePostRequest};
use lostfound_types::models::{NotificationKind, Post, PostId, Status, UserId};

use crate::credentials::CredentialStore;
use crate::error::ApiError;
use crate::middleware::require_admin;

/// Outcome of the resolve transaction. Only `Resolved` wrote anything.
enum Resolution {
    Resolved(Status),
    NoStatus,
    AlreadyResolved,
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

/// `None` for absent or blank fields, which partial updates leave alone.
fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Owns posts, their status and the notifications they emit. Every
/// multi-row change runs in one transaction.
#[derive(Clone)]
pub struct PostLifecycle {
    db: Arc<Database>,
    credentials: CredentialStore,
}

impl PostLifecycle {
    pub fn new(db: Arc<Database>, credentials: CredentialStore) -> Self {
        Self { db, credentials }
    }

    /// Insert the post, its open status and the "new post" notification
    /// together; returns the post with its status.
    pub fn create_post(
        &self,
        author_id: UserId,
        req: &CreatePostRequest,
    ) -> Result<Post, ApiError> {
        let new_post = NewPost {
            author_id,
            title: required(&req.title, "title")?,
            description: required(&req.description, "description")?,
            room: required(&req.room, "room")?,
            image_url: required(&req.image_url, "image_url")?,
            item_type: req.item_type,
        };

        let post = self
            .db
            .with_tx(|tx| {
                let post_id = queries::insert_post(tx, &new_post)?;
                queries::insert_status(tx, post_id, author_id)?;

                let message = format!(
                    "New post created by admin (ID: {}): {}",
                    author_id, new_post.title
                );
                queries::insert_notification(tx, post_id, NotificationKind::NewPost, &message)?;

                let row = queries::find_post(tx, post_id)?
                    .ok_or_else(|| anyhow!("post {post_id} missing after insert"))?;
                let status = queries::find_status_by_post(tx, post_id)?
                    .ok_or_else(|| anyhow!("status for post {post_id} missing after insert"))?;
                row.into_post(status)
            })
            .map_err(ApiError::storage("Failed to create post"))?;

        info!(
            "Post {} '{}' ({}) created by user {}",
            post.id, post.title, post.item_type, author_id
        );
        Ok(post)
    }

    pub fn list_posts(&self) -> Result<Vec<PostSummary>, ApiError> {
        let rows = self
            .db
            .list_posts()
            .map_err(ApiError::storage("Failed to retrieve posts"))?;

        rows.into_iter()
            .map(|row| {
                let item_type = row
                    .post
                    .item_type()
                    .map_err(ApiError::storage("Failed to retrieve posts"))?;
                Ok(PostSummary {
                    id: row.post.id,
                    username: row.author_username.unwrap_or_else(|| "unknown".to_string()),
                    title: row.post.title,
                    description: row.post.description,
                    room: row.post.room,
                    image_url: row.post.image_url,
                    item_type,
                    created_at: lostfound_db::models::parse_timestamp(&row.post.created_at),
                    status: row.status,
                })
            })
            .collect()
    }

    pub fn get_post(&self, id: PostId) -> Result<Post, ApiError> {
        let (row, status) = self
            .db
            .get_post(id)
            .map_err(ApiError::storage("Failed to retrieve post"))?
            .ok_or(ApiError::NotFound("Post"))?;

        let status = status.ok_or_else(|| ApiError::Storage {
            context: "Failed to retrieve post",
            cause: anyhow!("post {id} has no status row"),
        })?;

        row.into_post(status)
            .map_err(ApiError::storage("Failed to retrieve post"))
    }

    /// Admin only. Blank fields are ignored; status and notifications are
    /// not touched.
    pub fn update_post(
        &self,
        caller: UserId,
        id: PostId,
        req: &UpdatePostRequest,
    ) -> Result<Post, ApiError> {
        require_admin(&self.credentials, caller, "update posts")?;

        let changes = PostChanges {
            title: supplied(&req.title),
            description: supplied(&req.description),
            room: supplied(&req.room),
            image_url: supplied(&req.image_url),
        };

        if !changes.is_empty() {
            let updated = self
                .db
                .with_conn(|conn| queries::update_post(conn, id, &changes))
                .map_err(ApiError::storage("Failed to update post"))?;
            if !updated {
                return Err(ApiError::NotFound("Post"));
            }
            info!("Post {} updated by user {}", id, caller);
        }

        self.get_post(id)
    }

    /// Admin only. Notifications that referenced the post are kept.
    pub fn delete_post(&self, caller: UserId, id: PostId) -> Result<(), ApiError> {
        require_admin(&self.credentials, caller, "delete posts")?;

        let deleted = self
            .db
            .with_conn(|conn| queries::delete_post(conn, id))
            .map_err(ApiError::storage("Failed to delete post"))?;
        if !deleted {
            return Err(ApiError::NotFound("Post"));
        }

        info!("Post {} deleted by user {}", id, caller);
        Ok(())
    }

    /// Admin only. Moves the post from open to resolved and appends the
    /// resolution notification in one transaction. A post that is already
    /// resolved is refused with `Conflict` and left as it is.
    pub fn mark_resolved(
        &self,
        caller: UserId,
        id: PostId,
        claimer_name: &str,
        proof_image: Option<&str>,
    ) -> Result<Status, ApiError> {
        require_admin(&self.credentials, caller, "mark posts as done")?;
        let claimer_name = required(claimer_name, "claimer_name")?;
        let proof_image = proof_image.filter(|p| !p.trim().is_empty());

        let resolution = self
            .db
            .with_tx(|tx| {
                if queries::find_status_by_post(tx, id)?.is_none() {
                    return Ok(Resolution::NoStatus);
                }
                if queries::resolve_status(tx, id, claimer_name, proof_image, caller)? == 0 {
                    return Ok(Resolution::AlreadyResolved);
                }

                let title = queries::find_post(tx, id)?
                    .map(|post| post.title)
                    .unwrap_or_default();
                let message = format!("Report '{title}' resolved by Admin");
                queries::insert_notification(tx, id, NotificationKind::Claim, &message)?;

                let status = queries::find_status_by_post(tx, id)?
                    .ok_or_else(|| anyhow!("status for post {id} vanished"))?;
                Ok(Resolution::Resolved(status.into_status()))
            })
            .map_err(ApiError::storage("Failed to update post status"))?;

        match resolution {
            Resolution::Resolved(status) => {
                info!(
                    "Post {} moved to {:?} by user {} (claimer: {})",
                    id,
                    status.state(),
                    caller,
                    claimer_name
                );
                Ok(status)
            }
            Resolution::NoStatus => Err(ApiError::NotFound("Status for this post")),
            Resolution::AlreadyResolved => {
                Err(ApiError::Conflict("Post is already marked as done".into()))
            }
        }
    }

    /// Distinct rooms across all posts, in no particular order.
    pub fn list_distinct_locations(&self) -> Result<Vec<String>, ApiError> {
        self.db
            .distinct_rooms()
            .map_err(ApiError::storage("Failed to fetch unique locations"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lostfound_types::models::{ItemType, PostState};

    struct Fixture {
        db: Arc<Database>,
        lifecycle: PostLifecycle,
        admin: UserId,
        member: UserId,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let credentials = CredentialStore::new(db.clone());
        let admin = credentials.create_user("admin", "pw").unwrap().id;
        db.set_admin(admin, true).unwrap();
        let member = credentials.create_user("member", "pw").unwrap().id;

        Fixture {
            lifecycle: PostLifecycle::new(db.clone(), credentials),
            db,
            admin,
            member,
        }
    }

    fn wallet() -> CreatePostRequest {
        CreatePostRequest {
            title: "Lost wallet".into(),
            description: "Brown leather, near the stairs".into(),
            room: "B101".into(),
            image_url: "https://img.example/wallet.png".into(),
            item_type: ItemType::Lost,
        }
    }

    fn notification_count(db: &Database, post_id: PostId) -> usize {
        db.notifications_for_post(post_id).unwrap().len()
    }

    #[test]
    fn create_post_opens_status_and_notifies_once() {
        let f = fixture();
        let post = f.lifecycle.create_post(f.member, &wallet()).unwrap();

        assert_eq!(post.status.state(), Some(PostState::Open));
        assert_eq!(post.status.updated_by, f.member);

        let notifications = f.db.notifications_for_post(post.id).unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].message,
            format!("New post created by admin (ID: {}): Lost wallet", f.member)
        );
        assert_eq!(notifications[0].kind.as_deref(), Some("new_post"));
    }

    #[test]
    fn create_post_requires_every_field() {
        let f = fixture();
        let mut req = wallet();
        req.room = "  ".into();
        assert!(matches!(
            f.lifecycle.create_post(f.member, &req),
            Err(ApiError::Validation(_))
        ));
        assert!(f.lifecycle.list_posts().unwrap().is_empty());
    }

    #[test]
    fn failed_notification_rolls_back_post_creation() {
        let f = fixture();
        f.db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER fail_notify BEFORE INSERT ON notifications
                 BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        let err = f.lifecycle.create_post(f.member, &wallet()).unwrap_err();
        assert!(matches!(err, ApiError::Storage { .. }));
        assert!(f.lifecycle.list_posts().unwrap().is_empty());
        let statuses: i64 = f
            .db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM statuses", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(statuses, 0);
    }

    #[test]
    fn resolve_lifecycle_end_to_end() {
        let f = fixture();
        let post = f.lifecycle.create_post(f.member, &wallet()).unwrap();

        let listed = f.lifecycle.list_posts().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Lost wallet");
        assert_eq!(listed[0].status, 1);
        assert_eq!(listed[0].username, "member");

        let status = f
            .lifecycle
            .mark_resolved(f.admin, post.id, "Bob", Some("https://img.example/proof.png"))
            .unwrap();
        assert_eq!(status.status, 0);
        assert_eq!(status.state(), Some(PostState::Resolved));
        assert_eq!(status.claimer_name.as_deref(), Some("Bob"));
        assert_eq!(status.proof_image.as_deref(), Some("https://img.example/proof.png"));
        assert_eq!(status.updated_by, f.admin);

        assert_eq!(f.lifecycle.get_post(post.id).unwrap().status.status, 0);

        let notifications = f.db.notifications_for_post(post.id).unwrap();
        assert_eq!(notifications.len(), 2);
        assert!(notifications.iter().any(|n| n.message == "Report 'Lost wallet' resolved by Admin"));
    }

    #[test]
    fn resolve_is_atomic_when_notification_fails() {
        let f = fixture();
        let post = f.lifecycle.create_post(f.member, &wallet()).unwrap();
        f.db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER fail_notify BEFORE INSERT ON notifications
                 BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        let err = f.lifecycle.mark_resolved(f.admin, post.id, "Bob", None).unwrap_err();
        assert!(matches!(err, ApiError::Storage { .. }));

        let reread = f.lifecycle.get_post(post.id).unwrap();
        assert_eq!(reread.status.status, 1);
        assert!(reread.status.claimer_name.is_none());
        assert_eq!(reread.status.updated_by, f.member);
        assert_eq!(notification_count(&f.db, post.id), 1);
    }

    #[test]
    fn second_resolution_is_a_conflict() {
        let f = fixture();
        let post = f.lifecycle.create_post(f.member, &wallet()).unwrap();
        f.lifecycle.mark_resolved(f.admin, post.id, "Bob", None).unwrap();

        let err = f.lifecycle.mark_resolved(f.admin, post.id, "Mallory", None).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let status = f.lifecycle.get_post(post.id).unwrap().status;
        assert_eq!(status.claimer_name.as_deref(), Some("Bob"));
        assert_eq!(notification_count(&f.db, post.id), 2);
    }

    #[test]
    fn non_admin_is_forbidden_from_mutations() {
        let f = fixture();
        let post = f.lifecycle.create_post(f.member, &wallet()).unwrap();
        let update = UpdatePostRequest {
            title: Some("Mine now".into()),
            ..Default::default()
        };

        assert!(matches!(
            f.lifecycle.update_post(f.member, post.id, &update),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            f.lifecycle.delete_post(f.member, post.id),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            f.lifecycle.mark_resolved(f.member, post.id, "Bob", None),
            Err(ApiError::Forbidden(_))
        ));
        assert_eq!(f.lifecycle.get_post(post.id).unwrap().title, "Lost wallet");
    }

    #[test]
    fn admin_revocation_takes_effect_immediately() {
        let f = fixture();
        let post = f.lifecycle.create_post(f.member, &wallet()).unwrap();
        f.db.set_admin(f.admin, false).unwrap();

        assert!(matches!(
            f.lifecycle.delete_post(f.admin, post.id),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn unknown_post_is_not_found() {
        let f = fixture();
        let update = UpdatePostRequest {
            title: Some("x".into()),
            ..Default::default()
        };

        assert!(matches!(f.lifecycle.get_post(999), Err(ApiError::NotFound(_))));
        assert!(matches!(
            f.lifecycle.update_post(f.admin, 999, &update),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            f.lifecycle.update_post(f.admin, 999, &UpdatePostRequest::default()),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(f.lifecycle.delete_post(f.admin, 999), Err(ApiError::NotFound(_))));
        assert!(matches!(
            f.lifecycle.mark_resolved(f.admin, 999, "Bob", None),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn partial_update_ignores_blank_fields() {
        let f = fixture();
        let post = f.lifecycle.create_post(f.member, &wallet()).unwrap();
        let update = UpdatePostRequest {
            title: Some("Found wallet".into()),
            description: Some(String::new()),
            room: None,
            image_url: Some("   ".into()),
        };

        let updated = f.lifecycle.update_post(f.admin, post.id, &update).unwrap();
        assert_eq!(updated.title, "Found wallet");
        assert_eq!(updated.description, post.description);
        assert_eq!(updated.room, "B101");
        assert_eq!(updated.image_url, post.image_url);
        assert_eq!(updated.status.status, 1);
        assert_eq!(notification_count(&f.db, post.id), 1);
    }

    #[test]
    fn delete_keeps_notifications() {
        let f = fixture();
        let post = f.lifecycle.create_post(f.member, &wallet()).unwrap();
        f.lifecycle.delete_post(f.admin, post.id).unwrap();

        assert!(matches!(f.lifecycle.get_post(post.id), Err(ApiError::NotFound(_))));
        let all = f.db.list_notifications().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].post_id.is_none());
    }

    #[test]
    fn locations_are_distinct() {
        let f = fixture();
        f.lifecycle.create_post(f.member, &wallet()).unwrap();
        f.lifecycle.create_post(f.member, &wallet()).unwrap();
        let mut umbrella = wallet();
        umbrella.room = "Library".into();
        f.lifecycle.create_post(f.member, &umbrella).unwrap();

        let mut rooms = f.lifecycle.list_distinct_locations().unwrap();
        rooms.sort();
        assert_eq!(rooms, vec!["B101", "Library"]);
    }

    #[test]
    fn empty_store_lists_nothing() {
        let f = fixture();
        assert!(f.lifecycle.list_posts().unwrap().is_empty());
        assert!(f.lifecycle.list_distinct_locations().unwrap().is_empty());
    }
}
