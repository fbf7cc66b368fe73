pub mod auth;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod formatter;
pub mod lifecycle;
pub mod middleware;
pub mod notifications;
pub mod posts;
pub mod session;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use tracing::error;

use lostfound_db::Database;

use crate::credentials::CredentialStore;
use crate::error::ApiError;
use crate::lifecycle::PostLifecycle;
use crate::session::{SessionConfig, SessionManager};

pub type AppState = Arc<AppContext>;

/// Everything a request needs, built once at startup and passed down
/// explicitly.
pub struct AppContext {
    pub db: Arc<Database>,
    pub credentials: CredentialStore,
    pub sessions: SessionManager,
    pub posts: PostLifecycle,
}

impl AppContext {
    pub fn new(db: Database, session: &SessionConfig) -> Self {
        let db = Arc::new(db);
        let credentials = CredentialStore::new(db.clone());
        Self {
            posts: PostLifecycle::new(db.clone(), credentials.clone()),
            sessions: SessionManager::new(session),
            credentials,
            db,
        }
    }
}

/// Run blocking store work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Storage {
            context: "Request worker failed",
            cause: e.into(),
        }
    })?
}

/// All routes under `/api`. CORS and tracing layers are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/guest-login", post(auth::guest_login))
        .route("/locations", get(posts::list_locations))
        .route("/posts", get(posts::list_posts))
        .route("/posts/{id}", get(posts::get_post));

    let protected_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route("/notifications", get(notifications::list_notifications))
        .route("/posts", post(posts::create_post))
        .route("/posts/{id}", put(posts::update_post).delete(posts::delete_post))
        .route("/posts/{id}/done", put(posts::mark_done))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .with_state(state)
}
