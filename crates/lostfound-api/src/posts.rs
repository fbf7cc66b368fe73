use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use lostfound_types::api::{
    CreatePostRequest, MarkDoneRequest, MessageResponse, PostEnvelope, StatusEnvelope,
    UpdatePostRequest,
};
use lostfound_types::models::PostId;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::{AppState, blocking};

/// GET /locations
pub async fn list_locations(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.clone();
    let locations = blocking(move || posts.list_distinct_locations()).await?;
    Ok(Json(locations))
}

/// GET /posts
pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.clone();
    let summaries = blocking(move || posts.list_posts()).await?;
    Ok(Json(summaries))
}

/// GET /posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PostId>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.clone();
    let post = blocking(move || posts.get_post(id)).await?;
    Ok(Json(post))
}

/// POST /posts. Any signed-in user may report an item.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.clone();
    let post = blocking(move || posts.create_post(auth.user_id, &req)).await?;

    Ok((
        StatusCode::CREATED,
        Json(PostEnvelope {
            message: "Post created successfully".into(),
            post,
        }),
    ))
}

/// PUT /posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<PostId>,
    ApiJson(req): ApiJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.clone();
    let post = blocking(move || posts.update_post(auth.user_id, id, &req)).await?;

    Ok(Json(PostEnvelope {
        message: "Post updated successfully".into(),
        post,
    }))
}

/// DELETE /posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<PostId>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.clone();
    blocking(move || posts.delete_post(auth.user_id, id)).await?;
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}

/// PUT /posts/{id}/done
pub async fn mark_done(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<PostId>,
    ApiJson(req): ApiJson<MarkDoneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.clone();
    let status = blocking(move || {
        posts.mark_resolved(auth.user_id, id, &req.claimer_name, req.proof_image.as_deref())
    })
    .await?;

    Ok(Json(StatusEnvelope {
        message: "Post marked as done successfully".into(),
        status,
    }))
}
