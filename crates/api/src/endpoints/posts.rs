//! Post endpoints: timeline, creation, likes, comments.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use pictogram_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Post representation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub user_id: i64,
    pub image: String,
    pub caption: Option<String>,
    pub created_at: String,
}

impl From<pictogram_db::entities::post::Model> for PostResponse {
    fn from(p: pictogram_db::entities::post::Model) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            image: p.image,
            caption: p.caption,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Post with interaction counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub like_count: u64,
    pub comment_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked_by_me: Option<bool>,
}

/// Create post request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub image: String,
    pub caption: Option<String>,
}

/// Create a new post.
async fn create_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state
        .post_service
        .create_post(user.id, &req.image, req.caption.as_deref())
        .await?;

    Ok(ApiResponse::ok(post.into()))
}

/// Timeline params.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<i64>,
    pub user_id: Option<i64>,
}

const fn default_limit() -> u64 {
    20
}

/// Get the newest-first timeline, optionally filtered to one user.
async fn timeline(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let limit = query.limit.min(100);
    let posts = match query.user_id {
        Some(user_id) => {
            state
                .post_service
                .get_user_posts(user_id, limit, query.until_id)
                .await?
        }
        None => state.post_service.get_timeline(limit, query.until_id).await?,
    };

    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

/// Get a post with its interaction counts.
async fn show(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<ApiResponse<PostDetailResponse>> {
    let post = state.post_service.get_post(post_id).await?;
    let like_count = state.interaction_service.count_likes(post_id).await?;
    let comment_count = state.interaction_service.count_comments(post_id).await?;

    let liked_by_me = match user {
        Some(u) => Some(state.interaction_service.has_liked(u.id, post_id).await?),
        None => None,
    };

    Ok(ApiResponse::ok(PostDetailResponse {
        post: post.into(),
        like_count,
        comment_count,
        liked_by_me,
    }))
}

/// Like toggle response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: u64,
}

/// Toggle a like on a post.
async fn toggle_like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<ApiResponse<LikeResponse>> {
    let liked = state.interaction_service.toggle_like(user.id, post_id).await?;
    let like_count = state.interaction_service.count_likes(post_id).await?;

    Ok(ApiResponse::ok(LikeResponse { liked, like_count }))
}

/// Comment representation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: String,
}

impl From<pictogram_db::entities::comment::Model> for CommentResponse {
    fn from(c: pictogram_db::entities::comment::Model) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            post_id: c.post_id,
            content: c.content,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Add comment request.
#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub content: String,
}

/// Add a comment to a post.
async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(req): Json<AddCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state
        .interaction_service
        .add_comment(user.id, post_id, &req.content)
        .await?;

    Ok(ApiResponse::ok(comment.into()))
}

/// Get comments on a post, oldest first.
async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state.interaction_service.get_comments(post_id).await?;

    Ok(ApiResponse::ok(
        comments.into_iter().map(Into::into).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post).get(timeline))
        .route("/{id}", get(show))
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/comments", post(add_comment).get(list_comments))
}
