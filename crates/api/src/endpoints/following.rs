//! Following endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use pictogram_common::AppResult;
use serde::{Deserialize, Serialize};

use super::users::UserResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Follow request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub user_id: i64,
}

/// Follow a user. Following someone already followed is a no-op.
async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> AppResult<ApiResponse<()>> {
    state.following_service.follow(user.id, req.user_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Unfollow a user. Unfollowing someone not followed is a no-op.
async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .following_service
        .unfollow(user.id, req.user_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Follow-state query params.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowQuery {
    pub follower_id: i64,
    pub followee_id: i64,
}

/// Follow-state response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowResponse {
    pub following: bool,
}

/// Check whether one user follows another.
async fn show(
    State(state): State<AppState>,
    Query(query): Query<ShowQuery>,
) -> AppResult<ApiResponse<ShowResponse>> {
    let following = state
        .following_service
        .is_following(query.follower_id, query.followee_id)
        .await?;

    Ok(ApiResponse::ok(ShowResponse { following }))
}

/// List params for followers/following.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: i64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<i64>,
}

const fn default_limit() -> u64 {
    10
}

/// Get followers of a user.
async fn followers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let limit = query.limit.min(100);
    let users = state
        .following_service
        .get_followers(query.user_id, limit, query.until_id)
        .await?;

    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

/// Get users that a user is following.
async fn following(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let limit = query.limit.min(100);
    let users = state
        .following_service
        .get_following(query.user_id, limit, query.until_id)
        .await?;

    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(follow))
        .route("/delete", post(unfollow))
        .route("/show", get(show))
        .route("/followers", get(followers))
        .route("/following", get(following))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_request_deserializes_camel_case() {
        let req: FollowRequest = serde_json::from_str(r#"{"userId": 7}"#).unwrap();
        assert_eq!(req.user_id, 7);
    }

    #[test]
    fn test_show_response_serializes() {
        let json = serde_json::to_value(ShowResponse { following: true }).unwrap();
        assert_eq!(json, serde_json::json!({"following": true}));
    }
}
