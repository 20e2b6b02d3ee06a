//! User endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use pictogram_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Public user representation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub bio: String,
    pub profile_pic: String,
    pub created_at: String,
}

impl From<pictogram_db::entities::user::Model> for UserResponse {
    fn from(u: pictogram_db::entities::user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            bio: u.bio,
            profile_pic: u.profile_pic,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// User profile with social counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub followers_count: u64,
    pub following_count: u64,
}

/// User search params.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    10
}

/// Search users by username substring.
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let limit = query.limit.min(100);
    let users = state.user_service.search(&query.q, limit).await?;

    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

/// Get a user's profile by username.
async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let user = state.user_service.get_by_username(&username).await?;
    let followers_count = state.following_service.count_followers(user.id).await?;
    let following_count = state.following_service.count_following(user.id).await?;

    Ok(ApiResponse::ok(ProfileResponse {
        user: user.into(),
        followers_count,
        following_count,
    }))
}

/// Profile update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

/// Update the authenticated user's profile.
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state
        .user_service
        .update_profile(user.id, req.bio, req.profile_pic)
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/profile", post(update_profile))
        .route("/{username}", get(profile))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_user_response_from_model() {
        let model = pictogram_db::entities::user::Model {
            id: 1,
            username: "alice".to_string(),
            username_lower: "alice".to_string(),
            email: "alice@example.com".to_string(),
            token: Some("secret".to_string()),
            bio: "hi".to_string(),
            profile_pic: "default.png".to_string(),
            created_at: Utc::now().into(),
        };

        let response = UserResponse::from(model);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["username"], "alice");
        assert_eq!(json["profilePic"], "default.png");
        // Token and email must never leak into responses
        assert!(json.get("token").is_none());
        assert!(json.get("email").is_none());
    }
}
