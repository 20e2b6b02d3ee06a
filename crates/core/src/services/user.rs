//! User service.

use pictogram_common::{AppError, AppResult};
use pictogram_db::{entities::user, repositories::UserRepository};
use sea_orm::{IntoActiveModel, Set};

/// Maximum bio length in characters.
const MAX_BIO_LENGTH: usize = 150;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Authenticate a user by API token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: i64) -> AppResult<user::Model> {
        self.user_repo.get_by_id(user_id).await
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }

    /// Search users by username substring (case-insensitive).
    pub async fn search(&self, query: &str, limit: u64) -> AppResult<Vec<user::Model>> {
        if query.trim().is_empty() {
            return Ok(vec![]);
        }
        self.user_repo.search_by_username(query.trim(), limit).await
    }

    /// Update a user's profile.
    pub async fn update_profile(
        &self,
        user_id: i64,
        bio: Option<String>,
        profile_pic: Option<String>,
    ) -> AppResult<user::Model> {
        if let Some(ref bio) = bio
            && bio.chars().count() > MAX_BIO_LENGTH
        {
            return Err(AppError::Validation(format!(
                "Bio exceeds {MAX_BIO_LENGTH} characters"
            )));
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut model = user.into_active_model();

        if let Some(bio) = bio {
            model.bio = Set(bio);
        }
        if let Some(profile_pic) = profile_pic {
            model.profile_pic = Set(profile_pic);
        }

        self.user_repo.update(model).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: i64, username: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{username}@example.com"),
            token: Some("token123".to_string()),
            bio: String::new(),
            profile_pic: "default.png".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_authenticate_by_token_found() {
        let user = create_test_user(1, "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let authed = service.authenticate_by_token("token123").await.unwrap();

        assert_eq!(authed.username, "alice");
    }

    #[tokio::test]
    async fn test_authenticate_by_token_invalid() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service.authenticate_by_token("nope").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_search_blank_query_returns_empty() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = UserService::new(UserRepository::new(db));
        let result = service.search("   ", 10).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_update_profile_long_bio_fails() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = UserService::new(UserRepository::new(db));
        let bio = "x".repeat(MAX_BIO_LENGTH + 1);
        let result = service.update_profile(1, Some(bio), None).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
