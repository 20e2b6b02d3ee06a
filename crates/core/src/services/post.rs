//! Post service.

use pictogram_common::{AppError, AppResult};
use pictogram_db::{
    entities::post,
    repositories::{PostRepository, UserRepository},
};
use sea_orm::{NotSet, Set};

/// Maximum caption length in characters.
const MAX_CAPTION_LENGTH: usize = 300;

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(post_repo: PostRepository, user_repo: UserRepository) -> Self {
        Self {
            post_repo,
            user_repo,
        }
    }

    /// Create a new post.
    pub async fn create_post(
        &self,
        user_id: i64,
        image: &str,
        caption: Option<&str>,
    ) -> AppResult<post::Model> {
        if image.trim().is_empty() {
            return Err(AppError::Validation("Post image is required".to_string()));
        }
        if let Some(caption) = caption
            && caption.chars().count() > MAX_CAPTION_LENGTH
        {
            return Err(AppError::Validation(format!(
                "Caption exceeds {MAX_CAPTION_LENGTH} characters"
            )));
        }

        self.user_repo.get_by_id(user_id).await?;

        let model = post::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            image: Set(image.to_string()),
            caption: Set(caption.map(ToString::to_string)),
            created_at: NotSet,
        };

        self.post_repo.create(model).await
    }

    /// Get a post by ID.
    pub async fn get_post(&self, post_id: i64) -> AppResult<post::Model> {
        self.post_repo.get_by_id(post_id).await
    }

    /// Get the newest-first timeline (paginated).
    pub async fn get_timeline(
        &self,
        limit: u64,
        until_id: Option<i64>,
    ) -> AppResult<Vec<post::Model>> {
        self.post_repo.find_timeline(limit, until_id).await
    }

    /// Get posts by a user, newest first (paginated).
    pub async fn get_user_posts(
        &self,
        user_id: i64,
        limit: u64,
        until_id: Option<i64>,
    ) -> AppResult<Vec<post::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        self.post_repo.find_by_user(user_id, limit, until_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pictogram_db::entities::user;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: i64, username: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{username}@example.com"),
            token: None,
            bio: String::new(),
            profile_pic: "default.png".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn create_test_post(id: i64, user_id: i64) -> post::Model {
        post::Model {
            id,
            user_id,
            image: format!("photo_{id}.png"),
            caption: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_post_blank_image_fails() {
        let post_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = PostService::new(PostRepository::new(post_db), UserRepository::new(user_db));
        let result = service.create_post(1, "  ", None).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_post_long_caption_fails() {
        let post_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = PostService::new(PostRepository::new(post_db), UserRepository::new(user_db));
        let caption = "x".repeat(MAX_CAPTION_LENGTH + 1);
        let result = service.create_post(1, "photo.png", Some(&caption)).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_post_persists() {
        let post = create_test_post(1, 1);

        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .into_connection(),
        );

        let service = PostService::new(PostRepository::new(post_db), UserRepository::new(user_db));
        let created = service.create_post(1, "photo_1.png", None).await.unwrap();

        assert_eq!(created.user_id, 1);
    }

    #[tokio::test]
    async fn test_get_timeline() {
        let posts = vec![create_test_post(2, 1), create_test_post(1, 2)];

        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([posts])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = PostService::new(PostRepository::new(post_db), UserRepository::new(user_db));
        let timeline = service.get_timeline(10, None).await.unwrap();

        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].id, 2);
    }
}
