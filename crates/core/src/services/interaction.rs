//! Interaction service for likes and comments on posts.

use pictogram_common::{AppError, AppResult};
use pictogram_db::{
    entities::{comment, like},
    repositories::{CommentRepository, LikeRepository, PostRepository},
};
use sea_orm::{NotSet, Set};

/// Maximum comment length in characters.
const MAX_COMMENT_LENGTH: usize = 300;

/// Interaction service for business logic.
#[derive(Clone)]
pub struct InteractionService {
    like_repo: LikeRepository,
    comment_repo: CommentRepository,
    post_repo: PostRepository,
}

impl InteractionService {
    /// Create a new interaction service.
    #[must_use]
    pub const fn new(
        like_repo: LikeRepository,
        comment_repo: CommentRepository,
        post_repo: PostRepository,
    ) -> Self {
        Self {
            like_repo,
            comment_repo,
            post_repo,
        }
    }

    /// Toggle a like on a post.
    ///
    /// Returns `true` when the post is liked after the call, `false` when
    /// the like was removed. Two racing toggles resolve through the unique
    /// index on (user, post): the loser of the insert race sees the
    /// conflict and takes the unlike arm.
    pub async fn toggle_like(&self, user_id: i64, post_id: i64) -> AppResult<bool> {
        self.post_repo.get_by_id(post_id).await?;

        if self.like_repo.has_liked(user_id, post_id).await? {
            self.like_repo
                .delete_by_user_and_post(user_id, post_id)
                .await?;
            return Ok(false);
        }

        let model = like::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            post_id: Set(post_id),
            created_at: NotSet,
        };

        match self.like_repo.create(model).await {
            Ok(_) => Ok(true),
            // Lost an insert race; the like exists, so toggle it off
            Err(AppError::Conflict(_)) => {
                self.like_repo
                    .delete_by_user_and_post(user_id, post_id)
                    .await?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Check if a user has liked a post.
    pub async fn has_liked(&self, user_id: i64, post_id: i64) -> AppResult<bool> {
        self.like_repo.has_liked(user_id, post_id).await
    }

    /// Count likes on a post.
    pub async fn count_likes(&self, post_id: i64) -> AppResult<u64> {
        self.like_repo.count_by_post(post_id).await
    }

    /// Add a comment to a post.
    pub async fn add_comment(
        &self,
        user_id: i64,
        post_id: i64,
        content: &str,
    ) -> AppResult<comment::Model> {
        if content.trim().is_empty() {
            return Err(AppError::Validation(
                "Comment content cannot be empty".to_string(),
            ));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(AppError::Validation(format!(
                "Comment content exceeds {MAX_COMMENT_LENGTH} characters"
            )));
        }

        self.post_repo.get_by_id(post_id).await?;

        let model = comment::ActiveModel {
            id: NotSet,
            content: Set(content.to_string()),
            user_id: Set(user_id),
            post_id: Set(post_id),
            created_at: NotSet,
        };

        self.comment_repo.create(model).await
    }

    /// Get comments on a post, oldest first.
    pub async fn get_comments(&self, post_id: i64) -> AppResult<Vec<comment::Model>> {
        self.post_repo.get_by_id(post_id).await?;
        self.comment_repo.find_by_post(post_id).await
    }

    /// Count comments on a post.
    pub async fn count_comments(&self, post_id: i64) -> AppResult<u64> {
        self.comment_repo.count_by_post(post_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pictogram_db::entities::post;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_post(id: i64, user_id: i64) -> post::Model {
        post::Model {
            id,
            user_id,
            image: format!("photo_{id}.png"),
            caption: Some("caption".to_string()),
            created_at: Utc::now().into(),
        }
    }

    fn create_test_like(id: i64, user_id: i64, post_id: i64) -> like::Model {
        like::Model {
            id,
            user_id,
            post_id,
            created_at: Utc::now().into(),
        }
    }

    fn service(
        like_db: Arc<sea_orm::DatabaseConnection>,
        comment_db: Arc<sea_orm::DatabaseConnection>,
        post_db: Arc<sea_orm::DatabaseConnection>,
    ) -> InteractionService {
        InteractionService::new(
            LikeRepository::new(like_db),
            CommentRepository::new(comment_db),
            PostRepository::new(post_db),
        )
    }

    #[tokio::test]
    async fn test_toggle_like_creates_like() {
        let like = create_test_like(1, 1, 5);

        let like_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // not liked yet, then the insert returning the new like
                .append_query_results([Vec::<like::Model>::new(), vec![like]])
                .into_connection(),
        );
        let comment_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post(5, 2)]])
                .into_connection(),
        );

        let liked = service(like_db, comment_db, post_db)
            .toggle_like(1, 5)
            .await
            .unwrap();

        assert!(liked);
    }

    #[tokio::test]
    async fn test_toggle_like_removes_existing_like() {
        let like = create_test_like(1, 1, 5);

        let like_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // has_liked finds the like, then the delete path re-reads it
                .append_query_results([vec![like.clone()], vec![like]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let comment_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post(5, 2)]])
                .into_connection(),
        );

        let liked = service(like_db, comment_db, post_db)
            .toggle_like(1, 5)
            .await
            .unwrap();

        assert!(!liked);
    }

    #[tokio::test]
    async fn test_toggle_like_missing_post_fails() {
        let like_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let comment_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let result = service(like_db, comment_db, post_db).toggle_like(1, 99).await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_add_comment_blank_fails() {
        let like_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let comment_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let post_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(like_db, comment_db, post_db)
            .add_comment(1, 5, "   ")
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_comment_too_long_fails() {
        let like_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let comment_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let post_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let content = "x".repeat(MAX_COMMENT_LENGTH + 1);
        let result = service(like_db, comment_db, post_db)
            .add_comment(1, 5, &content)
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_comment_persists() {
        let comment = comment::Model {
            id: 1,
            content: "nice shot".to_string(),
            user_id: 1,
            post_id: 5,
            created_at: Utc::now().into(),
        };

        let like_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let comment_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment]])
                .into_connection(),
        );
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post(5, 2)]])
                .into_connection(),
        );

        let created = service(like_db, comment_db, post_db)
            .add_comment(1, 5, "nice shot")
            .await
            .unwrap();

        assert_eq!(created.content, "nice shot");
        assert_eq!(created.post_id, 5);
    }
}
