//! Following service.

use std::collections::HashMap;

use crate::services::event_publisher::EventPublisherService;
use pictogram_common::{AppError, AppResult};
use pictogram_db::{
    entities::{following, user},
    repositories::{FollowingRepository, UserRepository},
};
use sea_orm::{NotSet, Set};

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    following_repo: FollowingRepository,
    user_repo: UserRepository,
    event_publisher: Option<EventPublisherService>,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(following_repo: FollowingRepository, user_repo: UserRepository) -> Self {
        Self {
            following_repo,
            user_repo,
            event_publisher: None,
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Follow a user. Idempotent: following someone already followed is a no-op.
    pub async fn follow(&self, follower_id: i64, followee_id: i64) -> AppResult<()> {
        // Followee must exist; the follower comes from an authenticated session
        self.user_repo.get_by_id(followee_id).await?;

        if self
            .following_repo
            .is_following(follower_id, followee_id)
            .await?
        {
            return Ok(());
        }

        let model = following::ActiveModel {
            id: NotSet,
            follower_id: Set(follower_id),
            followee_id: Set(followee_id),
            created_at: NotSet,
        };

        match self.following_repo.create(model).await {
            Ok(_) => {}
            // Lost an insert race; the edge exists, which is what we wanted
            Err(AppError::Conflict(_)) => return Ok(()),
            Err(e) => return Err(e),
        }

        if let Some(ref event_publisher) = self.event_publisher
            && let Err(e) = event_publisher
                .publish_followed(follower_id, followee_id)
                .await
        {
            tracing::warn!(error = %e, "Failed to publish followed event");
        }

        Ok(())
    }

    /// Unfollow a user. Idempotent: unfollowing someone not followed is a no-op.
    pub async fn unfollow(&self, follower_id: i64, followee_id: i64) -> AppResult<()> {
        self.user_repo.get_by_id(followee_id).await?;

        if !self
            .following_repo
            .is_following(follower_id, followee_id)
            .await?
        {
            return Ok(());
        }

        self.following_repo
            .delete_by_pair(follower_id, followee_id)
            .await?;

        if let Some(ref event_publisher) = self.event_publisher
            && let Err(e) = event_publisher
                .publish_unfollowed(follower_id, followee_id)
                .await
        {
            tracing::warn!(error = %e, "Failed to publish unfollowed event");
        }

        Ok(())
    }

    /// Check if a user is following another.
    pub async fn is_following(&self, follower_id: i64, followee_id: i64) -> AppResult<bool> {
        self.following_repo
            .is_following(follower_id, followee_id)
            .await
    }

    /// Get the users a user is following (paginated, newest edges first).
    pub async fn get_following(
        &self,
        user_id: i64,
        limit: u64,
        until_id: Option<i64>,
    ) -> AppResult<Vec<user::Model>> {
        let edges = self
            .following_repo
            .find_following(user_id, limit, until_id)
            .await?;
        self.resolve_users(edges.iter().map(|e| e.followee_id).collect())
            .await
    }

    /// Get the followers of a user (paginated, newest edges first).
    pub async fn get_followers(
        &self,
        user_id: i64,
        limit: u64,
        until_id: Option<i64>,
    ) -> AppResult<Vec<user::Model>> {
        let edges = self
            .following_repo
            .find_followers(user_id, limit, until_id)
            .await?;
        self.resolve_users(edges.iter().map(|e| e.follower_id).collect())
            .await
    }

    /// Count followers of a user.
    pub async fn count_followers(&self, user_id: i64) -> AppResult<u64> {
        self.following_repo.count_followers(user_id).await
    }

    /// Count users a user is following.
    pub async fn count_following(&self, user_id: i64) -> AppResult<u64> {
        self.following_repo.count_following(user_id).await
    }

    /// Resolve user IDs to models, preserving the input order.
    async fn resolve_users(&self, ids: Vec<i64>) -> AppResult<Vec<user::Model>> {
        let users = self.user_repo.find_by_ids(&ids).await?;
        let mut by_id: HashMap<i64, user::Model> =
            users.into_iter().map(|u| (u.id, u)).collect();
        Ok(ids.into_iter().filter_map(|id| by_id.remove(&id)).collect())
    }
}
