//! Follow service.

use quill_common::{AppResult, IdGenerator};
use quill_db::{
    entities::follow,
    repositories::{FollowRepository, UserRepository},
};
use sea_orm::Set;

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Outcome of a follow operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    /// A new follow relationship was created.
    Followed,
    /// The relationship already existed; nothing was created.
    AlreadyFollowing,
    /// The target is the caller; no relationship is ever created.
    SelfFollow,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow an author resolved by username.
    ///
    /// Get-or-create: a (user, author) pair exists at most once, so a repeat
    /// follow reports [`FollowOutcome::AlreadyFollowing`] instead of adding a
    /// row. Self-follow is detected by comparing user IDs and never creates
    /// a relationship.
    pub async fn follow(&self, user_id: &str, author_username: &str) -> AppResult<FollowOutcome> {
        let author = self.user_repo.get_by_username(author_username).await?;

        if author.id == user_id {
            tracing::debug!(user_id = %user_id, "Ignored self-follow attempt");
            return Ok(FollowOutcome::SelfFollow);
        }

        if self.follow_repo.is_following(user_id, &author.id).await? {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            author_id: Set(author.id.clone()),
            ..Default::default()
        };

        self.follow_repo.create(model).await?;
        tracing::debug!(user_id = %user_id, author_id = %author.id, "Created follow");

        Ok(FollowOutcome::Followed)
    }

    /// Unfollow an author resolved by username.
    ///
    /// Unfollowing an author that was never followed is a no-op success.
    pub async fn unfollow(&self, user_id: &str, author_username: &str) -> AppResult<()> {
        let author = self.user_repo.get_by_username(author_username).await?;

        self.follow_repo.delete_by_pair(user_id, &author.id).await?;
        tracing::debug!(user_id = %user_id, author_id = %author.id, "Removed follow");

        Ok(())
    }

    /// Check if a user is following an author.
    pub async fn is_following(&self, user_id: &str, author_id: &str) -> AppResult<bool> {
        self.follow_repo.is_following(user_id, author_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quill_db::entities::user;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            token: None,
            name: None,
            bio: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_follow(id: &str, user_id: &str, author_id: &str) -> follow::Model {
        follow::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            author_id: author_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_self_follow_creates_nothing() {
        // Target username resolves to the caller's own ID
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1", "leo")]])
                .into_connection(),
        );
        // No follow queries expected at all
        let follow_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = FollowService::new(
            FollowRepository::new(follow_db),
            UserRepository::new(user_db),
        );
        let outcome = service.follow("u1", "leo").await.unwrap();

        assert_eq!(outcome, FollowOutcome::SelfFollow);
    }

    #[tokio::test]
    async fn test_follow_twice_is_idempotent() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u2", "mara")]])
                .into_connection(),
        );
        // The pair already exists, so no insert happens
        let follow_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_follow("f1", "u1", "u2")]])
                .into_connection(),
        );

        let service = FollowService::new(
            FollowRepository::new(follow_db),
            UserRepository::new(user_db),
        );
        let outcome = service.follow("u1", "mara").await.unwrap();

        assert_eq!(outcome, FollowOutcome::AlreadyFollowing);
    }

    #[tokio::test]
    async fn test_follow_creates_relationship() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u2", "mara")]])
                .into_connection(),
        );
        let follow_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // No existing pair
                .append_query_results([Vec::<follow::Model>::new()])
                // Insert returns the created row
                .append_query_results([[create_test_follow("f1", "u1", "u2")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = FollowService::new(
            FollowRepository::new(follow_db),
            UserRepository::new(user_db),
        );
        let outcome = service.follow("u1", "mara").await.unwrap();

        assert_eq!(outcome, FollowOutcome::Followed);
    }

    #[tokio::test]
    async fn test_follow_unknown_user_is_not_found() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let follow_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = FollowService::new(
            FollowRepository::new(follow_db),
            UserRepository::new(user_db),
        );
        let result = service.follow("u1", "nobody").await;

        assert!(matches!(
            result,
            Err(quill_common::AppError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unfollow_without_follow_is_noop() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u2", "mara")]])
                .into_connection(),
        );
        let follow_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow::Model>::new()])
                .into_connection(),
        );

        let service = FollowService::new(
            FollowRepository::new(follow_db),
            UserRepository::new(user_db),
        );

        service.unfollow("u1", "mara").await.unwrap();
    }

    #[tokio::test]
    async fn test_unfollow_removes_relationship() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u2", "mara")]])
                .into_connection(),
        );
        let follow_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_follow("f1", "u1", "u2")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = FollowService::new(
            FollowRepository::new(follow_db),
            UserRepository::new(user_db),
        );

        service.unfollow("u1", "mara").await.unwrap();
    }
}
