//! Like repository.

use std::sync::Arc;

use crate::entities::{Like, like};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, SqlErr,
};
use snapfeed_common::{AppError, AppResult};

/// Detects a violation of the (user_id, post_id) unique index.
///
/// Sqlite surfaces the violation only in the message text, so the error
/// kind check alone is not enough.
fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    let msg = err.to_string();
    msg.contains("duplicate key value violates unique constraint")
        || msg.contains("UNIQUE constraint failed")
}

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a like by user and post.
    pub async fn find_by_user_and_post(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<like::Model>> {
        Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user has liked a post.
    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_user_and_post(user_id, post_id)
            .await?
            .is_some())
    }

    /// Create a new like.
    ///
    /// A violation of the (`user_id`, `post_id`) unique index surfaces as
    /// `Conflict`, so callers can treat a raced duplicate as already liked.
    pub async fn create(&self, model: like::ActiveModel) -> AppResult<like::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Like already exists".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete a like by user and post.
    pub async fn delete_by_user_and_post(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        let like = self.find_by_user_and_post(user_id, post_id).await?;
        if let Some(l) = like {
            l.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Count likes on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        Like::find()
            .filter(like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All likes on the given posts (batch fetch for feed annotation).
    pub async fn find_by_posts(&self, post_ids: &[String]) -> AppResult<Vec<like::Model>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        Like::find()
            .filter(like::Column::PostId.is_in(post_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
