//! Comment service.

use chrono::Utc;
use sea_orm::Set;
use snapfeed_common::{AppError, AppResult, IdGenerator};
use snapfeed_db::{
    entities::{comment, user},
    repositories::{CommentRepository, PostRepository},
};

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, post_repo: PostRepository) -> Self {
        Self {
            comment_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment to a post.
    pub async fn create(
        &self,
        user_id: &str,
        post_id: &str,
        content: &str,
    ) -> AppResult<comment::Model> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "Comment content must not be empty".to_string(),
            ));
        }

        // Check if post exists
        self.post_repo.get_by_id(post_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            user_id: Set(user_id.to_string()),
            content: Set(content.to_string()),
            created_at: Set(Utc::now().into()),
        };

        self.comment_repo.create(model).await
    }

    /// Delete a comment. Only the commenter may delete it.
    pub async fn delete(&self, comment_id: &str, user_id: &str) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;

        if comment.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }

        self.comment_repo.delete(comment_id).await
    }

    /// Comments on a post with their authors, oldest first.
    pub async fn list_for_post(
        &self,
        post_id: &str,
    ) -> AppResult<Vec<(comment::Model, Option<user::Model>)>> {
        // Check if post exists
        self.post_repo.get_by_id(post_id).await?;

        self.comment_repo.find_by_post(post_id).await
    }
}
