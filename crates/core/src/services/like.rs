//! Like service.

use chrono::Utc;
use sea_orm::Set;
use snapfeed_common::{AppError, AppResult, IdGenerator};
use snapfeed_db::{
    entities::like,
    repositories::{LikeRepository, PostRepository},
};

/// Outcome of a like request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// A new like was recorded.
    Liked,
    /// The user had already liked the post; nothing changed.
    AlreadyLiked,
}

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(like_repo: LikeRepository, post_repo: PostRepository) -> Self {
        Self {
            like_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Like a post. Re-liking is an idempotent no-op, not an error.
    pub async fn like(&self, user_id: &str, post_id: &str) -> AppResult<LikeOutcome> {
        // Check if post exists
        self.post_repo.get_by_id(post_id).await?;

        if self.like_repo.has_liked(user_id, post_id).await? {
            return Ok(LikeOutcome::AlreadyLiked);
        }

        let model = like::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        // A raced duplicate insert loses to the unique index; that is
        // still "already liked", not an error
        match self.like_repo.create(model).await {
            Ok(_) => Ok(LikeOutcome::Liked),
            Err(AppError::Conflict(_)) => Ok(LikeOutcome::AlreadyLiked),
            Err(e) => Err(e),
        }
    }

    /// Remove a like from a post.
    pub async fn unlike(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        // Check if post exists
        self.post_repo.get_by_id(post_id).await?;

        if !self.like_repo.has_liked(user_id, post_id).await? {
            return Err(AppError::NotFound(
                "You have not liked this post yet".to_string(),
            ));
        }

        self.like_repo.delete_by_user_and_post(user_id, post_id).await
    }
}
