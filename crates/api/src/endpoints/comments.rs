//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use snapfeed_common::AppResult;
use snapfeed_db::entities::{comment, user};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::Detail,
};

/// Comment response.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub content: String,
    /// Commenter's email local-part.
    pub user: String,
    pub created_at: String,
    pub is_owner: bool,
}

impl CommentResponse {
    fn new(comment: comment::Model, author: Option<&user::Model>, viewer_id: &str) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            user: author.map(|a| a.display_name().to_string()).unwrap_or_default(),
            created_at: comment.created_at.to_rfc3339(),
            is_owner: comment.user_id == viewer_id,
        }
    }
}

/// Add comment request.
#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub content: String,
}

/// Add a comment to a post.
async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(req): Json<AddCommentRequest>,
) -> AppResult<Json<CommentResponse>> {
    let comment = state
        .comment_service
        .create(&user.id, &post_id, &req.content)
        .await?;

    // The commenter is the author, so is_owner is always true here
    Ok(Json(CommentResponse::new(comment, Some(&user), &user.id)))
}

/// List the comments on a post, oldest first.
async fn list_comments(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Vec<CommentResponse>>> {
    let rows = state.comment_service.list_for_post(&post_id).await?;
    let viewer_id = viewer.map(|u| u.id).unwrap_or_default();

    let comments = rows
        .into_iter()
        .map(|(comment, author)| CommentResponse::new(comment, author.as_ref(), &viewer_id))
        .collect();

    Ok(Json(comments))
}

/// Delete a comment (commenter only).
async fn delete_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<Json<Detail>> {
    state.comment_service.delete(&comment_id, &user.id).await?;
    Ok(Json(Detail::new("comment deleted")))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}/comment", post(add_comment))
        .route("/posts/{id}/comments", get(list_comments))
        .route("/comments/{id}", delete(delete_comment))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_comment_response_uses_email_local_part() {
        let author = user::Model {
            id: "u1".to_string(),
            email: "carol@example.com".to_string(),
            password_hash: String::new(),
            token: None,
            is_active: true,
            is_verified: true,
            verify_token: None,
            reset_token: None,
            created_at: Utc::now().into(),
        };
        let comment = comment::Model {
            id: "c1".to_string(),
            post_id: "p1".to_string(),
            user_id: "u1".to_string(),
            content: "nice".to_string(),
            created_at: Utc::now().into(),
        };

        let response = CommentResponse::new(comment, Some(&author), "u1");

        assert_eq!(response.user, "carol");
        assert!(response.is_owner);
    }

    #[test]
    fn test_comment_response_for_other_viewer() {
        let author = user::Model {
            id: "u1".to_string(),
            email: "carol@example.com".to_string(),
            password_hash: String::new(),
            token: None,
            is_active: true,
            is_verified: true,
            verify_token: None,
            reset_token: None,
            created_at: Utc::now().into(),
        };
        let comment = comment::Model {
            id: "c1".to_string(),
            post_id: "p1".to_string(),
            user_id: "u1".to_string(),
            content: "nice".to_string(),
            created_at: Utc::now().into(),
        };

        let response = CommentResponse::new(comment, Some(&author), "u2");

        assert!(!response.is_owner);
    }
}
