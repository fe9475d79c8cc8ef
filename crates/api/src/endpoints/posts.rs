//! Post endpoints: upload, feed, delete, like/unlike.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{delete, get, post},
};
use serde::Serialize;
use snapfeed_common::{AppError, AppResult};
use snapfeed_core::{CreatePostInput, FeedPost, LikeOutcome};
use snapfeed_db::entities::post::{FileType, Model as PostModel};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{Ack, Detail},
};

/// Post response (echoes the stored fields).
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub user_id: String,
    pub caption: Option<String>,
    pub url: String,
    pub file_type: FileType,
    pub file_name: String,
    pub created_at: String,
}

impl From<PostModel> for PostResponse {
    fn from(post: PostModel) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            caption: post.caption,
            url: post.url,
            file_type: post.file_type,
            file_name: post.file_name,
            created_at: post.created_at.to_rfc3339(),
        }
    }
}

/// Upload a media file with a caption, creating a post.
async fn upload(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<PostResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut caption = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(std::string::ToString::to_string);
                content_type = field.content_type().map(std::string::ToString::to_string);
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?
                        .to_vec(),
                );
            }
            "caption" => {
                caption = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            _ => {}
        }
    }

    let data =
        file_data.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::BadRequest("File must have a name".to_string()))?;

    let created = state
        .post_service
        .create(
            &user.id,
            CreatePostInput {
                caption,
                file_name,
                content_type,
                data,
            },
        )
        .await?;

    Ok(Json(created.into()))
}

/// Feed response.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<FeedPost>,
}

/// The feed: all posts newest-first, annotated for the viewer when
/// authenticated.
async fn feed(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<FeedResponse>> {
    let posts = state.post_service.feed(viewer.as_ref()).await?;
    Ok(Json(FeedResponse { posts }))
}

/// Delete a post (owner only).
async fn delete_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Ack>> {
    state.post_service.delete(&post_id, &user.id).await?;
    Ok(Json(Ack::ok("post deleted")))
}

/// Like a post. Re-liking is reported, not rejected.
async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Detail>> {
    let outcome = state.like_service.like(&user.id, &post_id).await?;
    let detail = match outcome {
        LikeOutcome::Liked => "post liked",
        LikeOutcome::AlreadyLiked => "already liked",
    };
    Ok(Json(Detail::new(detail)))
}

/// Remove a like from a post.
async fn unlike(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Detail>> {
    state.like_service.unlike(&user.id, &post_id).await?;
    Ok(Json(Detail::new("like removed")))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/feed", get(feed))
        .route("/posts/{id}", delete(delete_post))
        .route("/posts/{id}/like", post(like).delete(unlike))
}
