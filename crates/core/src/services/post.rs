//! Post service (upload, feed, delete).

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use snapfeed_common::{AppError, AppResult, IdGenerator};
use snapfeed_db::{
    entities::{post, post::FileType, user},
    repositories::{LikeRepository, PostRepository},
};

use crate::services::media::{MediaHost, ScratchFile};

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    like_repo: LikeRepository,
    media_host: Arc<dyn MediaHost>,
    scratch_dir: PathBuf,
    id_gen: IdGenerator,
}

/// Input for creating a post from an upload.
pub struct CreatePostInput {
    pub caption: String,
    /// Client-supplied file name (the media host assigns the canonical one).
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// One post in the feed, annotated for the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPost {
    pub id: String,
    /// Caption, empty string when the post has none.
    pub caption: String,
    pub url: String,
    pub file_type: FileType,
    pub file_name: String,
    pub created_at: String,
    /// Author's email local-part.
    pub user: String,
    /// True iff the viewer is authenticated and owns the post.
    pub is_owner: bool,
    pub like_count: u64,
    /// True iff the viewer is authenticated and has liked the post.
    pub is_liked: bool,
    /// Placeholder; comments are fetched per post.
    pub comments: Vec<serde_json::Value>,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        like_repo: LikeRepository,
        media_host: Arc<dyn MediaHost>,
        scratch_dir: PathBuf,
    ) -> Self {
        Self {
            post_repo,
            like_repo,
            media_host,
            scratch_dir,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post from an uploaded file.
    ///
    /// The blob is staged to a scratch file, pushed to the media host, and
    /// a post row is written only when the host reports success. The
    /// scratch file is removed on every exit path.
    pub async fn create(&self, user_id: &str, input: CreatePostInput) -> AppResult<post::Model> {
        let content_type = input
            .content_type
            .ok_or_else(|| AppError::BadRequest("File must have a content type".to_string()))?;

        if input.data.is_empty() {
            return Err(AppError::BadRequest("File is empty".to_string()));
        }

        // Guard drops (and unlinks) on every return below
        let scratch = ScratchFile::spool(&self.scratch_dir, &input.file_name, &input.data).await?;

        let staged = scratch.read().await?;
        let uploaded = self
            .media_host
            .upload(&staged, &input.file_name, &content_type)
            .await?;

        tracing::debug!(
            file_name = %uploaded.file_name,
            url = %uploaded.url,
            "Media host accepted upload"
        );

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            caption: Set(Some(input.caption).filter(|c| !c.is_empty())),
            url: Set(uploaded.url),
            file_type: Set(FileType::from_content_type(&content_type)),
            file_name: Set(uploaded.file_name),
            created_at: Set(Utc::now().into()),
        };

        self.post_repo.create(model).await
    }

    /// The feed: all posts newest-first, annotated for the viewer.
    pub async fn feed(&self, viewer: Option<&user::Model>) -> AppResult<Vec<FeedPost>> {
        let rows = self.post_repo.feed().await?;

        let post_ids: Vec<String> = rows.iter().map(|(p, _)| p.id.clone()).collect();
        let likes = self.like_repo.find_by_posts(&post_ids).await?;

        let mut like_counts: HashMap<&str, u64> = HashMap::new();
        let mut liked_by_viewer: HashSet<&str> = HashSet::new();
        for like in &likes {
            *like_counts.entry(like.post_id.as_str()).or_default() += 1;
            if viewer.is_some_and(|v| v.id == like.user_id) {
                liked_by_viewer.insert(like.post_id.as_str());
            }
        }

        let feed = rows
            .iter()
            .map(|(post, author)| FeedPost {
                id: post.id.clone(),
                caption: post.caption.clone().unwrap_or_default(),
                url: post.url.clone(),
                file_type: post.file_type.clone(),
                file_name: post.file_name.clone(),
                created_at: post.created_at.to_rfc3339(),
                user: author
                    .as_ref()
                    .map(|a| a.display_name().to_string())
                    .unwrap_or_default(),
                is_owner: viewer.is_some_and(|v| v.id == post.user_id),
                like_count: like_counts.get(post.id.as_str()).copied().unwrap_or(0),
                is_liked: liked_by_viewer.contains(post.id.as_str()),
                comments: vec![],
            })
            .collect();

        Ok(feed)
    }

    /// Delete a post. Only the owner may delete; likes and comments cascade.
    pub async fn delete(&self, post_id: &str, user_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if post.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own posts".to_string(),
            ));
        }

        self.post_repo.delete(post_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::media::MediaUpload;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use snapfeed_db::entities::like;

    /// Media host double: succeeds or fails on demand.
    struct FakeMediaHost {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl MediaHost for FakeMediaHost {
        async fn upload(
            &self,
            _data: &[u8],
            file_name: &str,
            _content_type: &str,
        ) -> AppResult<MediaUpload> {
            if self.fail {
                return Err(AppError::Upload("Media host returned 503".to_string()));
            }
            Ok(MediaUpload {
                url: format!("https://cdn.example.com/{file_name}"),
                file_name: format!("unique-{file_name}"),
            })
        }
    }

    fn create_test_post(id: &str, user_id: &str, age_minutes: i64) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            caption: None,
            url: format!("https://cdn.example.com/{id}.jpg"),
            file_type: FileType::Image,
            file_name: format!("{id}.jpg"),
            created_at: (Utc::now() - Duration::minutes(age_minutes)).into(),
        }
    }

    fn create_test_user(id: &str, email: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            token: None,
            is_active: true,
            is_verified: true,
            verify_token: None,
            reset_token: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_like(id: &str, user_id: &str, post_id: &str) -> like::Model {
        like::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection, fail_upload: bool) -> PostService {
        let db = Arc::new(db);
        PostService::new(
            PostRepository::new(db.clone()),
            LikeRepository::new(db),
            Arc::new(FakeMediaHost { fail: fail_upload }),
            std::env::temp_dir(),
        )
    }

    #[tokio::test]
    async fn test_create_requires_content_type() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_with(db, false);

        let result = service
            .create(
                "u1",
                CreatePostInput {
                    caption: "hi".to_string(),
                    file_name: "photo.jpg".to_string(),
                    content_type: None,
                    data: b"bytes".to_vec(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_stores_canonical_name_and_type() {
        let stored = post::Model {
            caption: Some("sunset".to_string()),
            file_type: FileType::Video,
            file_name: "unique-clip.mp4".to_string(),
            ..create_test_post("p1", "u1", 0)
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[stored]])
            .into_connection();
        let service = service_with(db, false);

        let post = service
            .create(
                "u1",
                CreatePostInput {
                    caption: "sunset".to_string(),
                    file_name: "clip.mp4".to_string(),
                    content_type: Some("video/mp4".to_string()),
                    data: b"movie".to_vec(),
                },
            )
            .await
            .unwrap();

        assert_eq!(post.file_type, FileType::Video);
        assert_eq!(post.file_name, "unique-clip.mp4");
    }

    #[tokio::test]
    async fn test_create_failed_upload_writes_no_row() {
        // No query results appended: any insert attempt would error with
        // a Database error rather than the expected Upload error.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_with(db, true);

        let result = service
            .create(
                "u1",
                CreatePostInput {
                    caption: "hi".to_string(),
                    file_name: "photo.jpg".to_string(),
                    content_type: Some("image/jpeg".to_string()),
                    data: b"bytes".to_vec(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Upload(_))));
    }

    #[tokio::test]
    async fn test_feed_annotations_for_viewer() {
        let alice = create_test_user("u1", "alice@example.com");
        let bob = create_test_user("u2", "bob@example.com");
        let p1 = post::Model {
            caption: Some("mine".to_string()),
            ..create_test_post("p1", "u1", 0)
        };
        let p2 = create_test_post("p2", "u2", 5);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                (p1.clone(), alice.clone()),
                (p2.clone(), bob.clone()),
            ]])
            .append_query_results([vec![
                create_test_like("l1", "u1", "p2"),
                create_test_like("l2", "u2", "p2"),
            ]])
            .into_connection();
        let service = service_with(db, false);

        let feed = service.feed(Some(&alice)).await.unwrap();

        assert_eq!(feed.len(), 2);

        // Own post: is_owner, no likes, caption carried through
        assert_eq!(feed[0].id, "p1");
        assert!(feed[0].is_owner);
        assert_eq!(feed[0].caption, "mine");
        assert_eq!(feed[0].like_count, 0);
        assert!(!feed[0].is_liked);

        // Bob's post: liked by alice and bob, author shown as local-part
        assert_eq!(feed[1].id, "p2");
        assert!(!feed[1].is_owner);
        assert_eq!(feed[1].caption, "");
        assert_eq!(feed[1].user, "bob");
        assert_eq!(feed[1].like_count, 2);
        assert!(feed[1].is_liked);
        assert!(feed[1].comments.is_empty());
    }

    #[tokio::test]
    async fn test_feed_anonymous_viewer() {
        let alice = create_test_user("u1", "alice@example.com");
        let p1 = create_test_post("p1", "u1", 0);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![(p1, alice)]])
            .append_query_results([vec![create_test_like("l1", "u1", "p1")]])
            .into_connection();
        let service = service_with(db, false);

        let feed = service.feed(None).await.unwrap();

        assert_eq!(feed[0].like_count, 1);
        assert!(!feed[0].is_liked);
        assert!(!feed[0].is_owner);
    }

    #[tokio::test]
    async fn test_delete_forbidden_for_non_owner() {
        let p1 = create_test_post("p1", "u1", 0);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[p1]])
            .into_connection();
        let service = service_with(db, false);

        let result = service.delete("p1", "u2").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_post() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();
        let service = service_with(db, false);

        let result = service.delete("nonexistent", "u1").await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_by_owner() {
        let p1 = create_test_post("p1", "u1", 0);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[p1]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let service = service_with(db, false);

        assert!(service.delete("p1", "u1").await.is_ok());
    }
}
