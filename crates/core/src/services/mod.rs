//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod like;
pub mod media;
pub mod post;
pub mod user;

pub use comment::CommentService;
pub use like::{LikeOutcome, LikeService};
pub use media::{MediaHost, MediaUpload, RemoteMediaHost, ScratchFile};
pub use post::{CreatePostInput, FeedPost, PostService};
pub use user::{RegisterInput, UpdateUserInput, UserService};
