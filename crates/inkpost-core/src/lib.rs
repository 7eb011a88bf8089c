// ABOUTME: Core library for inkpost, containing domain types, validation and pagination.
// ABOUTME: Defines the post/comment model and the store contracts shared by every other crate.

pub mod clock;
pub mod comment;
pub mod error;
pub mod pagination;
pub mod post;
pub mod store;

pub use comment::{Comment, CommentId, NewComment};
pub use error::{BlogError, validation_messages};
pub use pagination::{DEFAULT_PAGE_SIZE, PageWindow, paginate, parse_page};
pub use post::{ANONYMOUS_AUTHOR, NewPost, Post, PostId};
pub use store::{BlogStore, CommentStore, PostStore};
