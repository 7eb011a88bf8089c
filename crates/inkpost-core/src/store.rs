// ABOUTME: Store contracts for posts and comments.
// ABOUTME: Implemented by the SQLite and in-memory stores in inkpost-store.

use crate::comment::{Comment, NewComment};
use crate::error::BlogError;
use crate::pagination::PageWindow;
use crate::post::{NewPost, Post, PostId};

pub trait PostStore {
    /// Validate and persist a post, assigning its id and creation time.
    fn create_post(&self, new_post: NewPost) -> Result<Post, BlogError>;

    /// Posts newest first, ties broken by ascending id.
    fn list_posts(&self, offset: usize, limit: usize) -> Result<Vec<Post>, BlogError>;

    fn count_posts(&self) -> Result<usize, BlogError>;

    /// Fails with [`BlogError::NotFound`] for an unknown id.
    fn get_post(&self, id: PostId) -> Result<Post, BlogError>;

    fn list_page(&self, window: &PageWindow) -> Result<Vec<Post>, BlogError> {
        self.list_posts(window.offset, window.limit)
    }
}

pub trait CommentStore {
    /// Validate and persist a comment. Rejects comments whose post does not
    /// exist with [`BlogError::NotFound`].
    fn create_comment(&self, new_comment: NewComment) -> Result<Comment, BlogError>;

    /// Comments for a post oldest first, ties broken by ascending id.
    fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, BlogError>;

    fn count_comments(&self, post_id: PostId) -> Result<usize, BlogError>;
}

/// Everything the HTTP layer needs from a backing store.
pub trait BlogStore: PostStore + CommentStore + Send + Sync {}

impl<T> BlogStore for T where T: PostStore + CommentStore + Send + Sync {}
