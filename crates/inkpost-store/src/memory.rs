// ABOUTME: In-memory post and comment store used when no database file is configured.
// ABOUTME: Every read and write is serialized through a single mutex.

use std::sync::{Mutex, MutexGuard};

use inkpost_core::{
    BlogError, Comment, CommentId, CommentStore, NewComment, NewPost, Post, PostId, PostStore,
    clock,
};
use validator::Validate;

#[derive(Default)]
struct Inner {
    posts: Vec<Post>,
    comments: Vec<Comment>,
    last_post_id: PostId,
    last_comment_id: CommentId,
}

/// Volatile store. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, BlogError> {
        self.inner
            .lock()
            .map_err(|_| BlogError::storage("memory store lock poisoned"))
    }
}

impl PostStore for MemoryStore {
    fn create_post(&self, new_post: NewPost) -> Result<Post, BlogError> {
        let new_post = new_post.normalized();
        new_post.validate()?;

        let mut inner = self.lock()?;
        inner.last_post_id += 1;
        let post = Post {
            id: inner.last_post_id,
            title: new_post.title,
            content: new_post.content,
            author: new_post.author,
            created_at: clock::now(),
        };
        inner.posts.push(post.clone());
        Ok(post)
    }

    fn list_posts(&self, offset: usize, limit: usize) -> Result<Vec<Post>, BlogError> {
        let inner = self.lock()?;
        let mut ordered: Vec<&Post> = inner.posts.iter().collect();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(ordered
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn count_posts(&self) -> Result<usize, BlogError> {
        Ok(self.lock()?.posts.len())
    }

    fn get_post(&self, id: PostId) -> Result<Post, BlogError> {
        self.lock()?
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| BlogError::post_not_found(id))
    }
}

impl CommentStore for MemoryStore {
    fn create_comment(&self, new_comment: NewComment) -> Result<Comment, BlogError> {
        let new_comment = new_comment.normalized();
        new_comment.validate()?;

        let mut inner = self.lock()?;
        if !inner.posts.iter().any(|p| p.id == new_comment.post_id) {
            return Err(BlogError::post_not_found(new_comment.post_id));
        }

        inner.last_comment_id += 1;
        let comment = Comment {
            id: inner.last_comment_id,
            post_id: new_comment.post_id,
            author: new_comment.author,
            content: new_comment.content,
            created_at: clock::now(),
        };
        inner.comments.push(comment.clone());
        Ok(comment)
    }

    fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, BlogError> {
        let inner = self.lock()?;
        let mut comments: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    fn count_comments(&self, post_id: PostId) -> Result<usize, BlogError> {
        Ok(self
            .lock()?
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .count())
    }
}
