// ABOUTME: Defines the Comment entity and the NewComment input accepted by the comment store.
// ABOUTME: Comments belong to exactly one post and are listed in conversational order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::post::PostId;

/// Store-assigned comment identity.
pub type CommentId = i64;

/// A persisted reply attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A comment as submitted for a given post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct NewComment {
    #[validate(range(min = 1, message = "post id is invalid"))]
    pub post_id: PostId,
    #[validate(length(min = 1, max = 100, message = "author is required (at most 100 characters)"))]
    pub author: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
}

impl NewComment {
    pub fn new(post_id: PostId, author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            post_id,
            author: author.into(),
            content: content.into(),
        }
        .normalized()
    }

    /// Trim surrounding whitespace from the text fields.
    pub fn normalized(self) -> Self {
        Self {
            post_id: self.post_id,
            author: self.author.trim().to_string(),
            content: self.content.trim().to_string(),
        }
    }
}
