// ABOUTME: Defines the Post entity and the NewPost input accepted by the post store.
// ABOUTME: NewPost carries the validation rules; Post is only ever produced by a store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Store-assigned post identity.
pub type PostId = i64;

/// Author recorded when a post is submitted without one.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// A persisted blog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// A post as submitted, before the store assigns identity and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, max = 200, message = "title is required (at most 200 characters)"))]
    pub title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    #[validate(length(max = 100, message = "author must be at most 100 characters"))]
    pub author: String,
}

impl NewPost {
    /// Build a normalized NewPost. A missing or blank author becomes
    /// [`ANONYMOUS_AUTHOR`].
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        author: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author: author.unwrap_or_default(),
        }
        .normalized()
    }

    /// Trim surrounding whitespace and fill in the default author.
    /// Stores call this before validating, so a whitespace-only title
    /// counts as empty.
    pub fn normalized(self) -> Self {
        let author = self.author.trim();
        Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            author: if author.is_empty() {
                ANONYMOUS_AUTHOR.to_string()
            } else {
                author.to_string()
            },
        }
    }
}
