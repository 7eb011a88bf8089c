// ABOUTME: Error taxonomy shared by the stores and the HTTP layer.
// ABOUTME: Validation maps to 4xx, NotFound to 404, Storage to 5xx.

use thiserror::Error;
use validator::ValidationErrors;

/// Errors produced by post and comment store operations.
#[derive(Debug, Error)]
pub enum BlogError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BlogError {
    pub fn post_not_found(id: i64) -> Self {
        Self::NotFound { entity: "post", id }
    }

    /// Wrap any storage-level failure.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(err.into())
    }
}

/// Flatten validation errors into sorted, human-readable messages.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for err in field_errors.iter() {
            let message = match &err.message {
                Some(m) => m.to_string(),
                None => format!("{field} is invalid"),
            };
            messages.push(message);
        }
    }
    messages.sort();
    messages.dedup();
    messages
}
