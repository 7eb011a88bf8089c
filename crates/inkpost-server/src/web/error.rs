// ABOUTME: Maps store errors onto HTML error pages with the right status code.
// ABOUTME: Storage failures are logged here and shown to the user without internal detail.

use askama::Template;
use askama_derive_axum::IntoResponse as AskamaIntoResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inkpost_core::{BlogError, validation_messages};

/// Generic error page.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub heading: String,
    pub messages: Vec<String>,
}

/// Error returned by page handlers.
#[derive(Debug)]
pub enum WebError {
    Blog(BlogError),
    /// The `{id}` path segment is not a post id at all.
    InvalidPostId(String),
}

impl From<BlogError> for WebError {
    fn from(err: BlogError) -> Self {
        Self::Blog(err)
    }
}

impl WebError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Blog(BlogError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Blog(BlogError::NotFound { .. }) | Self::InvalidPostId(_) => StatusCode::NOT_FOUND,
            Self::Blog(BlogError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (heading, messages) = match &self {
            Self::Blog(BlogError::Validation(errors)) => {
                ("Invalid submission".to_string(), validation_messages(errors))
            }
            Self::Blog(BlogError::NotFound { entity, .. }) => (
                "Not found".to_string(),
                vec![format!("That {entity} does not exist.")],
            ),
            Self::InvalidPostId(raw) => {
                tracing::debug!("rejected non-numeric post id {:?}", raw);
                (
                    "Not found".to_string(),
                    vec!["That post does not exist.".to_string()],
                )
            }
            Self::Blog(err @ BlogError::Storage(_)) => {
                tracing::error!("request failed: {}", err);
                (
                    "Something went wrong".to_string(),
                    vec!["The blog could not complete that request. Please try again later.".to_string()],
                )
            }
        };

        let page = ErrorTemplate {
            status: status.as_u16(),
            heading,
            messages,
        };
        (status, page).into_response()
    }
}
