// ABOUTME: Web UI route handlers serving HTML via Askama templates.
// ABOUTME: Lists posts page by page, shows a post with its comments, and accepts both via forms.

pub mod error;

use std::collections::HashMap;

use askama::Template;
use askama_derive_axum::IntoResponse as AskamaIntoResponse;
use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{DateTime, Utc};
use inkpost_core::{
    BlogError, Comment, CommentStore, NewComment, NewPost, Post, PostId, PostStore, paginate,
    parse_page, validation_messages,
};
use serde::Deserialize;

use crate::app_state::{AppState, SharedState};

pub use error::{ErrorTemplate, WebError};

/// Characters of post content shown on the listing page.
const EXCERPT_CHARS: usize = 280;

fn display_time(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Split content on blank lines so each paragraph renders as its own block.
fn paragraphs(content: &str) -> Vec<String> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn excerpt(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

/// Post row on the listing page.
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub author: String,
    pub excerpt: String,
    pub created_at: String,
    pub comment_count: usize,
}

/// Home page: one page of posts, newest first.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub posts: Vec<PostSummary>,
    pub current_page: u32,
    pub total_pages: u32,
    pub previous_page: Option<u32>,
    pub next_page: Option<u32>,
}

/// GET / - Render one page of posts. Any unusable `page` value means page 1.
pub async fn index(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<IndexTemplate, WebError> {
    let page = parse_page(params.get("page").map(String::as_str));
    let total = state.store.count_posts()?;
    let window = paginate(total, page, state.page_size);

    let mut posts = Vec::new();
    for post in state.store.list_page(&window)? {
        posts.push(PostSummary {
            comment_count: state.store.count_comments(post.id)?,
            id: post.id,
            excerpt: excerpt(&post.content),
            created_at: display_time(&post.created_at),
            title: post.title,
            author: post.author,
        });
    }

    Ok(IndexTemplate {
        posts,
        current_page: window.page,
        total_pages: window.total_pages,
        previous_page: window.previous_page(),
        next_page: window.next_page(),
    })
}

/// New post form, also used to redisplay a rejected submission.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "new.html")]
pub struct NewPostTemplate {
    pub errors: Vec<String>,
    pub title: String,
    pub content: String,
    pub author: String,
}

/// GET /new - Render the empty post form.
pub async fn new_post_form() -> NewPostTemplate {
    NewPostTemplate {
        errors: Vec::new(),
        title: String::new(),
        content: String::new(),
        author: String::new(),
    }
}

/// Form data for creating a post. Missing fields arrive as empty strings
/// so they surface as validation messages.
#[derive(Debug, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
}

/// POST /create - Publish a post and return to the listing.
pub async fn create_post(
    State(state): State<SharedState>,
    Form(form): Form<PostForm>,
) -> Result<Response, WebError> {
    let new_post = NewPost::new(form.title.clone(), form.content.clone(), form.author.clone());

    match state.store.create_post(new_post) {
        Ok(post) => {
            tracing::info!(post_id = post.id, "post published");
            Ok(Redirect::to("/").into_response())
        }
        Err(BlogError::Validation(errors)) => {
            let page = NewPostTemplate {
                errors: validation_messages(&errors),
                title: form.title,
                content: form.content,
                author: form.author.unwrap_or_default(),
            };
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Full post as rendered on its detail page.
pub struct PostView {
    pub id: PostId,
    pub title: String,
    pub author: String,
    pub paragraphs: Vec<String>,
    pub created_at: String,
}

impl PostView {
    fn from_post(post: Post) -> Self {
        Self {
            id: post.id,
            paragraphs: paragraphs(&post.content),
            created_at: display_time(&post.created_at),
            title: post.title,
            author: post.author,
        }
    }
}

/// Comment as rendered under a post.
pub struct CommentView {
    pub author: String,
    pub content: String,
    pub created_at: String,
}

impl CommentView {
    fn from_comment(comment: Comment) -> Self {
        Self {
            created_at: display_time(&comment.created_at),
            author: comment.author,
            content: comment.content,
        }
    }
}

/// Post detail page with its comments and the comment form.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub errors: Vec<String>,
    pub comment_author: String,
    pub comment_content: String,
}

fn parse_post_id(raw: &str) -> Result<PostId, WebError> {
    raw.parse::<PostId>()
        .map_err(|_| WebError::InvalidPostId(raw.to_string()))
}

fn post_page(state: &AppState, id: PostId) -> Result<PostTemplate, BlogError> {
    let post = state.store.get_post(id)?;
    let comments = state
        .store
        .list_comments(id)?
        .into_iter()
        .map(CommentView::from_comment)
        .collect();

    Ok(PostTemplate {
        post: PostView::from_post(post),
        comments,
        errors: Vec::new(),
        comment_author: String::new(),
        comment_content: String::new(),
    })
}

/// GET /post/{id} - Render a post and its comments, or the 404 page.
pub async fn show_post(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<PostTemplate, WebError> {
    let post_id = parse_post_id(&id)?;
    Ok(post_page(&state, post_id)?)
}

/// Form data for commenting on a post.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
}

/// POST /post/{id}/comment - Add a comment, then return to the post.
pub async fn create_comment(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, WebError> {
    let post_id = parse_post_id(&id)?;
    let new_comment = NewComment::new(post_id, form.author.clone(), form.content.clone());

    match state.store.create_comment(new_comment) {
        Ok(comment) => {
            tracing::info!(post_id, comment_id = comment.id, "comment added");
            Ok(Redirect::to(&format!("/post/{post_id}")).into_response())
        }
        Err(BlogError::Validation(errors)) => {
            let mut page = post_page(&state, post_id)?;
            page.errors = validation_messages(&errors);
            page.comment_author = form.author;
            page.comment_content = form.content;
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InkpostConfig;
    use crate::routes::create_router;
    use axum::body::Body;
    use http::Request;
    use inkpost_store::MemoryStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        let config = InkpostConfig {
            page_size: 6,
            ..InkpostConfig::default()
        };
        Arc::new(AppState::new(Arc::new(MemoryStore::new()), &config))
    }

    fn seed_posts(state: &SharedState, count: usize) {
        for i in 1..=count {
            state
                .store
                .create_post(NewPost::new(format!("Post number {i}"), "body", None))
                .unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
    }

    async fn body_text(resp: Response) -> String {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn form_request(uri: &str, body: &'static str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn index_template_renders_empty() {
        let tmpl = IndexTemplate {
            posts: vec![],
            current_page: 1,
            total_pages: 1,
            previous_page: None,
            next_page: None,
        };
        let rendered = tmpl.render().unwrap();
        assert!(rendered.contains("No posts yet"));
        assert!(rendered.contains("Page 1 of 1"));
    }

    #[test]
    fn index_template_renders_pager_links() {
        let tmpl = IndexTemplate {
            posts: vec![PostSummary {
                id: 3,
                title: "Middle".to_string(),
                author: "ada".to_string(),
                excerpt: "Some text".to_string(),
                created_at: "2024-01-01 00:00 UTC".to_string(),
                comment_count: 2,
            }],
            current_page: 2,
            total_pages: 3,
            previous_page: Some(1),
            next_page: Some(3),
        };
        let rendered = tmpl.render().unwrap();
        assert!(rendered.contains("/post/3"));
        assert!(rendered.contains("/?page=1"));
        assert!(rendered.contains("/?page=3"));
        assert!(rendered.contains("2 comments"));
    }

    #[test]
    fn new_post_template_escapes_submitted_values() {
        let tmpl = NewPostTemplate {
            errors: vec!["content is required".to_string()],
            title: "<script>alert(1)</script>".to_string(),
            content: String::new(),
            author: String::new(),
        };
        let rendered = tmpl.render().unwrap();
        assert!(rendered.contains("content is required"));
        assert!(!rendered.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn post_template_renders_comments() {
        let tmpl = PostTemplate {
            post: PostView {
                id: 1,
                title: "Hello".to_string(),
                author: "ada".to_string(),
                paragraphs: vec!["First.".to_string(), "Second.".to_string()],
                created_at: "2024-01-01 00:00 UTC".to_string(),
            },
            comments: vec![CommentView {
                author: "grace".to_string(),
                content: "Nice one".to_string(),
                created_at: "2024-01-02 00:00 UTC".to_string(),
            }],
            errors: vec![],
            comment_author: String::new(),
            comment_content: String::new(),
        };
        let rendered = tmpl.render().unwrap();
        assert!(rendered.contains("Hello"));
        assert!(rendered.contains("Second."));
        assert!(rendered.contains("grace"));
        assert!(rendered.contains("/post/1/comment"));
    }

    #[test]
    fn excerpt_truncates_long_content() {
        let long = "a".repeat(EXCERPT_CHARS + 10);
        let short = excerpt(&long);
        assert!(short.ends_with('…'));
        assert_eq!(short.chars().count(), EXCERPT_CHARS + 1);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        assert_eq!(
            paragraphs("one\n\n\n\ntwo\nstill two\n\n"),
            vec!["one".to_string(), "two\nstill two".to_string()]
        );
    }

    #[tokio::test]
    async fn get_index_returns_html() {
        let app = create_router(test_state());
        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let html = body_text(resp).await;
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("Page 1 of 1"));
    }

    #[tokio::test]
    async fn get_new_renders_form() {
        let app = create_router(test_state());
        let resp = app
            .oneshot(Request::get("/new").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let html = body_text(resp).await;
        assert!(html.contains("action=\"/create\""));
        assert!(html.contains("name=\"title\""));
        assert!(html.contains("name=\"content\""));
    }

    #[tokio::test]
    async fn create_post_redirects_to_listing() {
        let state = test_state();
        let app = create_router(Arc::clone(&state));

        let resp = app
            .oneshot(form_request("/create", "title=Hello&content=World"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/");
        assert_eq!(state.store.count_posts().unwrap(), 1);
    }

    #[tokio::test]
    async fn create_post_with_missing_content_redisplays_form() {
        let state = test_state();
        let app = create_router(Arc::clone(&state));

        let resp = app
            .oneshot(form_request("/create", "title=Only+a+title"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let html = body_text(resp).await;
        assert!(html.contains("content is required"));
        assert!(html.contains("Only a title"), "submitted title is kept");
        assert_eq!(state.store.count_posts().unwrap(), 0);
    }

    #[tokio::test]
    async fn listing_paginates_newest_first() {
        let state = test_state();
        seed_posts(&state, 13);

        let app = create_router(Arc::clone(&state));
        let resp = app
            .oneshot(Request::get("/?page=3").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let html = body_text(resp).await;
        assert!(html.contains("Page 3 of 3"));
        assert!(html.contains("Post number 1<"));
        assert!(!html.contains("Post number 2<"));

        let app = create_router(Arc::clone(&state));
        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let html = body_text(resp).await;
        let newest = html.find("Post number 13<").unwrap();
        let older = html.find("Post number 8<").unwrap();
        assert!(newest < older);
        assert!(!html.contains("Post number 7<"));
    }

    #[tokio::test]
    async fn bad_page_values_fall_back_to_first_page() {
        let state = test_state();
        seed_posts(&state, 7);

        for query in ["/?page=abc", "/?page=0", "/?page=-4", "/?page="] {
            let app = create_router(Arc::clone(&state));
            let resp = app
                .oneshot(Request::get(query).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), 200, "query {query}");
            let html = body_text(resp).await;
            assert!(html.contains("Page 1 of 2"), "query {query}");
        }
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_not_an_error() {
        let state = test_state();
        seed_posts(&state, 2);

        let app = create_router(Arc::clone(&state));
        let resp = app
            .oneshot(Request::get("/?page=9").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let html = body_text(resp).await;
        assert!(html.contains("No posts on this page"));
        assert!(html.contains("Page 9 of 1"));
    }

    #[tokio::test]
    async fn show_post_lists_comments_in_order() {
        let state = test_state();
        let post = state
            .store
            .create_post(NewPost::new("Hello", "World", Some("ada".into())))
            .unwrap();
        state
            .store
            .create_comment(NewComment::new(post.id, "bob", "first reply"))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        state
            .store
            .create_comment(NewComment::new(post.id, "eve", "second reply"))
            .unwrap();

        let app = create_router(Arc::clone(&state));
        let resp = app
            .oneshot(
                Request::get(format!("/post/{}", post.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let html = body_text(resp).await;
        assert!(html.contains("Hello"));
        assert!(html.contains("World"));
        let first = html.find("first reply").unwrap();
        let second = html.find("second reply").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn show_unknown_post_is_404() {
        let app = create_router(test_state());
        let resp = app
            .oneshot(Request::get("/post/999").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let html = body_text(resp).await;
        assert!(html.contains("does not exist"));
    }

    #[tokio::test]
    async fn show_non_numeric_post_is_404() {
        let app = create_router(test_state());
        let resp = app
            .oneshot(Request::get("/post/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_comment_redirects_to_post() {
        let state = test_state();
        let post = state
            .store
            .create_post(NewPost::new("Hello", "World", None))
            .unwrap();

        let app = create_router(Arc::clone(&state));
        let uri = format!("/post/{}/comment", post.id);
        let resp = app
            .oneshot(
                Request::post(uri.as_str())
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("author=ada&content=Great+post"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], format!("/post/{}", post.id));

        let comments = state.store.list_comments(post.id).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "Great post");
    }

    #[tokio::test]
    async fn invalid_comment_redisplays_post_with_errors() {
        let state = test_state();
        let post = state
            .store
            .create_post(NewPost::new("Hello", "World", None))
            .unwrap();

        let app = create_router(Arc::clone(&state));
        let uri = format!("/post/{}/comment", post.id);
        let resp = app
            .oneshot(
                Request::post(uri.as_str())
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("author=&content=orphaned+words"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let html = body_text(resp).await;
        assert!(html.contains("author is required"));
        assert!(html.contains("orphaned words"));
        assert_eq!(state.store.count_comments(post.id).unwrap(), 0);
    }

    #[tokio::test]
    async fn comment_on_unknown_post_is_404() {
        let state = test_state();
        let app = create_router(Arc::clone(&state));

        let resp = app
            .oneshot(form_request("/post/42/comment", "author=ada&content=hello"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(state.store.list_comments(42).unwrap().is_empty());
        assert_eq!(state.store.count_posts().unwrap(), 0);
    }
}
