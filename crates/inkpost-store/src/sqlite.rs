// ABOUTME: SQLite-backed store for posts and comments.
// ABOUTME: Owns a single connection behind a mutex and runs migrations on open.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use inkpost_core::{
    BlogError, Comment, CommentStore, NewComment, NewPost, Post, PostId, PostStore, clock,
};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use validator::Validate;

/// Schema for posts and comments. Safe to run repeatedly.
const MIGRATIONS: &str = "
    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL CHECK (length(title) > 0),
        content TEXT NOT NULL CHECK (length(content) > 0),
        author TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_posts_listing ON posts (created_at DESC, id ASC);

    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id INTEGER NOT NULL,
        author TEXT NOT NULL CHECK (length(author) BETWEEN 1 AND 100),
        content TEXT NOT NULL CHECK (length(content) > 0),
        created_at TEXT NOT NULL,
        FOREIGN KEY (post_id) REFERENCES posts(id)
    );

    CREATE INDEX IF NOT EXISTS idx_comments_post ON comments (post_id, created_at, id);
";

/// Errors that can occur during SQLite store operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database connection lock poisoned")]
    LockPoisoned,

    #[error("backup target already exists: {}", .0.display())]
    BackupExists(PathBuf),
}

impl From<SqliteError> for BlogError {
    fn from(err: SqliteError) -> Self {
        BlogError::storage(err)
    }
}

/// Durable post and comment store on a single SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, SqliteError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        tracing::info!("opened database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open a private in-memory database. Contents vanish on drop.
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, SqliteError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(MIGRATIONS)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, SqliteError> {
        self.conn.lock().map_err(|_| SqliteError::LockPoisoned)
    }

    /// Write a consistent snapshot of the live database to `dest`.
    /// Refuses to overwrite an existing file.
    pub fn backup_to(&self, dest: &Path) -> Result<(), SqliteError> {
        if dest.exists() {
            return Err(SqliteError::BackupExists(dest.to_path_buf()));
        }
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = self.conn()?;
        conn.execute("VACUUM INTO ?1", params![dest.to_string_lossy()])?;
        tracing::info!("database backed up to {}", dest.display());
        Ok(())
    }

    /// Drop every post and comment and recreate the empty schema.
    pub fn reset(&self) -> Result<(), SqliteError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "DROP TABLE IF EXISTS comments;
             DROP TABLE IF EXISTS posts;",
        )?;
        conn.execute_batch(MIGRATIONS)?;
        tracing::warn!("database reset; all posts and comments removed");
        Ok(())
    }

    fn insert_post(&self, post: &NewPost, created_at: DateTime<Utc>) -> Result<Post, SqliteError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO posts (title, content, author, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                post.title,
                post.content,
                post.author,
                format_timestamp(&created_at)
            ],
        )?;

        Ok(Post {
            id: conn.last_insert_rowid(),
            title: post.title.clone(),
            content: post.content.clone(),
            author: post.author.clone(),
            created_at,
        })
    }

    fn select_posts(&self, offset: usize, limit: usize) -> Result<Vec<Post>, SqliteError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, content, author, created_at
             FROM posts
             ORDER BY created_at DESC, id ASC
             LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(params![to_sql_int(limit), to_sql_int(offset)], post_from_row)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    fn select_post_count(&self) -> Result<usize, SqliteError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn select_post(&self, id: PostId) -> Result<Option<Post>, SqliteError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, title, content, author, created_at FROM posts WHERE id = ?1",
                params![id],
                post_from_row,
            )
            .optional()?)
    }

    /// Insert a comment if its post exists. The existence check and the
    /// insert run under one lock.
    fn insert_comment(
        &self,
        comment: &NewComment,
        created_at: DateTime<Utc>,
    ) -> Result<Option<Comment>, SqliteError> {
        let conn = self.conn()?;
        let post_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
            params![comment.post_id],
            |row| row.get(0),
        )?;
        if !post_exists {
            return Ok(None);
        }

        conn.execute(
            "INSERT INTO comments (post_id, author, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                comment.post_id,
                comment.author,
                comment.content,
                format_timestamp(&created_at)
            ],
        )?;

        Ok(Some(Comment {
            id: conn.last_insert_rowid(),
            post_id: comment.post_id,
            author: comment.author.clone(),
            content: comment.content.clone(),
            created_at,
        }))
    }

    fn select_comments(&self, post_id: PostId) -> Result<Vec<Comment>, SqliteError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, post_id, author, content, created_at
             FROM comments
             WHERE post_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![post_id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                post_id: row.get(1)?,
                author: row.get(2)?,
                content: row.get(3)?,
                created_at: parse_timestamp(4, row.get(4)?)?,
            })
        })?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    fn select_comment_count(&self, post_id: PostId) -> Result<usize, SqliteError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl PostStore for SqliteStore {
    fn create_post(&self, new_post: NewPost) -> Result<Post, BlogError> {
        let new_post = new_post.normalized();
        new_post.validate()?;

        let post = self.insert_post(&new_post, clock::now())?;
        tracing::debug!(post_id = post.id, "post created");
        Ok(post)
    }

    fn list_posts(&self, offset: usize, limit: usize) -> Result<Vec<Post>, BlogError> {
        Ok(self.select_posts(offset, limit)?)
    }

    fn count_posts(&self) -> Result<usize, BlogError> {
        Ok(self.select_post_count()?)
    }

    fn get_post(&self, id: PostId) -> Result<Post, BlogError> {
        self.select_post(id)?
            .ok_or_else(|| BlogError::post_not_found(id))
    }
}

impl CommentStore for SqliteStore {
    fn create_comment(&self, new_comment: NewComment) -> Result<Comment, BlogError> {
        let new_comment = new_comment.normalized();
        new_comment.validate()?;

        let comment = self
            .insert_comment(&new_comment, clock::now())?
            .ok_or_else(|| BlogError::post_not_found(new_comment.post_id))?;
        tracing::debug!(post_id = comment.post_id, comment_id = comment.id, "comment created");
        Ok(comment)
    }

    fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, BlogError> {
        Ok(self.select_comments(post_id)?)
    }

    fn count_comments(&self, post_id: PostId) -> Result<usize, BlogError> {
        Ok(self.select_comment_count(post_id)?)
    }
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author: row.get(3)?,
        created_at: parse_timestamp(4, row.get(4)?)?,
    })
}

/// Fixed-width RFC 3339 so lexical order in SQL matches time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn to_sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract_tests;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("inkpost.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn sqlite_contract_create_and_get() {
        let (_dir, store) = open_temp();
        contract_tests::create_and_get(&store);
    }

    #[test]
    fn sqlite_contract_rejects_invalid_posts() {
        let (_dir, store) = open_temp();
        contract_tests::rejects_invalid_posts(&store);
    }

    #[test]
    fn sqlite_contract_listing_order_and_windows() {
        let (_dir, store) = open_temp();
        contract_tests::listing_order_and_windows(&store);
    }

    #[test]
    fn sqlite_contract_comments() {
        let (_dir, store) = open_temp();
        contract_tests::comments_round_trip(&store);
    }

    #[test]
    fn sqlite_contract_rejects_orphan_comments() {
        let (_dir, store) = open_temp();
        contract_tests::rejects_orphan_comments(&store);
    }

    #[test]
    fn sqlite_contract_get_unknown_post() {
        let store = SqliteStore::open_in_memory().unwrap();
        contract_tests::unknown_post_is_not_found(&store);
    }

    #[test]
    fn sqlite_ties_break_by_ascending_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        for title in ["first", "second", "third"] {
            store.create_post(NewPost::new(title, "body", None)).unwrap();
        }

        store
            .conn()
            .unwrap()
            .execute(
                "UPDATE posts SET created_at = '2024-01-01T00:00:00.000000Z'",
                [],
            )
            .unwrap();

        let titles: Vec<String> = store
            .list_posts(0, 10)
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn sqlite_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inkpost.db");

        let created = {
            let store = SqliteStore::open(&path).unwrap();
            store
                .create_post(NewPost::new("Durable", "Survives reopen", Some("ada".into())))
                .unwrap()
        };

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count_posts().unwrap(), 1);
        assert_eq!(store.get_post(created.id).unwrap(), created);
    }

    #[test]
    fn sqlite_ids_are_not_reused() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.create_post(NewPost::new("a", "b", None)).unwrap();
        store
            .conn()
            .unwrap()
            .execute("DELETE FROM posts WHERE id = ?1", params![first.id])
            .unwrap();

        let second = store.create_post(NewPost::new("c", "d", None)).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn sqlite_backup_writes_readable_copy() {
        let (dir, store) = open_temp();
        store.create_post(NewPost::new("Backed up", "body", None)).unwrap();

        let dest = dir.path().join("backups").join("copy.db");
        store.backup_to(&dest).unwrap();

        let copy = SqliteStore::open(&dest).unwrap();
        let posts = copy.list_posts(0, 10).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Backed up");
    }

    #[test]
    fn sqlite_backup_refuses_to_overwrite() {
        let (dir, store) = open_temp();
        let dest = dir.path().join("copy.db");
        std::fs::write(&dest, b"occupied").unwrap();

        let err = store.backup_to(&dest).unwrap_err();
        assert!(matches!(err, SqliteError::BackupExists(_)));
        assert_eq!(std::fs::read(&dest).unwrap(), b"occupied");
    }

    #[test]
    fn sqlite_reset_clears_posts_and_comments() {
        let (_dir, store) = open_temp();
        let post = store.create_post(NewPost::new("Gone", "soon", None)).unwrap();
        store
            .create_comment(NewComment::new(post.id, "ada", "bye"))
            .unwrap();

        store.reset().unwrap();

        assert_eq!(store.count_posts().unwrap(), 0);
        assert!(store.list_comments(post.id).unwrap().is_empty());
        let again = store.create_post(NewPost::new("Fresh", "start", None)).unwrap();
        assert_eq!(store.get_post(again.id).unwrap().title, "Fresh");
    }

    #[test]
    fn timestamps_round_trip_through_text() {
        let ts = clock::now();
        let parsed = parse_timestamp(0, format_timestamp(&ts)).unwrap();
        assert_eq!(parsed, ts);
    }
}
