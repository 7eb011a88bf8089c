// ABOUTME: Configuration loading and validation for the inkpost server.
// ABOUTME: Reads INKPOST_* environment variables over built-in defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use inkpost_core::DEFAULT_PAGE_SIZE;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("INKPOST_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("INKPOST_STORAGE must be \"sqlite\" or \"memory\", got {0:?}")]
    InvalidStorage(String),

    #[error("INKPOST_PAGE_SIZE must be a positive integer, got {0:?}")]
    InvalidPageSize(String),

    #[error("INKPOST_REQUEST_TIMEOUT_SECS must be a positive integer, got {0:?}")]
    InvalidTimeout(String),
}

/// Which store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Sqlite,
    Memory,
}

impl FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidStorage(s.to_string())),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct InkpostConfig {
    pub bind: SocketAddr,
    pub database: PathBuf,
    pub storage: StorageKind,
    pub page_size: usize,
    pub static_dir: PathBuf,
    pub request_timeout: Duration,
    pub backup_dir: PathBuf,
}

impl Default for InkpostConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database: PathBuf::from("inkpost.db"),
            storage: StorageKind::Sqlite,
            page_size: DEFAULT_PAGE_SIZE,
            static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"),
            request_timeout: Duration::from_secs(30),
            backup_dir: PathBuf::from("backups"),
        }
    }
}

impl InkpostConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - INKPOST_BIND: socket address to bind (default: 127.0.0.1:8080)
    /// - INKPOST_DATABASE: SQLite database file (default: inkpost.db)
    /// - INKPOST_STORAGE: "sqlite" or "memory" (default: sqlite)
    /// - INKPOST_PAGE_SIZE: posts per page (default: 5)
    /// - INKPOST_STATIC_DIR: directory served under /static
    /// - INKPOST_REQUEST_TIMEOUT_SECS: per-request timeout (default: 30)
    /// - INKPOST_BACKUP_DIR: where `inkpost backup` writes (default: backups)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(bind) = get("INKPOST_BIND") {
            config.bind = bind
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidBind(bind))?;
        }

        if let Some(database) = get("INKPOST_DATABASE") {
            config.database = PathBuf::from(database);
        }

        if let Some(storage) = get("INKPOST_STORAGE") {
            config.storage = storage.parse()?;
        }

        if let Some(size) = get("INKPOST_PAGE_SIZE") {
            config.page_size = size
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or(ConfigError::InvalidPageSize(size))?;
        }

        if let Some(dir) = get("INKPOST_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }

        if let Some(secs) = get("INKPOST_REQUEST_TIMEOUT_SECS") {
            let parsed = secs
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or(ConfigError::InvalidTimeout(secs))?;
            config.request_timeout = Duration::from_secs(parsed);
        }

        if let Some(dir) = get("INKPOST_BACKUP_DIR") {
            config.backup_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}
