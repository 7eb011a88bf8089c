// ABOUTME: Entry point for the inkpost binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and serves the blog or runs database maintenance.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use inkpost_core::BlogStore;
use inkpost_server::{AppState, InkpostConfig, StorageKind, create_router};
use inkpost_store::{MemoryStore, SqliteStore, backup_into_dir};

#[derive(Debug, Parser)]
#[command(name = "inkpost", version, about = "Minimal blog server with SQLite persistence")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the web server in the foreground until SIGINT or SIGTERM.
    Serve {
        /// Socket address to listen on (overrides INKPOST_BIND).
        #[arg(long)]
        bind: Option<SocketAddr>,
        /// SQLite database file (overrides INKPOST_DATABASE).
        #[arg(long)]
        database: Option<PathBuf>,
        /// Keep posts in memory only; nothing survives a restart.
        #[arg(long)]
        memory: bool,
    },
    /// Write a timestamped snapshot of the database.
    Backup {
        #[arg(long)]
        database: Option<PathBuf>,
        /// Directory for the snapshot (overrides INKPOST_BACKUP_DIR).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Delete every post and comment.
    Reset {
        #[arg(long)]
        database: Option<PathBuf>,
        /// Confirm the reset.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "inkpost=info,inkpost_server=info,inkpost_store=info,tower_http=info",
                )
            }),
        )
        .init();

    let cli = Cli::parse();
    let mut config = InkpostConfig::from_env()?;

    match cli.command.unwrap_or(Command::Serve {
        bind: None,
        database: None,
        memory: false,
    }) {
        Command::Serve {
            bind,
            database,
            memory,
        } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(database) = database {
                config.database = database;
            }
            if memory {
                config.storage = StorageKind::Memory;
            }
            serve(config).await
        }
        Command::Backup { database, dir } => {
            let database = database.unwrap_or(config.database);
            let dir = dir.unwrap_or(config.backup_dir);
            backup(&database, &dir)
        }
        Command::Reset { database, yes } => {
            let database = database.unwrap_or(config.database);
            reset(&database, yes)
        }
    }
}

fn open_store(config: &InkpostConfig) -> anyhow::Result<Arc<dyn BlogStore>> {
    match config.storage {
        StorageKind::Sqlite => {
            let store = SqliteStore::open(&config.database).with_context(|| {
                format!("failed to open database {}", config.database.display())
            })?;
            Ok(Arc::new(store))
        }
        StorageKind::Memory => {
            tracing::warn!("using in-memory storage; posts are lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn serve(config: InkpostConfig) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    let state = Arc::new(AppState::new(store, &config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!("inkpost listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("inkpost stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix, so supervisors can stop the
/// server cleanly.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}

fn backup(database: &Path, dir: &Path) -> anyhow::Result<()> {
    if !database.exists() {
        bail!("database {} does not exist", database.display());
    }

    let store = SqliteStore::open(database)
        .with_context(|| format!("failed to open database {}", database.display()))?;
    let path = backup_into_dir(&store, dir, Utc::now()).context("backup failed")?;
    println!("backup written to {}", path.display());
    Ok(())
}

fn reset(database: &Path, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        bail!("refusing to reset {} without --yes", database.display());
    }

    let store = SqliteStore::open(database)
        .with_context(|| format!("failed to open database {}", database.display()))?;
    store.reset().context("reset failed")?;
    println!("database {} reset", database.display());
    Ok(())
}
