//! Indexer error types: storage, RPC transport, configuration and event
//! decoding failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    /// A contract event whose topics do not follow `(symbol, creator, index)`.
    #[error("Undecodable event {event_id}: {reason}")]
    UndecodableEvent {
        event_id: String,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, IndexerError>;
