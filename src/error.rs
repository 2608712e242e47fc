//! Error type shared by the storage backends, the store and the CLI.

/// Failure raised by a storage backend or by record encoding.
///
/// Most of the crate reports these through logging only; see
/// [`Store::try_read`](crate::store::Store::try_read) and
/// [`Store::try_write`](crate::store::Store::try_write) for the strict paths.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite rejected a statement.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A collection could not be encoded or decoded as JSON.
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Another thread panicked while holding the backend lock.
    #[error("storage lock poisoned")]
    LockPoisoned,

    /// The backend has no room left for the value written under `key`.
    #[error("storage quota exceeded while writing {key}")]
    QuotaExceeded {
        /// Entry that failed to persist.
        key: String,
    },

    /// Filesystem failure while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
