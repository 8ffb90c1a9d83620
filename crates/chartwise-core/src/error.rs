use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The snapshot file exists but is not a valid store snapshot.
    #[error("corrupt snapshot at {}: {source}", path.display())]
    CorruptSnapshot {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The snapshot file exists but could not be read.
    #[error("unreadable snapshot at {}: {source}", path.display())]
    UnreadableSnapshot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
