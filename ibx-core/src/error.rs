use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IbxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest store unavailable at {}: {reason}", path.display())]
    StoreUnavailable { path: PathBuf, reason: String },

    #[error("destination {} cannot be created: {source}", path.display())]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no backup found at {}", .0.display())]
    BackupNotFound(PathBuf),

    #[error("status plist error: {0}")]
    Status(#[from] plist::Error),

    #[error("worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Config error: {0}")]
    Config(String),
}

impl IbxError {
    pub(crate) fn store(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        IbxError::StoreUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, IbxError>;
