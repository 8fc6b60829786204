//! # Device Error Type
//!
//! Everything a command can fail with, plus the process exit code for it.
//!
//! ```text
//! DbError ────┐
//! SyncError ──┼──► AppError ──► "error: ..." on stderr, exit code
//! usage ──────┘
//! ```

use frigo_core::CoreError;
use frigo_db::DbError;
use frigo_sync::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A command used where it does not apply.
    #[error("{0}")]
    Usage(String),

    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn usage(message: impl Into<String>) -> Self {
        AppError::Usage(message.into())
    }

    /// Process exit code: 2 for usage, 3 for rejected business operations,
    /// 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Usage(_) => 2,
            AppError::Db(DbError::Domain(_)) | AppError::Db(DbError::NotFound { .. }) => 3,
            AppError::Sync(SyncError::InvalidLinkingCode(_)) => 3,
            _ => 1,
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Db(DbError::Domain(err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
