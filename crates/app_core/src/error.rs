//! Application error types

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Recoverable Errors (notify user, continue) =====
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Media source error: {0}")]
    Source(String),

    #[error("Deletion request failed: {0}")]
    Deletion(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Background task failed: {0}")]
    Task(String),

    // ===== Fatal Errors (application termination) =====
    #[error("Database corruption: {0}")]
    DbCorruption(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Init(String),
}

impl AppError {
    /// Is this error recoverable?
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Io(_)
                | AppError::FileNotFound(_)
                | AppError::AccessDenied(_)
                | AppError::Source(_)
                | AppError::Deletion(_)
                | AppError::Storage(_)
                | AppError::Task(_)
        )
    }

    /// Is this a fatal error?
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::FileNotFound(path) => format!("File not found: {}", path),
            AppError::AccessDenied(path) => {
                format!("Permission denied for {}. Check that the library folder is readable.", path)
            }
            AppError::Source(msg) => format!("Could not load media: {}", msg),
            AppError::Deletion(msg) => format!("Could not delete media: {}", msg),
            _ => self.to_string(),
        }
    }
}

impl From<app_fs::FsError> for AppError {
    fn from(e: app_fs::FsError) -> Self {
        match e {
            app_fs::FsError::NotFound(p) => AppError::FileNotFound(p),
            app_fs::FsError::AccessDenied(p) => AppError::AccessDenied(p),
            app_fs::FsError::Io(err) => AppError::Io(err),
            app_fs::FsError::Trash(msg) => AppError::Deletion(msg),
            app_fs::FsError::UnknownRequest(id) => {
                AppError::Deletion(format!("unknown trash request {}", id))
            }
            other => AppError::Source(other.to_string()),
        }
    }
}

impl From<app_db::DbError> for AppError {
    fn from(e: app_db::DbError) -> Self {
        match e {
            app_db::DbError::Migration(msg) => AppError::DbCorruption(msg),
            _ => AppError::Storage(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Task(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_errors_map_to_recoverable() {
        let err: AppError = app_fs::FsError::AccessDenied("/photos".into()).into();
        assert!(err.is_recoverable());
        assert!(err.user_message().contains("/photos"));

        let err: AppError = app_fs::FsError::UnknownRequest(7).into();
        assert!(matches!(err, AppError::Deletion(_)));
    }

    #[test]
    fn test_migration_failure_is_fatal() {
        let err: AppError = app_db::DbError::Migration("bad version".into()).into();
        assert!(err.is_fatal());

        let err: AppError = app_db::DbError::Pool("timeout".into()).into();
        assert!(err.is_recoverable());
    }
}
